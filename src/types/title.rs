use std::{ops::Deref, str::FromStr};

use color_eyre::{eyre::eyre, Report};
use serde::Deserialize;

/// Short description of an expense
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct Title(String);

impl FromStr for Title {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(eyre!("Title can't be empty"))
        } else if s.len() > 255 {
            Err(eyre!("Title can't be longer than 255 bytes"))
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl TryFrom<String> for Title {
    type Error = Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Deref for Title {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
