use std::{ops::Deref, str::FromStr};

use color_eyre::{eyre::eyre, Report};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct NameOfUser(String);

impl FromStr for NameOfUser {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(eyre!("Name can't be empty"))
        } else if s.len() > 265 {
            Err(eyre!("{s:?} can't be longer than 265 bytes/characters"))
        } else if s.chars().any(|c| c.is_control()) {
            Err(eyre!(
                "{s:?} can't contain control chars/unicode scalar values"
            ))
        } else {
            Ok(Self(s.into()))
        }
    }
}

impl TryFrom<String> for NameOfUser {
    type Error = Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Deref for NameOfUser {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for NameOfUser {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
