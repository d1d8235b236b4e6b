use std::str::FromStr;

use color_eyre::{eyre::eyre, Report};
use serde::Deserialize;

use super::{EMail, Mobile};

/// What a user logs in with
///
/// Either an email address or a mobile number. Email is tried first since
/// no valid email can also be a valid phone number, an `@` is never a digit.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub(crate) enum Identifier {
    /// Login via the email address
    EMail(EMail),
    /// Login via the mobile number
    Mobile(Mobile),
}

impl FromStr for Identifier {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(email) = s.parse() {
            return Ok(Self::EMail(email));
        }
        if let Ok(mobile) = s.parse() {
            return Ok(Self::Mobile(mobile));
        }
        Err(eyre!("{s:?} is neither an email address nor a mobile number"))
    }
}

impl TryFrom<String> for Identifier {
    type Error = Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
