use core::fmt;
use std::{ops::Deref, str::FromStr};

use color_eyre::{eyre::eyre, Report};
use serde::{Deserialize, Serialize};

/// Safely store & validate emails
///
/// Only allows valid emails in the sense of the webspec for the input[type=email]
/// field, this allows any common email while forbidding things like comments etc.
/// Emails are canonicalized to lowercase so lookups don't depend on the casing
/// the user typed.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub(crate) struct EMail(String);

impl FromStr for EMail {
    type Err = Report;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if validator::validate_email(s) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(eyre!(
                "{s:?} is not a valid email address according to the HTML 5 Spec",
            ))
        }
    }
}

impl TryFrom<String> for EMail {
    type Error = Report;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl AsRef<str> for EMail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for EMail {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for EMail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for EMail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
