use core::fmt;
use std::{ops::Deref, str::FromStr};

use color_eyre::{eyre::eyre, Report};
use serde::{Deserialize, Serialize};

/// Minimal number of digits, shorter numbers are most likely typos
const MIN_DIGITS: usize = 7;
/// Maximum length of an E.164 number
const MAX_DIGITS: usize = 15;

/// A mobile phone number
///
/// Accepts an optional leading `+` followed by 7 to 15 digits. Spaces and
/// dashes are allowed as visual separators and removed, so `+49 151-2345678`
/// and `+491512345678` are stored the same way.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub(crate) struct Mobile(String);

impl FromStr for Mobile {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' if !digits.is_empty() => {}
                _ => return Err(eyre!("{s:?} contains {c:?}, which is not a digit")),
            }
        }

        if rest.ends_with([' ', '-']) {
            Err(eyre!("{s:?} ends with a separator"))
        } else if digits.len() < MIN_DIGITS {
            Err(eyre!("{s:?} has less than {MIN_DIGITS} digits"))
        } else if digits.len() > MAX_DIGITS {
            Err(eyre!("{s:?} has more than {MAX_DIGITS} digits"))
        } else {
            Ok(Self(format!("{plus}{digits}")))
        }
    }
}

impl TryFrom<String> for Mobile {
    type Error = Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Deref for Mobile {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Mobile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Mobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
