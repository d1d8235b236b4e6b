use std::{ops::Deref, str::FromStr};

use color_eyre::{eyre::eyre, Report};
use serde::Deserialize;

/// Digits allowed before the decimal point, `numeric(12, 2)` leaves 10
const MAX_INTEGER_DIGITS: usize = 10;
/// Digits allowed after the decimal point
const MAX_FRACTION_DIGITS: usize = 2;

/// A positive amount of money with at most two decimal places
///
/// Kept as its decimal text so no precision is lost on the way to the
/// `numeric` column, PostgreSQL does the actual conversion.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "AmountInput")]
pub(crate) struct Amount(String);

/// Clients may send the amount either as a JSON string or a JSON number
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountInput {
    /// `"12.50"`
    Text(String),
    /// `12.5`
    Number(serde_json::Number),
}

impl FromStr for Amount {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (integer, fraction) = s.split_once('.').unwrap_or((s, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

        if integer.is_empty() || !all_digits(integer) || !all_digits(fraction) {
            Err(eyre!("{s:?} is not a decimal number"))
        } else if s.ends_with('.') {
            Err(eyre!("{s:?} has no digits after the decimal point"))
        } else if integer.trim_start_matches('0').len() > MAX_INTEGER_DIGITS {
            Err(eyre!("{s:?} is too large"))
        } else if fraction.len() > MAX_FRACTION_DIGITS {
            Err(eyre!("{s:?} has more than {MAX_FRACTION_DIGITS} decimal places"))
        } else if s.bytes().all(|b| b == b'0' || b == b'.') {
            Err(eyre!("The amount has to be larger than zero"))
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl TryFrom<AmountInput> for Amount {
    type Error = Report;

    fn try_from(value: AmountInput) -> Result<Self, Self::Error> {
        match value {
            AmountInput::Text(text) => text.parse(),
            AmountInput::Number(number) => number.to_string().parse(),
        }
    }
}

impl Deref for Amount {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
