use std::{fmt, str::FromStr};

use argon2::{
    password_hash::{self, rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use color_eyre::{eyre::eyre, Report};
use rand::{seq::SliceRandom, Rng};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SPECIAL: &str = "!@#$%^&*()_+~`|}{[]:;?><,./-=";

/// Safely store passwords
///
/// Prevents logging or plain-text comparision, ensures that the minimum
/// length of 10 bytes is followed
///
/// This is safer then always remember to `skip` the private details in
/// for example [macro@tracing::instrument]
#[derive(Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct Password(SecretString);

impl FromStr for Password {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // The password itself must not end up in the error, it is logged
        if s.len() < 10 {
            Err(eyre!("Password is shorter than 10 characters/bytes"))
        } else if s.len() > 256 {
            Err(eyre!("Password is longer than 256 characters/bytes"))
        } else {
            Ok(Self(SecretString::new(s.to_owned())))
        }
    }
}

impl TryFrom<String> for Password {
    type Error = <Password as FromStr>::Err;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl Password {
    /// A fresh random password, see [generate_password]
    pub(crate) fn generate(length: usize) -> Result<Self, Report> {
        Ok(Self(SecretString::new(generate_password(length)?)))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Hashes the password with Argon2 and a random salt, returning the
    /// PHC string to be stored in the database
    pub(crate) fn hash(&self) -> Result<String, Report> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(self.expose().as_bytes(), &salt)?;

        Ok(hash.to_string())
    }

    /// `Ok(false)` if the password does not match, an error only if
    /// `hash` is not a valid PHC string
    pub(crate) fn match_hash(&self, hash: &str) -> Result<bool, Report> {
        let hash = PasswordHash::new(hash)?;

        Argon2::default()
            .verify_password(self.expose().as_bytes(), &hash)
            .map(|_| true)
            .or_else(|e| match e {
                password_hash::Error::Password => Ok(false),
                e => Err(e.into()),
            })
    }
}

/// Picks one character of `set` uniformly
fn pick(rng: &mut impl Rng, set: &str) -> char {
    let bytes = set.as_bytes();
    char::from(bytes[rng.gen_range(0..bytes.len())])
}

/// Generates a random password of `length` characters
///
/// The result contains at least one lowercase letter, one uppercase letter,
/// one digit and one special character, so lengths below 4 are refused.
pub(crate) fn generate_password(length: usize) -> Result<String, Report> {
    if length < 4 {
        return Err(eyre!(
            "A password of length {length} can't contain all 4 character classes"
        ));
    }

    let mut rng = rand::rngs::OsRng;
    let all = [LOWERCASE, UPPERCASE, DIGITS, SPECIAL].concat();

    let mut password = Vec::with_capacity(length);
    for set in [LOWERCASE, UPPERCASE, DIGITS, SPECIAL] {
        password.push(pick(&mut rng, set));
    }
    for _ in 4..length {
        password.push(pick(&mut rng, &all));
    }
    password.shuffle(&mut rng);

    Ok(password.into_iter().collect())
}
