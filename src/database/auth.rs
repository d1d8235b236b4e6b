//! Checking credentials
//!
//! This is the only file that is supposed to see and
//! interact with the passwords saved in the database.
//! Limiting this to this file allows easier changes
//! to hashing algorithms, security updates and helps
//! hiding passwords from attackers

use color_eyre::Report;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::types::{Identifier, Password};

use super::{User, USER_FIELDS};

/// Expected errors during login
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginError {
    /// No user with this email or mobile
    ///
    /// The route reports this exactly like [LoginError::InvalidCredentials]
    /// so accounts can't be enumerated, the distinction is only logged.
    UserNotFound,
    /// Currently equal to wrong password.
    InvalidCredentials,
}

/// Unhashed Login Credentials
#[derive(Deserialize, Debug, ToSchema)]
pub(crate) struct Credentials {
    /// Email address or mobile number
    #[schema(value_type = String, example = "ada@example.com")]
    pub(crate) identifier: Identifier,
    /// Unhashed password
    #[schema(value_type = String, format = Password)]
    pub(crate) password: Password,
}

/// A user row including the password hash
#[derive(FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

/// Checks credentials and returns user
///
/// The double result is used as always:
/// The outside result contains unexpected errors, the inner the expected ones
/// This function properly differentiates between a user not existing and
/// a credentials being wrong, see [LoginError] for details.
#[tracing::instrument(skip(pool))]
pub(crate) async fn login_user(
    pool: &PgPool,
    credentials: &Credentials,
) -> Result<Result<User, LoginError>, Report> {
    let (column, value) = match &credentials.identifier {
        Identifier::EMail(email) => ("email", &**email),
        Identifier::Mobile(mobile) => ("mobile", &**mobile),
    };

    let saved_user = sqlx::query_as::<_, UserWithPassword>(&format!(
        "SELECT {USER_FIELDS}, password FROM users WHERE {column} = $1"
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;

    let Some(saved_user) = saved_user else {
        // Expected error, so outer Ok
        return Ok(Err(LoginError::UserNotFound));
    };

    // Only an unreadable hash is an outer error, a mismatch is expected
    if credentials.password.match_hash(&saved_user.password)? {
        Ok(Ok(saved_user.user))
    } else {
        Ok(Err(LoginError::InvalidCredentials))
    }
}
