//! All methods to talk to the database reside here.
//!
//! This makes any changes to tables, relations etc. easier.
//! Password hashes are only ever read in [auth], every other query selects
//! [USER_FIELDS] and can't leak them.

pub(crate) mod auth;
pub(crate) mod expenses;

use std::time::Duration;

use color_eyre::{eyre::Context, Report};
use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    FromRow, PgPool,
};
use time::OffsetDateTime;
use tracing::{debug, debug_span, info, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    settings::DbConfig,
    types::{EMail, Mobile, NameOfUser, Password},
};

/// Every column of `users` except the password hash
pub(crate) const USER_FIELDS: &str =
    "id, first_name, last_name, email, mobile, email_verified_at, created_at, updated_at";

/// This directly mirrors the `users` table, expect for the password
/// column, since we don't want to return a password on accident
#[allow(clippy::missing_docs_in_private_items)]
#[derive(Clone, Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub(crate) struct User {
    pub(crate) id: Uuid,
    pub(crate) first_name: String,
    pub(crate) last_name: Option<String>,
    pub(crate) email: String,
    pub(crate) mobile: String,
    /// Unset until the link of the verification mail was opened
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) email_verified_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

/// Everything needed to create a [User]
///
/// The password is optional, a random one is generated and mailed if
/// it's missing.
#[allow(clippy::missing_docs_in_private_items)]
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UserCreation {
    #[schema(value_type = String, example = "Ada")]
    pub(crate) first_name: NameOfUser,
    #[schema(value_type = Option<String>, example = "Lovelace")]
    pub(crate) last_name: Option<NameOfUser>,
    #[schema(value_type = String)]
    pub(crate) email: EMail,
    #[schema(value_type = String, example = "+441234567890")]
    pub(crate) mobile: Mobile,
    #[schema(value_type = Option<String>, format = Password, min_length = 10, max_length = 256)]
    pub(crate) password: Option<Password>,
}

/// This is a subset of [User], containing all the updatable properties
/// as [Options](::std::option), usefull for allowing partial updates.
#[allow(clippy::missing_docs_in_private_items)]
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UserUpdate {
    #[schema(value_type = Option<String>)]
    pub(crate) first_name: Option<NameOfUser>,
    #[schema(value_type = Option<String>)]
    pub(crate) last_name: Option<NameOfUser>,
    /// Changing the email marks it as unverified again
    #[schema(value_type = Option<String>)]
    pub(crate) email: Option<EMail>,
    #[schema(value_type = Option<String>)]
    pub(crate) mobile: Option<Mobile>,
}

impl UserUpdate {
    pub(crate) fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.mobile.is_none()
    }
}

/// A unique column that already holds the value
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum UniqueViolation {
    EMail,
    Mobile,
}

impl UniqueViolation {
    /// Name of the field as seen by clients
    pub(crate) fn field(&self) -> &'static str {
        match self {
            UniqueViolation::EMail => "email",
            UniqueViolation::Mobile => "mobile",
        }
    }
}

/// Maps the unique constraints of `users` to [UniqueViolation]
fn unique_violation(error: &sqlx::Error) -> Option<UniqueViolation> {
    let sqlx::Error::Database(error) = error else {
        return None;
    };
    match error.constraint()? {
        "users_email_key" => Some(UniqueViolation::EMail),
        "users_mobile_key" => Some(UniqueViolation::Mobile),
        _ => None,
    }
}

/// Connects to the database given by `config`, setting the application
/// name to "spendwise"
#[tracing::instrument(skip(config))]
pub(crate) async fn connect(config: &DbConfig) -> color_eyre::Result<PgPool> {
    let options = PgConnectOptions::try_from(config)
        .wrap_err("Failed parsing database URL")?
        .application_name("spendwise");

    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .instrument(debug_span!("Connecting to DB"))
        .await
        .wrap_err("Connecting to database")
}

/// Applies all migrations in `migrations/` that have not run yet
#[tracing::instrument(skip(pool))]
pub(crate) async fn migrate(pool: &PgPool) -> Result<(), Report> {
    sqlx::migrate!()
        .run(pool)
        .await
        .wrap_err("Running migrations")?;
    info!("Database is up to date");

    Ok(())
}

/// Stores a new user with an already hashed password
///
/// Outer result for unexpected errors, inner for an email or mobile that
/// is already registered.
#[tracing::instrument(skip(pool, password_hash))]
pub(crate) async fn create_user(
    pool: &PgPool,
    new_user: &UserCreation,
    password_hash: &str,
) -> Result<Result<User, UniqueViolation>, Report> {
    let result = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO
            users (id, first_name, last_name, email, mobile, password)
        VALUES
            ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_FIELDS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&*new_user.first_name)
    .bind(new_user.last_name.as_deref())
    .bind(&*new_user.email)
    .bind(&*new_user.mobile)
    .bind(password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => {
            info!(user_id = %user.id, "Created user");
            Ok(Ok(user))
        }
        Err(e) => match unique_violation(&e) {
            Some(violation) => Ok(Err(violation)),
            None => Err(e.into()),
        },
    }
}

#[tracing::instrument(skip(pool))]
pub(crate) async fn list_users(pool: &PgPool) -> Result<Vec<User>, Report> {
    Ok(
        sqlx::query_as::<_, User>(&format!("SELECT {USER_FIELDS} FROM users ORDER BY created_at"))
            .fetch_all(pool)
            .await?,
    )
}

#[tracing::instrument(skip(pool))]
pub(crate) async fn get_user(pool: &PgPool, id: &Uuid) -> Result<Option<User>, Report> {
    Ok(
        sqlx::query_as::<_, User>(&format!("SELECT {USER_FIELDS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

#[tracing::instrument(skip(pool))]
pub(crate) async fn get_user_by_email(
    pool: &PgPool,
    email: &EMail,
) -> Result<Option<User>, Report> {
    Ok(
        sqlx::query_as::<_, User>(&format!("SELECT {USER_FIELDS} FROM users WHERE email = $1"))
            .bind(&**email)
            .fetch_optional(pool)
            .await?,
    )
}

/// Applies all set fields of `update`, `None` if the user does not exist
#[tracing::instrument(skip(pool))]
pub(crate) async fn update_user(
    pool: &PgPool,
    id: &Uuid,
    update: &UserUpdate,
) -> Result<Result<Option<User>, UniqueViolation>, Report> {
    let result = sqlx::query_as::<_, User>(&format!(
        "UPDATE
            users
        SET
            first_name = coalesce($2, first_name),
            last_name = coalesce($3, last_name),
            email = coalesce($4, email),
            mobile = coalesce($5, mobile),
            email_verified_at = CASE
                WHEN $4 IS NOT NULL AND $4 <> email THEN NULL
                ELSE email_verified_at
            END,
            updated_at = now()
        WHERE
            id = $1
        RETURNING
            {USER_FIELDS}"
    ))
    .bind(id)
    .bind(update.first_name.as_deref())
    .bind(update.last_name.as_deref())
    .bind(update.email.as_deref())
    .bind(update.mobile.as_deref())
    .fetch_optional(pool)
    .await;

    match result {
        Ok(user) => Ok(Ok(user)),
        Err(e) => match unique_violation(&e) {
            Some(violation) => Ok(Err(violation)),
            None => Err(e.into()),
        },
    }
}

/// Deletes the user together with its expenses and reset requests,
/// returns whether the user existed
#[tracing::instrument(skip(pool))]
pub(crate) async fn delete_user(pool: &PgPool, id: &Uuid) -> Result<bool, Report> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Marks the email of the user as verified, keeping the first
/// verification date if it happens twice
///
/// Only succeeds while `email` is still the address of the user, so a
/// link mailed to a replaced address can't verify the new one. Returns
/// `false` if the user does not exist (anymore) or changed the address.
#[tracing::instrument(skip(pool))]
pub(crate) async fn mark_email_verified(
    pool: &PgPool,
    id: &Uuid,
    email: &str,
) -> Result<bool, Report> {
    let result = sqlx::query(
        "UPDATE users
            SET email_verified_at = coalesce(email_verified_at, now()),
                updated_at = now()
            WHERE id = $1 AND email = $2",
    )
    .bind(id)
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Creates a new reset request for the user, replacing an older one
///
/// Replacing means at most one reset link per user works at any time.
#[tracing::instrument(skip(pool))]
pub(crate) async fn new_reset_request(pool: &PgPool, user_id: &Uuid) -> Result<Uuid, Report> {
    let reset_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO
            password_reset_requests (id, user_id)
        VALUES
            ($1, $2)
        ON CONFLICT(user_id) DO
            UPDATE SET
                id = EXCLUDED.id,
                created_at = EXCLUDED.created_at",
    )
    .bind(reset_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    debug!(%reset_id, "Stored reset request");
    Ok(reset_id)
}

/// The known errors which can occur when calling [reset_password]
#[derive(Debug)]
pub(crate) enum ResetError {
    /// The reset request does not exist (anymore), so no password was reset
    TokenNotFound,
}

/// Resets the password of the user associated with the given reset request.
///
/// This returns a result in a result: The outer result is for any "unknown"
/// errors and a failure here should result in an 500, the inner result is
/// for errors that have a concrete reason and can be fixed by the caller.
///
/// The request is deleted in the same transaction, so every reset link
/// works exactly once.
#[tracing::instrument(skip(pool, new_password))]
pub(crate) async fn reset_password(
    pool: &PgPool,
    request_id: &Uuid,
    user_id: &Uuid,
    new_password: &Password,
) -> Result<Result<(), ResetError>, Report> {
    let hash = new_password.hash()?;

    let mut transaction = pool.begin().await?;

    let deleted = sqlx::query(
        "DELETE FROM password_reset_requests WHERE id = $1 AND user_id = $2",
    )
    .bind(request_id)
    .bind(user_id)
    .execute(&mut *transaction)
    .await?;

    if deleted.rows_affected() == 0 {
        return Ok(Err(ResetError::TokenNotFound));
    }

    sqlx::query(
        "UPDATE users
            SET password = $1,
                updated_at = now()
            WHERE id = $2",
    )
    .bind(hash)
    .bind(user_id)
    .execute(&mut *transaction)
    .await?;

    transaction.commit().await?;

    Ok(Ok(()))
}

#[tracing::instrument(skip(pool))]
pub(crate) async fn reset_token_is_valid(
    pool: &PgPool,
    request_id: &Uuid,
    user_id: &Uuid,
) -> Result<bool, Report> {
    Ok(sqlx::query(
        "SELECT 1 FROM password_reset_requests WHERE id = $1 AND user_id = $2",
    )
    .bind(request_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .is_some())
}
