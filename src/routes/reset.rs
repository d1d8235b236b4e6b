//! Forgotten passwords
//!
//! A reset link carries a signed token naming a reset request. The request
//! is deleted when the password is changed, so each link works once and
//! a newer link invalidates older ones.

use std::sync::Arc;

use axum::Extension;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    database::{self, get_user_by_email, new_reset_request, ResetError},
    error_handling::{ApiError, Message},
    extract::{Json, Path},
    mailer::{self, Mail, Mailer},
    settings::Config,
    token::{TokenKind, Tokens},
    types::{EMail, Password},
};

/// JSON for requesting a password reset
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ResetRequest {
    /// The email of the account which requested a password reset
    #[schema(value_type = String, example = "ada@example.com")]
    email: EMail,
}

/// Request a link for a password reset
///
/// This checks whether an account exists (otherwise return 404) and
/// if so creates a new request to reset the password of the account and
/// mails the link to it.
#[utoipa::path(
    post,
    path = "/users/forgot_password",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Reset link sent", body = Message),
        (status = 404, description = "No account with this email", body = Message),
        (status = 422, description = "Invalid email"),
    ),
    tag = "users",
)]
#[tracing::instrument(skip(pool, config, tokens, mailer))]
pub(crate) async fn forgot_password(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Json(ResetRequest { email }): Json<ResetRequest>,
) -> Result<Json<Message>, ApiError> {
    let user = get_user_by_email(&pool, &email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let request_id = new_reset_request(&pool, &user.id).await?;
    let token = tokens.issue_reset(user.id, request_id)?;
    let link = mailer::link(&config.app.public_url, "users/reset_password", &token);

    mailer.send(Mail::password_reset(&user.email, &link)).await?;

    Ok(Json(Message::new("Reset link sent to valid email")))
}

/// The reset request and user a reset token stands for
fn reset_claims(tokens: &Tokens, slug: &str) -> Option<(Uuid, Uuid)> {
    let claims = tokens.verify(slug, TokenKind::Reset)?;
    let Some(request_id) = claims.jti else {
        debug!("Reset token without request id");
        return None;
    };

    Some((request_id, claims.sub))
}

/// Whether a reset link can still be used
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TokenValidity {
    pub(crate) valid: bool,
}

/// Check whether a reset token is valid
///
/// Usefull for UX purposes, so a form is only shown for working links
#[utoipa::path(
    get,
    path = "/users/reset_password/{slug}",
    params(
        ("slug" = String, Path, description = "Token from the reset mail")
    ),
    responses(
        (status = 200, description = "Validity of the token", body = TokenValidity)
    ),
    tag = "users",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn test_reset_token(
    Extension(pool): Extension<PgPool>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Path(slug): Path<String>,
) -> Result<Json<TokenValidity>, ApiError> {
    let valid = match reset_claims(&tokens, &slug) {
        Some((request_id, user_id)) => {
            database::reset_token_is_valid(&pool, &request_id, &user_id).await?
        }
        None => false,
    };

    Ok(Json(TokenValidity { valid }))
}

/// JSON for resetting a password
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PasswordReset {
    /// The new, unhashed password
    #[schema(value_type = String, format = Password, min_length = 10, max_length = 256)]
    password: Password,
}

/// Execute the password reset
///
/// Invalid, expired and already used tokens all get a 403. Otherwise the
/// request is deleted (invalidating the token) and the new password set,
/// atomically, so on error it is guarenteed the reset did not happen.
#[utoipa::path(
    post,
    path = "/users/reset_password/{slug}",
    params(
        ("slug" = String, Path, description = "Token from the reset mail")
    ),
    request_body = PasswordReset,
    responses(
        (status = 200, description = "Password changed", body = Message),
        (status = 403, description = "Invalid, expired or used token", body = Message),
        (status = 422, description = "Password not acceptable"),
    ),
    tag = "users",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn reset_password(
    Extension(pool): Extension<PgPool>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Path(slug): Path<String>,
    Json(PasswordReset { password }): Json<PasswordReset>,
) -> Result<Json<Message>, ApiError> {
    let (request_id, user_id) = reset_claims(&tokens, &slug).ok_or(ApiError::Forbidden)?;

    match database::reset_password(&pool, &request_id, &user_id, &password).await? {
        Err(ResetError::TokenNotFound) => Err(ApiError::Forbidden),
        Ok(()) => Ok(Json(Message::new("Password reset success"))),
    }
}
