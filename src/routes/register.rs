//! Signing up and verifying the email address

use std::sync::Arc;

use axum::Extension;
use color_eyre::Report;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::{
    database::{self, create_user, User, UserCreation},
    error_handling::{ApiError, Message},
    extract::{Json, Path},
    mailer::{self, Mail, Mailer},
    settings::Config,
    token::{TokenKind, Tokens},
    types::Password,
};

/// Length of passwords generated for users signing up without one
const GENERATED_PASSWORD_LENGTH: usize = 16;

/// Creates a new account
///
/// Without a password in the request a random one is generated and sent
/// along with the welcome mail. A verification link is mailed as well.
/// Failing to send either mail does not fail the sign up, the user can
/// still log in (or request a reset) afterwards.
#[utoipa::path(
    post,
    path = "/users/sign_up",
    request_body = UserCreation,
    responses(
        (status = 200, description = "Account created", body = User),
        (status = 409, description = "Email or mobile already registered", body = Message),
        (status = 422, description = "Invalid input"),
    ),
    tag = "users",
)]
#[tracing::instrument(skip(pool, config, tokens, mailer))]
pub(crate) async fn sign_up(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Json(mut new_user): Json<UserCreation>,
) -> Result<Json<User>, ApiError> {
    let (password, generated) = match new_user.password.take() {
        Some(password) => (password, false),
        None => (Password::generate(GENERATED_PASSWORD_LENGTH)?, true),
    };

    let user = match create_user(&pool, &new_user, &password.hash()?).await? {
        Ok(user) => user,
        Err(violation) => return Err(ApiError::Conflict(violation.field())),
    };

    let welcome = Mail::welcome(&user.email, &user.first_name, generated.then_some(&password));
    if let Err(e) = mailer.send(welcome).await {
        warn!(user_id = %user.id, "Could not send welcome mail: {e:?}");
    }

    send_verification_mail(&config, &tokens, mailer.as_ref(), &user).await?;

    Ok(Json(user))
}

/// Mails a verification link for the current address of `user`
///
/// A failing mail is only logged, the user can still log in and the
/// address stays unverified.
pub(crate) async fn send_verification_mail(
    config: &Config,
    tokens: &Tokens,
    mailer: &dyn Mailer,
    user: &User,
) -> Result<(), Report> {
    let token = tokens.issue_verification(user.id, &user.email)?;
    let link = mailer::link(&config.app.public_url, "users/verify_email", &token);
    if let Err(e) = mailer.send(Mail::verification(&user.email, &link)).await {
        warn!(user_id = %user.id, "Could not send verification mail: {e:?}");
    }

    Ok(())
}

/// Marks the email address as verified
///
/// The slug is the token from the verification mail. Invalid, expired
/// or foreign tokens are answered with 403, as are links sent to an
/// address the user has replaced since.
#[utoipa::path(
    get,
    path = "/users/verify_email/{slug}",
    params(
        ("slug" = String, Path, description = "Token from the verification mail")
    ),
    responses(
        (status = 200, description = "Email verified", body = Message),
        (status = 403, description = "Invalid or expired link", body = Message),
    ),
    tag = "users",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn verify_email(
    Extension(pool): Extension<PgPool>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Path(slug): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let claims = tokens
        .verify(&slug, TokenKind::Verify)
        .ok_or(ApiError::Forbidden)?;

    let Some(email) = claims.email else {
        debug!(user_id = %claims.sub, "Verification token without email");
        return Err(ApiError::Forbidden);
    };

    if !database::mark_email_verified(&pool, &claims.sub, &email).await? {
        debug!(user_id = %claims.sub, "Verification link of deleted user or replaced email");
        return Err(ApiError::Forbidden);
    }

    Ok(Json(Message::new("Email verified")))
}
