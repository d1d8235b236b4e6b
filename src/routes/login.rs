//! All login/logout etc. routes
//!
//! These routes are used to do everything related directly to logging in
//! or logging out

use std::sync::Arc;

use axum::Extension;
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    database::{
        auth::{login_user, Credentials, LoginError},
        User,
    },
    error_handling::{ApiError, Message},
    extract::Json,
    settings::Config,
    token::Tokens,
};

/// Returned on a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LoginResponse {
    /// The access token, also set as cookie
    pub(crate) access: String,
    /// The user that logged in
    pub(crate) user: User,
}

/// The access cookie, `Secure` whenever the API is served over https
fn access_cookie(config: &Config, value: String, max_age_secs: u64) -> Cookie<'static> {
    Cookie::build((config.auth.cookie.clone(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.app.public_url.scheme() == "https")
        .path("/")
        .max_age(time::Duration::seconds(
            i64::try_from(max_age_secs).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Tries to log the user in
///
/// Checks whether the credentials are valid (otherwise returns 401, no
/// matter whether the user is unknown or the password is wrong) and if so
/// returns an access token, which is also set as cookie.
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Credentials verified", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = Message),
        (status = 422, description = "Malformed identifier or password"),
    ),
    tag = "users",
)]
#[tracing::instrument(skip(pool, config, tokens, cookies))]
pub(crate) async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(tokens): Extension<Arc<Tokens>>,
    cookies: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user = match login_user(&pool, &credentials).await? {
        Ok(user) => user,
        Err(e) => {
            debug!(reason = ?e, "Login failed");
            return Err(match e {
                LoginError::UserNotFound | LoginError::InvalidCredentials => {
                    ApiError::InvalidCredentials
                }
            });
        }
    };

    let access = tokens.issue_access(user.id)?;
    let cookie = access_cookie(&config, access.clone(), tokens.access_ttl().as_secs());
    info!(user_id = %user.id, "Logged in");

    Ok((cookies.add(cookie), Json(LoginResponse { access, user })))
}

/// Logs the current client out
///
/// Tokens are stateless, so this only removes the cookie. Clients using
/// the bearer header simply drop their token.
#[utoipa::path(
    post,
    path = "/users/logout",
    responses(
        (status = 200, description = "Cookie removed", body = Message)
    ),
    tag = "users",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn logout(
    Extension(config): Extension<Arc<Config>>,
    cookies: CookieJar,
) -> (CookieJar, Json<Message>) {
    let cookie = Cookie::build((config.auth.cookie.clone(), "")).path("/").build();

    (cookies.remove(cookie), Json(Message::new("You logged out.")))
}
