//! Token extraction & Routeguarding

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use color_eyre::eyre::eyre;
use sqlx::PgPool;
use tracing::debug;

use crate::{
    database::{get_user, User},
    error_handling::ApiError,
    settings::Config,
    token::{TokenKind, Tokens},
};

/// Extractor requiring the client to be logged in.
///
/// The access token is taken from the configured cookie, or from an
/// `Authorization: Bearer` header for clients that don't keep cookies.
/// The user is loaded fresh from the database, so a deleted account is
/// logged out immediately even though its tokens are still signed.
#[derive(Clone, Debug)]
pub(crate) struct AuthenticatedUser(
    /// The user the token was issued for
    pub(crate) User,
);

/// Finds the raw token, the cookie wins over the header
fn raw_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = CookieJar::from_headers(headers).get(cookie_name) {
        return Some(cookie.value().to_owned());
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_owned())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Sync + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let config = parts
            .extensions
            .get::<Arc<Config>>()
            .ok_or_else(|| eyre!("Config is missing from extensions"))?;

        let Some(token) = raw_token(&parts.headers, &config.auth.cookie) else {
            debug!("No access token sent");
            return Err(ApiError::Unauthorized);
        };

        let tokens = parts
            .extensions
            .get::<Arc<Tokens>>()
            .ok_or_else(|| eyre!("Tokens are missing from extensions"))?;
        let claims = tokens
            .verify(&token, TokenKind::Access)
            .ok_or(ApiError::Unauthorized)?;

        let pool = parts
            .extensions
            .get::<PgPool>()
            .ok_or_else(|| eyre!("Missing PgPool from Extensions"))?;

        match get_user(pool, &claims.sub).await? {
            Some(user) => Ok(AuthenticatedUser(user)),
            None => {
                debug!(user_id = %claims.sub, "Token of deleted user");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
