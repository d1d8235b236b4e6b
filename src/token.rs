//! Signed tokens
//!
//! All tokens are HS256 JWTs signed with the configured secret. The `kind`
//! claim keeps them apart: a reset link can't be used as an access token
//! and vice versa.

use std::time::Duration;

use color_eyre::Report;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::settings::AuthConfig;

/// What a token may be used for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    /// Authenticates requests to private routes
    Access,
    /// Authorizes exactly one password reset
    Reset,
    /// Confirms ownership of the email address
    Verify,
}

#[allow(clippy::missing_docs_in_private_items)]
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    /// The user the token was issued for
    pub(crate) sub: Uuid,
    pub(crate) kind: TokenKind,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
    /// Only set on reset tokens: the id of the matching reset request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) jti: Option<Uuid>,
    /// Only set on verification tokens: the address the link was sent to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
}

/// Keys and lifetimes, built once from [AuthConfig]
pub(crate) struct Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    reset_ttl: Duration,
    verify_ttl: Duration,
}

impl Tokens {
    pub(crate) fn new(config: &AuthConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let minutes = |m: u64| Duration::from_secs(m * 60);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: minutes(config.access_ttl_minutes),
            reset_ttl: minutes(config.reset_ttl_minutes),
            verify_ttl: minutes(config.verify_ttl_minutes),
        }
    }

    /// How long an access token stays valid, also used as cookie max age
    pub(crate) fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    fn issue(
        &self,
        sub: Uuid,
        kind: TokenKind,
        ttl: Duration,
        jti: Option<Uuid>,
        email: Option<String>,
    ) -> Result<String, Report> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub,
            kind,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            jti,
            email,
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, Report> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    pub(crate) fn issue_access(&self, user_id: Uuid) -> Result<String, Report> {
        self.issue(user_id, TokenKind::Access, self.access_ttl, None, None)
    }

    pub(crate) fn issue_reset(&self, user_id: Uuid, request_id: Uuid) -> Result<String, Report> {
        self.issue(
            user_id,
            TokenKind::Reset,
            self.reset_ttl,
            Some(request_id),
            None,
        )
    }

    /// Verifies `email` only, a link for an address the user has since
    /// replaced is useless
    pub(crate) fn issue_verification(&self, user_id: Uuid, email: &str) -> Result<String, Report> {
        self.issue(
            user_id,
            TokenKind::Verify,
            self.verify_ttl,
            None,
            Some(email.to_owned()),
        )
    }

    /// Checks signature, expiry and kind
    ///
    /// A rejected token is an expected outcome, so this returns `None`
    /// instead of an error and only logs why.
    pub(crate) fn verify(&self, token: &str, kind: TokenKind) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(?kind, "Rejected token: {e}");
                return None;
            }
        };

        if claims.kind == kind {
            Some(claims)
        } else {
            debug!(expected = ?kind, got = ?claims.kind, "Rejected token of wrong kind");
            None
        }
    }
}
