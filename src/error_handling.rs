//! Mapping of failures onto HTTP responses

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use color_eyre::{eyre::eyre, Report};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

impl From<Report> for ApiError {
    fn from(value: Report) -> Self {
        ApiError::UnknownError(value)
    }
}

/// Unreadable bodies, wrong content types and values refused by the
/// validated types all end up as 422
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(eyre!(rejection.body_text()))
    }
}

/// Path segments that don't parse, e.g. an id that is no uuid
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(eyre!(rejection.body_text()))
    }
}

/// Every error a handler may return
///
/// Everything except [ApiError::UnknownError] is an expected failure the
/// client can do something about.
#[derive(Debug)]
pub(crate) enum ApiError {
    /// No, invalid or expired access token
    Unauthorized,
    /// Identifier unknown or password wrong, deliberately indistinguishable
    InvalidCredentials,
    /// Authenticated, but not allowed to touch this resource. Also used
    /// for invalid reset and verification links.
    Forbidden,
    UserNotFound,
    ExpenseNotFound,
    /// The value of the named field is already taken by another account
    Conflict(&'static str),
    /// Input that passed deserialization but is still not acceptable
    Validation(Report),
    UnknownError(Report),
}

/// The body of every non-2xx response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct Message {
    pub(crate) message: String,
}

impl Message {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid Credentials".to_owned())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_owned()),
            ApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_owned()),
            ApiError::ExpenseNotFound => (StatusCode::NOT_FOUND, "Expense not found".to_owned()),
            ApiError::Conflict(field) => (
                StatusCode::CONFLICT,
                format!("An account with this {field} already exists"),
            ),
            ApiError::Validation(r) => {
                debug!("Rejected input: {r}");
                (StatusCode::UNPROCESSABLE_ENTITY, r.to_string())
            }
            ApiError::UnknownError(r) => {
                error!("Error: {r:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_owned(),
                )
            }
        };

        (status, Json(Message { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body, http::StatusCode, response::IntoResponse};
    use color_eyre::eyre::eyre;

    use super::{ApiError, Message};

    async fn render(error: ApiError) -> (StatusCode, Message) {
        let response = error.into_response();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn conflict_names_the_field() {
        let (status, body) = render(ApiError::Conflict("email")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.message, "An account with this email already exists");
    }

    #[tokio::test]
    async fn unknown_errors_are_not_leaked() {
        let (status, body) = render(eyre!("connection string with password").into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal Server Error");
    }

    #[tokio::test]
    async fn credentials_and_tokens_are_401() {
        let (status, _) = render(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = render(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "Unauthorized");
    }
}
