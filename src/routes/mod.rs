//! All final request handlers
//!
//! These handlers return the actual responses, semantically grouped
pub(crate) mod expenses;
pub(crate) mod healthcheck;
pub(crate) mod login;
pub(crate) mod register;
pub(crate) mod reset;
pub(crate) mod user;

use axum::http::StatusCode;

use crate::{error_handling::Message, extract::Json};

/// Says hello, handy to see whether the API is reachable at all
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API index", body = Message)
    ),
    tag = "index",
)]
pub(crate) async fn index() -> Json<Message> {
    Json(Message::new("Spendwise API"))
}

/// Answers every request no route matched
pub(crate) async fn fallback() -> (StatusCode, Json<Message>) {
    (StatusCode::NOT_FOUND, Json(Message::new("Not Found")))
}
