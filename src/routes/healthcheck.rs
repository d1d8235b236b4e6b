use axum::Extension;
use sqlx::PgPool;

/// 200 with an empty body as long as the server is up
#[utoipa::path(
    get,
    path = "/health_check",
    responses(
        (status = 200, description = "Server is up")
    ),
    tag = "index",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn health_check(Extension(_pool): Extension<PgPool>) {}
