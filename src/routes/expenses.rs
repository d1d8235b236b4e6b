//! Expenses of the logged in user
//!
//! Expenses of other users are reported as not found, their existence is
//! never revealed.

use axum::{http::StatusCode, Extension};
use color_eyre::eyre::eyre;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    database::expenses::{self as db, Expense, ExpenseCreation, ExpenseUpdate},
    error_handling::{ApiError, Message},
    extract::{Json, Path},
    middlewares::auth::AuthenticatedUser,
};

/// All expenses of the logged in user, newest first
#[utoipa::path(
    get,
    path = "/expenses",
    responses(
        (status = 200, description = "Own expenses", body = [Expense]),
        (status = 401, description = "Not logged in", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "expenses",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn list_expenses(
    Extension(pool): Extension<PgPool>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Expense>>, ApiError> {
    Ok(Json(db::list_expenses(&pool, &user.id).await?))
}

/// Records a new expense for the logged in user
#[utoipa::path(
    post,
    path = "/expenses",
    request_body = ExpenseCreation,
    responses(
        (status = 201, description = "Expense created", body = Expense),
        (status = 401, description = "Not logged in", body = Message),
        (status = 422, description = "Invalid input"),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "expenses",
)]
#[tracing::instrument(skip(pool, user))]
pub(crate) async fn create_expense(
    Extension(pool): Extension<PgPool>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(expense): Json<ExpenseCreation>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = db::create_expense(&pool, &user.id, &expense).await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A single own expense
#[utoipa::path(
    get,
    path = "/expenses/{id}",
    params(("id" = Uuid, Path, description = "Id of the expense")),
    responses(
        (status = 200, description = "The expense", body = Expense),
        (status = 401, description = "Not logged in", body = Message),
        (status = 404, description = "No such expense", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "expenses",
)]
#[tracing::instrument(skip(pool, user))]
pub(crate) async fn get_one_expense(
    Extension(pool): Extension<PgPool>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ApiError> {
    let expense = db::get_expense(&pool, &user.id, &id)
        .await?
        .ok_or(ApiError::ExpenseNotFound)?;

    Ok(Json(expense))
}

/// Partially updates an own expense
#[utoipa::path(
    patch,
    path = "/expenses/{id}",
    params(("id" = Uuid, Path, description = "Id of the expense")),
    request_body = ExpenseUpdate,
    responses(
        (status = 200, description = "The updated expense", body = Expense),
        (status = 401, description = "Not logged in", body = Message),
        (status = 404, description = "No such expense", body = Message),
        (status = 422, description = "Invalid input", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "expenses",
)]
#[tracing::instrument(skip(pool, user))]
pub(crate) async fn patch_expense(
    Extension(pool): Extension<PgPool>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::Validation(eyre!("Nothing to update")));
    }

    let expense = db::update_expense(&pool, &user.id, &id, &update)
        .await?
        .ok_or(ApiError::ExpenseNotFound)?;

    Ok(Json(expense))
}

/// Deletes an own expense
#[utoipa::path(
    delete,
    path = "/expenses/{id}",
    params(("id" = Uuid, Path, description = "Id of the expense")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 401, description = "Not logged in", body = Message),
        (status = 404, description = "No such expense", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "expenses",
)]
#[tracing::instrument(skip(pool, user))]
pub(crate) async fn remove_expense(
    Extension(pool): Extension<PgPool>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !db::delete_expense(&pool, &user.id, &id).await? {
        return Err(ApiError::ExpenseNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
