use std::sync::Arc;

use axum::{http::StatusCode, Extension};
use color_eyre::eyre::eyre;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    database::{self, update_user, User, UserUpdate},
    error_handling::{ApiError, Message},
    extract::{Json, Path},
    mailer::Mailer,
    middlewares::auth::AuthenticatedUser,
    routes::register::send_verification_mail,
    settings::Config,
    token::Tokens,
};

/// All registered users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Not logged in", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn list_users(
    Extension(pool): Extension<PgPool>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(database::list_users(&pool).await?))
}

/// The logged in user
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The logged in user", body = User),
        (status = 401, description = "Not logged in", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

/// A single user by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "Id of the user")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 401, description = "Not logged in", body = Message),
        (status = 404, description = "No such user", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users",
)]
#[tracing::instrument(skip(pool, _user))]
pub(crate) async fn get_one_user(
    Extension(pool): Extension<PgPool>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = database::get_user(&pool, &id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user))
}

/// Only the own account may be changed: 404 for unknown ids, 403 for
/// accounts of other users
async fn ensure_own_account(pool: &PgPool, current: &User, id: &Uuid) -> Result<(), ApiError> {
    if current.id == *id {
        return Ok(());
    }

    match database::get_user(pool, id).await? {
        Some(_) => Err(ApiError::Forbidden),
        None => Err(ApiError::UserNotFound),
    }
}

/// Partially updates the own account
///
/// A new email address starts out unverified and gets a fresh
/// verification link, links sent to the old address stop working.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "Id of the user")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "The updated user", body = User),
        (status = 401, description = "Not logged in", body = Message),
        (status = 403, description = "Not the own account", body = Message),
        (status = 404, description = "No such user", body = Message),
        (status = 409, description = "Email or mobile already registered", body = Message),
        (status = 422, description = "Invalid input", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users",
)]
#[tracing::instrument(skip(pool, config, tokens, mailer, current))]
pub(crate) async fn patch_user(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(tokens): Extension<Arc<Tokens>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(user_patch): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    ensure_own_account(&pool, &current, &id).await?;

    if user_patch.is_empty() {
        return Err(ApiError::Validation(eyre!("Nothing to update")));
    }

    let user = match update_user(&pool, &id, &user_patch).await? {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::UserNotFound),
        Err(violation) => return Err(ApiError::Conflict(violation.field())),
    };

    if user.email != current.email {
        info!(user_id = %user.id, "Email changed");
        send_verification_mail(&config, &tokens, mailer.as_ref(), &user).await?;
    }

    Ok(Json(user))
}

/// Deletes the own account including all expenses
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "Id of the user")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Not logged in", body = Message),
        (status = 403, description = "Not the own account", body = Message),
        (status = 404, description = "No such user", body = Message),
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users",
)]
#[tracing::instrument(skip(pool, current))]
pub(crate) async fn remove_user(
    Extension(pool): Extension<PgPool>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_own_account(&pool, &current, &id).await?;

    if !database::delete_user(&pool, &id).await? {
        return Err(ApiError::UserNotFound);
    }
    info!(user_id = %id, "Deleted user");

    Ok(StatusCode::NO_CONTENT)
}
