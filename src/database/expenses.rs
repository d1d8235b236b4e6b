//! Expenses, always scoped to the user owning them
//!
//! Every query filters on `user_id` too, so an expense of another user
//! behaves exactly like one that doesn't exist.

use color_eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::types::{Amount, Title};

/// Columns of `expenses`, with the amount rendered as decimal text
const EXPENSE_FIELDS: &str = "id, user_id, title, amount::text AS amount, created_at, updated_at";

#[allow(clippy::missing_docs_in_private_items)]
#[derive(Clone, Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub(crate) struct Expense {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) title: String,
    /// Decimal with two places, e.g. `"12.50"`
    #[schema(example = "12.50")]
    pub(crate) amount: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

#[allow(clippy::missing_docs_in_private_items)]
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ExpenseCreation {
    #[schema(value_type = String, example = "Groceries")]
    pub(crate) title: Title,
    /// Positive, at most two decimal places. String or number.
    #[schema(value_type = String, example = "12.50")]
    pub(crate) amount: Amount,
}

#[allow(clippy::missing_docs_in_private_items)]
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ExpenseUpdate {
    #[schema(value_type = Option<String>)]
    pub(crate) title: Option<Title>,
    #[schema(value_type = Option<String>)]
    pub(crate) amount: Option<Amount>,
}

impl ExpenseUpdate {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none()
    }
}

/// All expenses of the user, newest first
#[tracing::instrument(skip(pool))]
pub(crate) async fn list_expenses(pool: &PgPool, user_id: &Uuid) -> Result<Vec<Expense>, Report> {
    Ok(sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_FIELDS} FROM expenses WHERE user_id = $1 ORDER BY created_at DESC, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

#[tracing::instrument(skip(pool))]
pub(crate) async fn create_expense(
    pool: &PgPool,
    user_id: &Uuid,
    expense: &ExpenseCreation,
) -> Result<Expense, Report> {
    Ok(sqlx::query_as::<_, Expense>(&format!(
        "INSERT INTO
            expenses (id, user_id, title, amount)
        VALUES
            ($1, $2, $3, $4::numeric)
        RETURNING {EXPENSE_FIELDS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&*expense.title)
    .bind(&*expense.amount)
    .fetch_one(pool)
    .await?)
}

#[tracing::instrument(skip(pool))]
pub(crate) async fn get_expense(
    pool: &PgPool,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<Option<Expense>, Report> {
    Ok(sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_FIELDS} FROM expenses WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

/// Applies all set fields, `None` if the user has no such expense
#[tracing::instrument(skip(pool))]
pub(crate) async fn update_expense(
    pool: &PgPool,
    user_id: &Uuid,
    id: &Uuid,
    update: &ExpenseUpdate,
) -> Result<Option<Expense>, Report> {
    Ok(sqlx::query_as::<_, Expense>(&format!(
        "UPDATE
            expenses
        SET
            title = coalesce($3, title),
            amount = coalesce($4::numeric, amount),
            updated_at = now()
        WHERE
            id = $1 AND user_id = $2
        RETURNING
            {EXPENSE_FIELDS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(update.title.as_deref())
    .bind(update.amount.as_deref())
    .fetch_optional(pool)
    .await?)
}

/// Returns whether the expense existed and belonged to the user
#[tracing::instrument(skip(pool))]
pub(crate) async fn delete_expense(pool: &PgPool, user_id: &Uuid, id: &Uuid) -> Result<bool, Report> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
