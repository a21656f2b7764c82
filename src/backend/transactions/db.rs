/**
 * Transaction Database Operations
 *
 * Rows are written once by consolidation; afterwards the only change is
 * the unpaid to paid transition in `mark_paid`.
 */

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgExecutor;

use crate::backend::bills::settlement::Debt;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub consolidation_id: i64,
    pub payer_id: i64,
    pub payee_id: i64,
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_on: Option<DateTime<Utc>>,
}

const TRANSACTION_COLUMNS: &str = "id, consolidation_id, payer_id, payee_id, amount, is_paid, paid_on";

pub async fn insert_transaction(
    db: impl PgExecutor<'_>,
    consolidation_id: i64,
    debt: &Debt,
) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        r#"
        INSERT INTO transactions (consolidation_id, payer_id, payee_id, amount)
        VALUES ($1, $2, $3, $4)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(consolidation_id)
    .bind(debt.payer_id)
    .bind(debt.payee_id)
    .bind(debt.amount)
    .fetch_one(db)
    .await
}

pub async fn get_transaction(db: impl PgExecutor<'_>, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Transactions where `user_id` pays or is paid, newest first
pub async fn transactions_for_user(
    db: impl PgExecutor<'_>,
    user_id: i64,
    is_paid: Option<bool>,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS} FROM transactions
        WHERE (payer_id = $1 OR payee_id = $1)
          AND ($2::BOOLEAN IS NULL OR is_paid = $2)
        ORDER BY id DESC
        "#
    ))
    .bind(user_id)
    .bind(is_paid)
    .fetch_all(db)
    .await
}

/// Flip an unpaid transaction to paid
///
/// Returns `None` when the row is already paid, so two racing settles
/// cannot both succeed.
pub async fn mark_paid(db: impl PgExecutor<'_>, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        r#"
        UPDATE transactions SET is_paid = TRUE, paid_on = NOW()
        WHERE id = $1 AND is_paid = FALSE
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}
