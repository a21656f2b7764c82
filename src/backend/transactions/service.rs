//! Settlement of a single transaction by its payer.

use sqlx::PgPool;

use super::db::{self, Transaction};
use crate::backend::auth::users::get_user_by_id;
use crate::backend::broker::Publisher;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::notifications::service::dispatch;

pub const SETTLED_TITLE: &str = "Transaction Settled";

/// Body of the notification sent to the payee
pub fn settled_message(payer_username: &str, transaction: &Transaction) -> String {
    format!("{} paid you ${:.2}!", payer_username, transaction.amount)
}

/// Mark `tx_id` paid on behalf of `caller_id`
///
/// Checks run in order: unknown id, caller is not the payer, already paid.
pub async fn settle(pool: &PgPool, tx_id: i64, caller_id: i64) -> BackendResult<Transaction> {
    let transaction = db::get_transaction(pool, tx_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Transaction not found"))?;
    if transaction.payer_id != caller_id {
        return Err(BackendError::forbidden("Only the payer can settle this transaction"));
    }
    if transaction.is_paid {
        return Err(BackendError::conflict("Transaction already settled"));
    }

    let settled = db::mark_paid(pool, tx_id)
        .await?
        .ok_or_else(|| BackendError::conflict("Transaction already settled"))?;
    tracing::info!("[Transactions] Transaction {} settled by user {}", tx_id, caller_id);
    Ok(settled)
}

/// Tell the payee about a settled transaction; failures are only logged
pub async fn notify_payee(pool: &PgPool, publisher: &Publisher, transaction: &Transaction) {
    let payer = match get_user_by_id(pool, transaction.payer_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("[Transactions] Payer {} vanished before notification", transaction.payer_id);
            return;
        }
        Err(e) => {
            tracing::warn!("[Transactions] Could not load payer {}: {}", transaction.payer_id, e);
            return;
        }
    };

    let content = settled_message(&payer.username, transaction);
    if let Err(e) = dispatch(pool, publisher, transaction.payee_id, SETTLED_TITLE, &content).await {
        tracing::warn!(
            "[Transactions] Settlement notification for transaction {} failed: {}",
            transaction.id,
            e
        );
    }
}
