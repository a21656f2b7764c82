/**
 * Transaction Handlers
 */

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use super::db::{self, Transaction};
use super::service;
use crate::backend::error::BackendResult;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub is_paid: Option<bool>,
}

/// GET /v1/transactions?isPaid=bool
pub async fn get_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TransactionQuery>,
) -> BackendResult<Json<Vec<Transaction>>> {
    let transactions = db::transactions_for_user(state.db()?, user.user_id, query.is_paid).await?;
    Ok(Json(transactions))
}

/// PATCH /v1/transactions/{txId}/settle
pub async fn settle_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(tx_id): Path<i64>,
) -> BackendResult<Json<Transaction>> {
    let pool = state.db()?;
    let settled = service::settle(pool, tx_id, user.user_id).await?;
    service::notify_payee(pool, &state.publisher, &settled).await;
    Ok(Json(settled))
}
