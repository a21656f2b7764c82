//! Bill use cases: recording a bill and consolidating a room.
//!
//! Both lock the room row first so a concurrent close, leave or second
//! consolidation serializes behind them.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::db::{self, Bill, Consolidation, NewBill};
use super::settlement::{self, BillSplit, SettlementError};
use crate::backend::auth::users::existing_user_ids;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::rooms::db::{attendee_ids, lock_room, Room};
use crate::backend::transactions::db::{insert_transaction, Transaction};

/// Input of `create_bill`
#[derive(Debug, Clone)]
pub struct BillRequest {
    pub room_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub payers: Vec<i64>,
    pub include_owner: bool,
}

/// Result of a consolidation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationResult {
    pub consolidation: Consolidation,
    pub bill_ids: Vec<i64>,
    pub transactions: Vec<Transaction>,
}

impl From<SettlementError> for BackendError {
    fn from(error: SettlementError) -> Self {
        BackendError::invalid_input(error.to_string())
    }
}

async fn locked_room(conn: &mut PgConnection, room_id: Uuid) -> BackendResult<Room> {
    lock_room(conn, room_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Room not found"))
}

/// Record a bill owned by `owner_id`
///
/// The owner and every payer must attend the room. The room must be open
/// and must not have been consolidated yet.
pub async fn create_bill(pool: &PgPool, owner_id: i64, request: BillRequest) -> BackendResult<Bill> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(BackendError::invalid_input("name is required"));
    }
    settlement::validate_amount(request.amount)?;

    let payers: Vec<i64> = request
        .payers
        .iter()
        .copied()
        .filter(|&id| id != owner_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if payers.is_empty() {
        return Err(SettlementError::NoPayers.into());
    }
    BillSplit::new(owner_id, request.amount, payers.clone(), request.include_owner).share()?;

    let mut tx = pool.begin().await?;
    let room = locked_room(&mut tx, request.room_id).await?;

    let attendees = attendee_ids(&mut *tx, room.id).await?;
    if !attendees.contains(&owner_id) {
        return Err(BackendError::forbidden("Only room attendees can add bills"));
    }
    if room.is_closed {
        return Err(BackendError::conflict("Room is closed"));
    }
    if db::has_consolidated_bill(&mut *tx, room.id).await? {
        return Err(BackendError::conflict("Bills for this room are already consolidated"));
    }

    let found = existing_user_ids(&mut *tx, &payers).await?;
    if found.len() != payers.len() {
        return Err(BackendError::not_found("One or more payers not found"));
    }
    if let Some(outsider) = payers.iter().find(|id| !attendees.contains(id)) {
        return Err(BackendError::invalid_input(format!("Payer {} is not in this room", outsider)));
    }

    let new_bill = NewBill {
        room_id: room.id,
        owner_id,
        name: name.to_string(),
        amount: request.amount,
        include_owner: request.include_owner,
    };
    let bill_id = db::insert_bill(&mut *tx, &new_bill).await?;
    db::insert_payers(&mut *tx, bill_id, &payers).await?;
    let bill = db::get_bill(&mut *tx, bill_id)
        .await?
        .ok_or_else(|| BackendError::internal("Bill vanished after insert"))?;

    tx.commit().await?;
    tracing::info!("[Bills] Bill {} created in room {} by user {}", bill.id, bill.room_id, owner_id);
    Ok(bill)
}

/// Consolidate every unconsolidated bill of a room into transactions
///
/// Host only. Stamping the bills, netting the debts and inserting the
/// transactions happen in one transaction, so either all of it is visible
/// or none of it is.
pub async fn consolidate_room(pool: &PgPool, room_id: Uuid, user_id: i64) -> BackendResult<ConsolidationResult> {
    let mut tx = pool.begin().await?;
    let room = locked_room(&mut tx, room_id).await?;
    if room.host_id != user_id {
        return Err(BackendError::forbidden("Only the host can consolidate bills"));
    }

    let consolidation = db::insert_consolidation(&mut *tx).await?;
    let bill_ids = db::stamp_bills(&mut *tx, room_id, consolidation.id).await?;
    if bill_ids.is_empty() {
        return Err(BackendError::conflict("No bills to consolidate"));
    }

    let bills = db::bills_for_consolidation(&mut *tx, consolidation.id).await?;
    let splits: Vec<BillSplit> = bills
        .iter()
        .map(|bill| BillSplit::new(bill.owner_id, bill.amount, bill.payers.clone(), bill.include_owner))
        .collect();
    let debts = settlement::consolidate(&splits)
        .map_err(|e| BackendError::internal(format!("Stored bill is invalid: {}", e)))?;

    let mut transactions = Vec::with_capacity(debts.len());
    for debt in &debts {
        transactions.push(insert_transaction(&mut *tx, consolidation.id, debt).await?);
    }

    tx.commit().await?;
    tracing::info!(
        "[Bills] Room {} consolidated: {} bills into {} transactions",
        room_id,
        bill_ids.len(),
        transactions.len()
    );
    Ok(ConsolidationResult { consolidation, bill_ids, transactions })
}
