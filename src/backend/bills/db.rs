/**
 * Bill Database Operations
 *
 * Bills with their payer sets (`bill_payers`) and consolidation records.
 * Payers are aggregated into an array column so a bill loads in one row.
 */

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub include_owner: bool,
    pub room_id: Uuid,
    pub owner_id: i64,
    pub consolidation_id: Option<i64>,
    /// Payer ids, ascending
    pub payers: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Consolidation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields of a bill before insertion
#[derive(Debug, Clone)]
pub struct NewBill {
    pub room_id: Uuid,
    pub owner_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub include_owner: bool,
}

const BILL_SELECT: &str = r#"
    SELECT b.id, b.name, b.amount, b.date, b.include_owner, b.room_id, b.owner_id,
           b.consolidation_id,
           COALESCE(
               ARRAY_AGG(bp.user_id ORDER BY bp.user_id) FILTER (WHERE bp.user_id IS NOT NULL),
               '{}'
           ) AS payers
    FROM bills b
    LEFT JOIN bill_payers bp ON bp.bill_id = b.id
"#;

/// Insert the bill row; payers are added with `insert_payers`
pub async fn insert_bill(db: impl PgExecutor<'_>, bill: &NewBill) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bills (name, amount, include_owner, room_id, owner_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&bill.name)
    .bind(bill.amount)
    .bind(bill.include_owner)
    .bind(bill.room_id)
    .bind(bill.owner_id)
    .fetch_one(db)
    .await
}

pub async fn insert_payers(db: impl PgExecutor<'_>, bill_id: i64, payers: &[i64]) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO bill_payers (bill_id, user_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(bill_id)
        .bind(payers)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn get_bill(db: impl PgExecutor<'_>, bill_id: i64) -> Result<Option<Bill>, sqlx::Error> {
    sqlx::query_as::<_, Bill>(&format!("{BILL_SELECT} WHERE b.id = $1 GROUP BY b.id"))
        .bind(bill_id)
        .fetch_optional(db)
        .await
}

pub async fn bills_for_room(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<Vec<Bill>, sqlx::Error> {
    sqlx::query_as::<_, Bill>(&format!(
        "{BILL_SELECT} WHERE b.room_id = $1 GROUP BY b.id ORDER BY b.id"
    ))
    .bind(room_id)
    .fetch_all(db)
    .await
}

pub async fn bills_for_consolidation(db: impl PgExecutor<'_>, consolidation_id: i64) -> Result<Vec<Bill>, sqlx::Error> {
    sqlx::query_as::<_, Bill>(&format!(
        "{BILL_SELECT} WHERE b.consolidation_id = $1 GROUP BY b.id ORDER BY b.id"
    ))
    .bind(consolidation_id)
    .fetch_all(db)
    .await
}

/// Whether the room's bills are consolidated
///
/// Reads only the first bill of the room: bills are consolidated all at
/// once and new bills are refused afterwards, so one row decides. A room
/// without bills counts as consolidated.
pub async fn all_bills_consolidated(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<bool, sqlx::Error> {
    let first = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT consolidation_id FROM bills WHERE room_id = $1 ORDER BY id LIMIT 1",
    )
    .bind(room_id)
    .fetch_optional(db)
    .await?;
    Ok(match first {
        None => true,
        Some(consolidation_id) => consolidation_id.is_some(),
    })
}

/// Whether any bill of the room has been consolidated already
pub async fn has_consolidated_bill(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM bills WHERE room_id = $1 AND consolidation_id IS NOT NULL)",
    )
    .bind(room_id)
    .fetch_one(db)
    .await
}

pub async fn insert_consolidation(db: impl PgExecutor<'_>) -> Result<Consolidation, sqlx::Error> {
    sqlx::query_as::<_, Consolidation>("INSERT INTO consolidations DEFAULT VALUES RETURNING id, created_at")
        .fetch_one(db)
        .await
}

/// Stamp every unconsolidated bill of the room; returns the stamped ids
pub async fn stamp_bills(db: impl PgExecutor<'_>, room_id: Uuid, consolidation_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE bills SET consolidation_id = $1
        WHERE room_id = $2 AND consolidation_id IS NULL
        RETURNING id
        "#,
    )
    .bind(consolidation_id)
    .bind(room_id)
    .fetch_all(db)
    .await
}
