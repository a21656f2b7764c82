/**
 * Bill Handlers
 *
 * `/v1/bills` endpoints. The room id travels in the body or the query, so
 * attendance is checked here rather than by the room guard.
 */

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::db::{self, Bill};
use super::service::{self, BillRequest, ConsolidationResult};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::rooms::db::{is_attendee, room_exists};
use crate::backend::server::state::AppState;
use crate::shared::ids::parse_id;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub room_id: String,
    pub name: String,
    pub amount: Decimal,
    pub payers: Vec<i64>,
    #[serde(default)]
    pub include_owner: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub room_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedResponse {
    pub is_consolidated: bool,
}

async fn ensure_attendee(state: &AppState, room_id: Uuid, user_id: i64) -> BackendResult<()> {
    let pool = state.db()?;
    if !room_exists(pool, room_id).await? {
        return Err(BackendError::not_found("Room not found"));
    }
    if !is_attendee(pool, room_id, user_id).await? {
        return Err(BackendError::forbidden("You are not in this room"));
    }
    Ok(())
}

/// POST /v1/bills
pub async fn create_bill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateBillRequest>,
) -> BackendResult<Json<Bill>> {
    let room_id = parse_id(&request.room_id)?;
    let bill = service::create_bill(
        state.db()?,
        user.user_id,
        BillRequest {
            room_id,
            name: request.name,
            amount: request.amount,
            payers: request.payers,
            include_owner: request.include_owner,
        },
    )
    .await?;
    Ok(Json(bill))
}

/// GET /v1/bills?roomId=
pub async fn get_bills(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<RoomQuery>,
) -> BackendResult<Json<Vec<Bill>>> {
    let room_id = parse_id(&query.room_id)?;
    ensure_attendee(&state, room_id, user.user_id).await?;
    Ok(Json(db::bills_for_room(state.db()?, room_id).await?))
}

/// GET /v1/bills/consolidate/{roomId}
pub async fn is_consolidated(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
) -> BackendResult<Json<ConsolidatedResponse>> {
    let room_id = parse_id(&room_id)?;
    ensure_attendee(&state, room_id, user.user_id).await?;
    let is_consolidated = db::all_bills_consolidated(state.db()?, room_id).await?;
    Ok(Json(ConsolidatedResponse { is_consolidated }))
}

/// POST /v1/bills/consolidate
pub async fn consolidate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<RoomQuery>,
) -> BackendResult<Json<ConsolidationResult>> {
    let room_id = parse_id(&request.room_id)?;
    let result = service::consolidate_room(state.db()?, room_id, user.user_id).await?;
    Ok(Json(result))
}
