/**
 * Room Message Handlers
 *
 * All routes sit behind the room guard. Posting a message persists it
 * first and then fans a `CREATE_MESSAGE` envelope out to every attendee,
 * sender included.
 */

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::db::{self, Message};
use crate::backend::broker::Publisher;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::{AuthUser, RoomMembership};
use crate::backend::server::state::AppState;
use crate::shared::{ChatMessageData, Envelope};

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub page: Option<i64>,
    pub asc: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesPage {
    pub messages: Vec<Message>,
    pub page: i64,
    pub page_count: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateMessageRequest {
    pub content: String,
}

/// GET /v1/rooms/{roomId}/messages?page=N&asc=bool
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(membership): Extension<RoomMembership>,
    Query(query): Query<MessagesQuery>,
) -> BackendResult<Json<MessagesPage>> {
    let pool = state.db()?;
    let page = query.page.unwrap_or(1).max(1);
    let messages = db::room_messages(pool, membership.room_id, page, query.asc.unwrap_or(true)).await?;
    let total = db::count_room_messages(pool, membership.room_id).await?;
    Ok(Json(MessagesPage {
        messages,
        page,
        page_count: db::page_count(total),
    }))
}

/// GET /v1/rooms/{roomId}/messages/{msgId}
pub async fn get_message(
    State(state): State<AppState>,
    Extension(membership): Extension<RoomMembership>,
    Path((_room_id, msg_id)): Path<(String, i64)>,
) -> BackendResult<Json<Message>> {
    db::get_message(state.db()?, membership.room_id, msg_id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("No message found"))
}

/// Publish a stored message to every attendee; failures are logged
pub async fn broadcast_message(publisher: &Publisher, membership: &RoomMembership, message: &Message) {
    let data = ChatMessageData::new(
        message.room_id.to_string(),
        message.sender_id,
        message.sender_name.as_str(),
        message.content.as_str(),
        message.sent_at,
    );
    let envelope = match Envelope::chat_message(&data) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!("[Messages] Could not build envelope for message {}: {}", message.id, e);
            return;
        }
    };
    match publisher.broadcast(&membership.attendees, &envelope).await {
        Ok(report) if report.is_complete() => {
            tracing::debug!("[Messages] Message {} sent to {} topics", message.id, report.delivered.len());
        }
        Ok(report) => {
            tracing::warn!(
                "[Messages] Message {} reached {} of {} attendees",
                message.id,
                report.delivered.len(),
                report.delivered.len() + report.failed.len()
            );
        }
        Err(e) => tracing::error!("[Messages] Broadcast of message {} failed: {}", message.id, e),
    }
}

/// POST /v1/rooms/{roomId}/messages
pub async fn create_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Extension(membership): Extension<RoomMembership>,
    Json(request): Json<CreateMessageRequest>,
) -> BackendResult<(StatusCode, Json<Message>)> {
    if request.content.trim().is_empty() {
        return Err(BackendError::invalid_input("content is required"));
    }
    let message = db::save_message(state.db()?, membership.room_id, user.user_id, &request.content).await?;
    tracing::info!("[Messages] Saved message {} to room {}", message.id, message.room_id);

    broadcast_message(&state.publisher, &membership, &message).await;
    Ok((StatusCode::CREATED, Json(message)))
}
