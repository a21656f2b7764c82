//! One WebSocket connection.
//!
//! The socket is split: a writer task drains the connection's outbound
//! queue, while this task reads client frames and sends heartbeats. The
//! registry holds a clone of the queue sender for fan-out.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::registry::SOCKET_BUFFER;
use super::state::GatewayState;
use crate::backend::auth::sessions::verify_token;

/// Server heartbeat period
pub const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Why a connection was refused after the upgrade
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no token provided")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid user ID")]
    InvalidUserId,
}

/// Resolve the caller's user id from a bearer token
pub fn authenticate(secret: &str, token: Option<&str>) -> Result<i64, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let claims = verify_token(secret, token).map_err(|e| {
        tracing::debug!("[Gateway] Token rejected: {}", e);
        AuthError::InvalidToken
    })?;
    claims.user_id().ok_or(AuthError::InvalidUserId)
}

/// Body sent before closing an unauthenticated socket
pub fn unauthorized_body(error: &AuthError) -> String {
    serde_json::json!({ "status": "Unauthorized", "error": error.to_string() }).to_string()
}

async fn reject(mut socket: WebSocket, error: AuthError) {
    tracing::warn!("[Gateway] Unauthorized connection: {}", error);
    if let Err(e) = socket.send(Message::Text(unauthorized_body(&error).into())).await {
        tracing::debug!("[Gateway] Could not send unauthorized frame: {}", e);
    }
    close(socket).await;
}

async fn close(mut socket: WebSocket) {
    let _ = socket.send(Message::Close(None)).await;
}

/// Drive one upgraded connection until either side closes it
pub async fn handle_socket(socket: WebSocket, state: GatewayState, token: Option<String>) {
    let user_id = match authenticate(&state.config.jwt_secret, token.as_deref()) {
        Ok(user_id) => user_id,
        Err(error) => return reject(socket, error).await,
    };

    let (tx, mut rx) = mpsc::channel::<Message>(SOCKET_BUFFER);
    let attached = match state.registry.attach(user_id, tx.clone()).await {
        Ok(attached) => attached,
        Err(e) => {
            tracing::warn!("[Gateway] Could not attach user {}: {}", user_id, e);
            return close(socket).await;
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer_closed = CancellationToken::new();
    let writer = tokio::spawn({
        let writer_closed = writer_closed.clone();
        async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = ws_tx.send(message).await {
                    tracing::warn!("[Gateway] Socket write failed: {}", e);
                    break;
                }
            }
            let _ = ws_tx.close().await;
            writer_closed.cancel();
        }
    });

    let mut heartbeat = interval(PING_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = tx.try_send(Message::Pong(data)) {
                        tracing::debug!("[Gateway] Pong to user {} dropped: {}", user_id, e);
                    }
                }
                Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("[Gateway] Ignoring text from user {}: {}", user_id, text.as_str());
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("[Gateway] Ignoring {} binary bytes from user {}", data.len(), user_id);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::warn!("[Gateway] Read from user {} failed: {}", user_id, e);
                    break;
                }
            },
            _ = heartbeat.tick() => match tx.try_send(Message::Ping(Bytes::new())) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Closed(_)) => break,
            },
            _ = writer_closed.cancelled() => break,
            _ = attached.evicted.cancelled() => {
                let _ = tx.try_send(Message::Close(None));
                break;
            }
            _ = state.shutdown.cancelled() => {
                let _ = tx.try_send(Message::Close(None));
                break;
            }
        }
    }

    let was_last = state.registry.detach(user_id, attached.conn_id).await;
    drop(tx);
    let _ = writer.await;
    tracing::info!(
        "[Gateway] User {} disconnected{}",
        user_id,
        if was_last { ", no sockets left" } else { "" }
    );
}
