//! Broker / WebSocket Envelope
//!
//! Every payload that travels through a per-user broker topic and out of the
//! gateway to a socket has the same outer shape:
//!
//! ```json
//! {"msgType":"CREATE_MESSAGE","data":{"roomId":"...","senderId":"1", ...}}
//! ```
//!
//! The gateway never inspects `data`; it forwards the raw bytes. The API side
//! builds envelopes through [`Envelope::chat_message`] and
//! [`Envelope::notification`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::SharedError;

/// Envelope type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// A chat message posted in a room
    CreateMessage,
    /// A user notification
    Notification,
}

/// Outer record published to the broker and written to sockets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "msgType")]
    pub msg_type: MessageType,
    pub data: serde_json::Value,
}

/// `data` of a `CREATE_MESSAGE` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageData {
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// RFC3339, second precision
    pub sent_at: String,
}

/// `data` of a `NOTIFICATION` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub title: String,
    pub content: String,
}

impl ChatMessageData {
    /// Build the payload for a persisted room message
    pub fn new(
        room_id: impl Into<String>,
        sender_id: i64,
        sender_name: impl Into<String>,
        content: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.into(),
            content: content.into(),
            sent_at: sent_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl Envelope {
    /// Wrap a chat message
    pub fn chat_message(data: &ChatMessageData) -> Result<Self, SharedError> {
        Ok(Self {
            msg_type: MessageType::CreateMessage,
            data: serde_json::to_value(data)?,
        })
    }

    /// Wrap a notification
    pub fn notification(title: impl Into<String>, content: impl Into<String>) -> Result<Self, SharedError> {
        let data = NotificationData {
            title: title.into(),
            content: content.into(),
        };
        Ok(Self {
            msg_type: MessageType::Notification,
            data: serde_json::to_value(&data)?,
        })
    }

    /// Serialize to the UTF-8 JSON bytes carried by the broker
    pub fn to_bytes(&self) -> Result<Vec<u8>, SharedError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse an envelope from broker bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SharedError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode `data` as a chat message, failing on a type mismatch
    pub fn chat_data(&self) -> Result<ChatMessageData, SharedError> {
        if self.msg_type != MessageType::CreateMessage {
            return Err(SharedError::validation("msgType", "expected CREATE_MESSAGE"));
        }
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Decode `data` as a notification, failing on a type mismatch
    pub fn notification_data(&self) -> Result<NotificationData, SharedError> {
        if self.msg_type != MessageType::Notification {
            return Err(SharedError::validation("msgType", "expected NOTIFICATION"));
        }
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
