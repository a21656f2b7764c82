//! Friend Request Data Structure
//!
//! A request moves from `pending` to exactly one of `accepted` or
//! `rejected`. Both answers are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Status of a friend request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestStatus {
    /// Request is pending
    #[default]
    Pending,
    /// Request was accepted
    Accepted,
    /// Request was rejected
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
            FriendRequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(FriendRequestStatus::Pending),
            "accepted" => Some(FriendRequestStatus::Accepted),
            "rejected" => Some(FriendRequestStatus::Rejected),
            _ => None,
        }
    }

    /// Apply the receiver's answer
    ///
    /// Only a pending request can be answered.
    pub fn respond(self, action: FriendRequestAction) -> Result<Self, SharedError> {
        if self != FriendRequestStatus::Pending {
            return Err(SharedError::validation(
                "status",
                format!("friend request already {}", self.as_str()),
            ));
        }
        Ok(match action {
            FriendRequestAction::Accept => FriendRequestStatus::Accepted,
            FriendRequestAction::Reject => FriendRequestStatus::Rejected,
        })
    }
}

/// The receiver's answer to a pending request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestAction {
    Accept,
    Reject,
}

/// Represents a friend request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    /// Username of the sender, for listing received requests
    pub sender_username: String,
    #[serde(default)]
    pub status: FriendRequestStatus,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl FriendRequest {
    /// Check if the request is pending
    pub fn is_pending(&self) -> bool {
        self.status == FriendRequestStatus::Pending
    }
}
