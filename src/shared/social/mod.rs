//! Social Module
//!
//! Friendship types shared by the API handlers and their tests:
//!
//! - `FriendRequest` - a directed request between two users
//! - `FriendRequestStatus` - pending, accepted or rejected
//! - `FriendRequestAction` - the receiver's answer

pub mod friend_request;

pub use friend_request::{FriendRequest, FriendRequestAction, FriendRequestStatus};
