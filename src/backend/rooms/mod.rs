//! Rooms Module
//!
//! Hangout rooms: creation with invitations, membership, closing and
//! leaving.
//!
//! - **`db`** - room, attendee and invite queries
//! - **`service`** - transactional use cases (create, invite, answer,
//!   join, close, leave)
//! - **`handlers`** - HTTP handlers for `/v1/rooms`
//!
//! Closing and leaving are only possible once every bill in the room has
//! been consolidated.

pub mod db;
pub mod handlers;
pub mod service;

pub use db::{Room, RoomInvite};
