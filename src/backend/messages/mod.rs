//! Messages Module
//!
//! Room chat: paged history and message creation with real-time fan-out
//! through the broker.

pub mod db;
pub mod handlers;

pub use db::Message;
