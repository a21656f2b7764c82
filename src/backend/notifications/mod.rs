//! Notifications Module
//!
//! Stored notifications and their real-time delivery through the broker.

pub mod db;
pub mod handlers;
pub mod service;

pub use db::Notification;
