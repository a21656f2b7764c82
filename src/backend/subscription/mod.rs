//! Push Subscriptions Module

pub mod db;
pub mod handlers;

pub use db::Subscription;
