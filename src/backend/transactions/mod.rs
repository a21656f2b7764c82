//! Transactions Module
//!
//! Debts produced by bill consolidation, and their settlement.

pub mod db;
pub mod handlers;
pub mod service;

pub use db::Transaction;
