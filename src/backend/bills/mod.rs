//! Bills Module
//!
//! Recording bills inside a room and consolidating them into
//! transactions. The arithmetic lives in `settlement` and does no I/O.

pub mod db;
pub mod handlers;
pub mod service;
pub mod settlement;

pub use db::Bill;
pub use settlement::{consolidate, BillSplit, Debt, SettlementError};
