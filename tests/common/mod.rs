//! Common test utilities and helpers
//!
//! - Database fixtures
//! - Test users and tokens
//! - An API server wired to the in-process broker
//! - Custom assertion macros
//! - Polling for background state

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod database;
pub mod server;
pub mod wait;

pub use auth_helpers::*;
pub use database::*;
pub use server::*;
pub use wait::wait_for;
