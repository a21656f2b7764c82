//! API integration tests
//!
//! Integration tests for the REST endpoints

mod auth_test;
mod bills_test;
mod rooms_test;
