//! Integration tests
//!
//! - `api` - REST endpoints against PostgreSQL and the in-process broker
//! - `database` - schema and migrations
//! - `realtime` - the gateway registry and consumers

mod api;
mod database;
