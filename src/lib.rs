// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! JustJio - Main Library
//!
//! JustJio is a hangout planning backend: users create rooms, invite
//! friends, chat inside rooms, split bills and settle the resulting debts.
//!
//! # Overview
//!
//! The library backs two cooperating processes:
//!
//! - **`justjio-api`** - the REST API (users, friendships, rooms, invites,
//!   messages, bills, consolidation, transactions, notifications, push
//!   subscriptions). It publishes chat and notification envelopes to a
//!   per-user broker topic.
//! - **`justjio-gateway`** - the WebSocket fan-out gateway. It runs one
//!   broker consumer per connected user and forwards every consumed
//!   envelope to all of that user's live sockets.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by both processes
//!   - Wire envelopes, time-ordered identifiers
//!   - Configuration loaded from the environment
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server, routes and middleware
//!   - PostgreSQL persistence with sqlx
//!   - Broker publication and the bill settlement engine
//!   - The real-time gateway (`backend::realtime`)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the server modules and their dependencies.
//!
//! # Usage
//!
//! ```rust,no_run
//! use justjio::backend::server::init::create_app;
//! use justjio::shared::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let (app, _state) = create_app(config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```

/// Shared types (envelopes, identifiers, configuration, errors)
pub mod shared;

/// Backend server code
#[cfg(feature = "ssr")]
pub mod backend;
