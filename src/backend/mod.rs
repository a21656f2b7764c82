//! Backend Module
//!
//! All server-side code of the two JustJio processes. This module is only
//! compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - API initialization, application state, shutdown signal
//! - **`routes`** - Router assembly and middleware layering
//! - **`middleware`** - JWT authentication and the room membership guard
//! - **`error`** - `BackendError` and its HTTP rendering
//! - **`broker`** - Topic naming, NATS JetStream and in-process brokers, publisher
//! - **`realtime`** - The WebSocket fan-out gateway
//! - **`auth`** - Users, JWTs, one-time codes, signup and login
//! - **`users`** / **`friends`** - Profiles and the friendship graph
//! - **`rooms`** / **`messages`** - Rooms, invitations and room chat
//! - **`bills`** / **`transactions`** - Bill splitting, consolidation, settlement
//! - **`notifications`** / **`subscription`** - Stored notifications and push subscriptions
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - `justjio-api` binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── middleware/     - Request middleware
//! ├── error/          - Error types
//! ├── broker/         - Broker transport and publication
//! ├── realtime/       - Gateway (and the `justjio-gateway` binary)
//! ├── auth/           - Authentication
//! ├── users/          - User profile handlers
//! ├── friends/        - Friend requests and friendships
//! ├── rooms/          - Rooms and invites
//! ├── messages/       - Room messages
//! ├── bills/          - Bills and the settlement engine
//! ├── transactions/   - Debts and their settlement
//! ├── notifications/  - Notifications
//! └── subscription/   - Push subscriptions
//! ```
//!
//! # Write Then Publish
//!
//! Handlers that notify other users commit their database write first and
//! publish afterwards. Publish failures are logged and never turn a
//! successful write into an error response.
//!
//! # Error Handling
//!
//! Handlers return `BackendResult<T>`; `BackendError` renders as
//! `{"error": .., "status": ..}` with the matching status code.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Middleware for request processing
pub mod middleware;

/// Backend error types
pub mod error;

/// Broker transport and publication
pub mod broker;

/// WebSocket fan-out gateway
pub mod realtime;

/// Authentication and user management
pub mod auth;

/// User profile handlers
pub mod users;

/// Friend requests and friendships
pub mod friends;

/// Rooms and invitations
pub mod rooms;

/// Room chat messages
pub mod messages;

/// Bills and settlement
pub mod bills;

/// Transactions produced by consolidation
pub mod transactions;

/// Stored notifications
pub mod notifications;

/// Push subscriptions
pub mod subscription;

pub use error::{BackendError, BackendResult};
pub use server::create_app;
