//! Real-time Gateway Module
//!
//! The WebSocket fan-out gateway. Each authenticated socket is attached to
//! the connection registry under its user id. The registry keeps exactly
//! one broker consumer per connected user and writes every consumed
//! envelope to all of that user's sockets.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs      - Module exports and documentation
//! ├── registry.rs - Connection map and consumer lifecycle (single owner task)
//! ├── consumer.rs - Per-user consume loop
//! ├── socket.rs   - Per-connection read loop, heartbeat and writer
//! ├── state.rs    - Gateway state
//! ├── routes.rs   - `GET /` upgrade and `GET /ping`
//! └── main.rs     - `justjio-gateway` binary
//! ```

pub mod consumer;
pub mod registry;
pub mod routes;
pub mod socket;
pub mod state;

pub use registry::{AttachError, Attached, ConnectionRegistry};
pub use routes::create_router;
pub use state::GatewayState;
