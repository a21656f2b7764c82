//! Middleware Module
//!
//! Request processing ahead of the API handlers:
//!
//! - **`auth`** - validates the bearer token and attaches the caller
//! - **`room`** - checks that the caller attends the room in the path and
//!   passes the attendee list on to the handler
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use justjio::backend::middleware::{auth_middleware, require_room_member};
//! use justjio::backend::server::AppState;
//!
//! fn routes(state: AppState) -> Router<AppState> {
//!     Router::new()
//!         .route("/v1/rooms/{roomId}", get(|| async { "room" }))
//!         .route_layer(middleware::from_fn_with_state(state.clone(), require_room_member))
//!         .route_layer(middleware::from_fn_with_state(state, auth_middleware))
//! }
//! ```

pub mod auth;
pub mod room;

pub use auth::{auth_middleware, extract_authenticated_user, AuthUser, AuthenticatedUser};
pub use room::{require_room_member, RoomMembership};
