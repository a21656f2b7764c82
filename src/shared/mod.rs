//! Shared Module
//!
//! Types used by both the API process and the WebSocket gateway: the JSON
//! envelope that travels over the broker and the socket, identifier
//! generation, configuration and the shared error type.

/// Broker / WebSocket envelope
pub mod envelope;

/// Time-ordered identifiers for rooms and push subscriptions
pub mod ids;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Friendship types
pub mod social;

/// Re-export commonly used types for convenience
pub use envelope::{ChatMessageData, Envelope, MessageType, NotificationData};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Environment};
