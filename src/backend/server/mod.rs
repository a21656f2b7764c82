//! Server Module
//!
//! Initialization and shared state of the API process.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Optional service loading (database, broker)
//! ├── init.rs         - Server initialization and app creation
//! └── shutdown.rs     - Ctrl+C / SIGTERM signal for graceful shutdown
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration**: `AppConfig` is read from the environment by `main`
//! 2. **Services**: the database pool and the broker are connected; a missing
//!    database leaves `db_pool` empty and handlers answer 503
//! 3. **Router**: routes and middleware are assembled around `AppState`

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

/// Graceful shutdown signal
pub mod shutdown;

// Re-export commonly used types
pub use init::create_app;
pub use state::AppState;
