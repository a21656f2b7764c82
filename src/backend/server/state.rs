/**
 * Application State Management
 *
 * `AppState` is the explicit environment threaded into every handler: the
 * database pool, the broker publisher, the configuration and the OTP store.
 * There is no process-global state.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only what they need,
 * e.g. `State<Option<PgPool>>` or `State<Publisher>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::auth::otp::OtpStore;
use crate::backend::broker::{Broker, Publisher, TopicNames};
use crate::backend::error::BackendError;
use crate::shared::config::AppConfig;

/// Shared state of the API process
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL pool, `None` when no database is configured
    pub db_pool: Option<PgPool>,
    pub publisher: Publisher,
    pub config: Arc<AppConfig>,
    pub otp_store: OtpStore,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: Option<PgPool>, broker: Broker) -> Self {
        let publisher = Publisher::new(broker, TopicNames::from_config(&config));
        Self {
            db_pool,
            publisher,
            config: Arc::new(config),
            otp_store: OtpStore::default(),
        }
    }

    /// The pool, or 503 when the server runs without a database
    pub fn db(&self) -> Result<&PgPool, BackendError> {
        self.db_pool.as_ref().ok_or_else(|| {
            tracing::error!("Database not configured");
            BackendError::database_unavailable()
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}

impl FromRef<AppState> for Publisher {
    fn from_ref(state: &AppState) -> Self {
        state.publisher.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.config)
    }
}

impl FromRef<AppState> for OtpStore {
    fn from_ref(state: &AppState) -> Self {
        state.otp_store.clone()
    }
}
