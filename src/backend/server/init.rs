/**
 * Server Initialization
 *
 * Builds the API router: loads the optional services, creates `AppState`
 * and hands it to the route configuration.
 */

use axum::Router;

use crate::backend::broker::BrokerError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_broker, load_database};
use crate::backend::server::state::AppState;
use crate::shared::config::AppConfig;

/// Create and configure the API application
///
/// # Errors
///
/// Fails only when a configured broker cannot be reached. A missing
/// database is tolerated (see `load_database`).
pub async fn create_app(config: AppConfig) -> Result<(Router<()>, AppState), BrokerError> {
    tracing::info!("Initializing JustJio API server ({})", config.environment);

    let db_pool = load_database(&config).await;
    let broker = load_broker(&config).await?;

    let state = AppState::new(config, db_pool, broker);
    let router = create_router(state.clone());

    tracing::info!("API server initialized");
    Ok((router, state))
}
