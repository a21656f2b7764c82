/**
 * Server Configuration
 *
 * Loads the optional services of the API process from `AppConfig`.
 *
 * # Error Handling
 *
 * A database that cannot be reached is logged and left out; the server
 * still starts and database-backed handlers answer 503. A configured broker
 * that cannot be reached is fatal, since publication is part of the core
 * request paths.
 */

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::backend::broker::{Broker, BrokerError};
use crate::shared::config::AppConfig;

/// Database configuration result
pub type DatabaseConfig = Option<PgPool>;

/// Connect to PostgreSQL and run migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is reachable
/// - `None` if no URL is configured or the connection fails
pub async fn load_database(config: &AppConfig) -> DatabaseConfig {
    let database_url = match &config.database_url {
        Some(url) => url,
        None => {
            tracing::warn!("DSN / DATABASE_URL not set. Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPoolOptions::new().max_connections(10).connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

/// Connect to the configured broker, or start the in-process one
pub async fn load_broker(config: &AppConfig) -> Result<Broker, BrokerError> {
    let broker = Broker::connect(config.broker_url.as_deref()).await?;
    tracing::info!("[Broker] Using {} broker", broker.kind());
    Ok(broker)
}
