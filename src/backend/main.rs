/**
 * JustJio API Server Entry Point
 *
 * Loads `.env`, reads `AppConfig` and serves the REST API until Ctrl+C or
 * SIGTERM. The broker is flushed before exit.
 */

use justjio::backend::server::init::create_app;
use justjio::backend::server::shutdown::shutdown_signal;
use justjio::shared::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("[STARTUP] API server initialization started");

    let config = AppConfig::from_env()?;
    let port = config.api_port;
    let (app, state) = create_app(config).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[STARTUP] Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing broker...");
    state.publisher.broker().close().await;
    tracing::info!("API server stopped");
    Ok(())
}
