//! JustJio WebSocket gateway entry point.
//!
//! Serves `GET /` (WebSocket) and `GET /ping` on `GATEWAY_PORT`. On
//! shutdown, open sockets are closed, every user consumer is cancelled and
//! awaited, and the broker is flushed.

use justjio::backend::broker::Broker;
use justjio::backend::realtime::{create_router, GatewayState};
use justjio::backend::server::shutdown::shutdown_signal;
use justjio::shared::config::AppConfig;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting gateway service");

    let config = AppConfig::from_env()?;
    info!("Configuration:");
    info!("  ENV: {}", config.environment);
    info!("  GATEWAY_PORT: {}", config.gateway_port);
    info!("  ALLOWED_ORIGINS: {:?}", config.allowed_origins);
    info!("  KAFKA_TOPIC_PREFIX: {}", config.topic_prefix);

    let broker = Broker::connect(config.broker_url.as_deref()).await?;
    info!("Using {} broker", broker.kind());
    if broker.is_in_process() {
        error!("No KAFKA_URL or KAFKA_HOST/KAFKA_PORT set: this gateway has a private in-process broker and will never see what the API publishes");
    }

    let port = config.gateway_port;
    let state = GatewayState::new(config, broker.clone());
    let app = create_router(state.clone());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Gateway listening on {}", addr);

    let shutdown = state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await?;

    info!("Stopping consumers...");
    state.registry.shutdown().await;
    broker.close().await;

    info!("Gateway stopped");
    Ok(())
}
