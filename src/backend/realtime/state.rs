/**
 * Gateway State
 *
 * Shared by the upgrade handler and every socket task.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use tokio_util::sync::CancellationToken;

use super::registry::ConnectionRegistry;
use crate::backend::broker::{Broker, TopicNames};
use crate::shared::config::AppConfig;

#[derive(Clone)]
pub struct GatewayState {
    pub registry: ConnectionRegistry,
    pub config: Arc<AppConfig>,
    /// Cancelled on process shutdown; open sockets close themselves
    pub shutdown: CancellationToken,
}

impl GatewayState {
    /// Start the connection registry on top of `broker`
    pub fn new(config: AppConfig, broker: Broker) -> Self {
        let names = TopicNames::from_config(&config);
        tracing::info!("[Gateway] Consumer group: {}", names.consumer_group());
        Self {
            registry: ConnectionRegistry::spawn(broker, names),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }
}

impl FromRef<GatewayState> for ConnectionRegistry {
    fn from_ref(state: &GatewayState) -> Self {
        state.registry.clone()
    }
}

impl FromRef<GatewayState> for Arc<AppConfig> {
    fn from_ref(state: &GatewayState) -> Self {
        state.config.clone()
    }
}
