//! Per-user consume loop.
//!
//! One task per connected user reads that user's topic through the shared
//! consumer group and hands every message to the registry for fan-out. The
//! next poll waits until the previous message sits in every socket queue.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::registry::{ConnectionRegistry, ReadySender};
use crate::backend::broker::{Broker, TopicNames};

/// Upper bound on one broker poll; cancellation is seen within this window
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

pub(crate) struct ConsumerTask {
    pub user_id: i64,
    pub generation: u64,
    pub broker: Broker,
    pub names: TopicNames,
    pub registry: ConnectionRegistry,
    pub token: CancellationToken,
    /// The user's previous consumer, still winding down
    pub previous: Option<JoinHandle<()>>,
    /// Answers the attach that started this consumer
    pub ready: ReadySender,
}

impl ConsumerTask {
    pub async fn run(self) {
        let ConsumerTask {
            user_id,
            generation,
            broker,
            names,
            registry,
            token,
            previous,
            ready,
        } = self;

        if let Some(previous) = previous {
            let _ = previous.await;
        }

        let topic = names.user_topic(user_id);
        let group = names.consumer_group();
        let subscribed = tokio::select! {
            _ = token.cancelled() => None,
            subscribed = broker.subscribe(&topic, &group) => Some(subscribed),
        };
        let mut consumer = match subscribed {
            None => {
                registry.consumer_exited(user_id, generation);
                return;
            }
            Some(Ok(consumer)) => consumer,
            Some(Err(e)) => {
                tracing::error!("[Gateway] Subscribe to {} failed: {}", topic, e);
                registry.subscribe_failed(user_id, generation, e, ready);
                return;
            }
        };
        tracing::info!("[Gateway] Consuming {} as {}", topic, group);
        let _ = ready.send(Ok(()));

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("[Gateway] Consumer for {} cancelled", topic);
                    break;
                }
                polled = consumer.poll(POLL_TIMEOUT) => match polled {
                    Ok(Some(payload)) => {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = registry.broadcast(user_id, payload) => {}
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("[Gateway] Consume from {} failed: {}", topic, e);
                        break;
                    }
                }
            }
        }

        drop(consumer);
        registry.consumer_exited(user_id, generation);
    }
}
