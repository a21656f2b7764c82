//! NATS JetStream backend.
//!
//! Mapping of the topic model onto JetStream:
//!
//! - topic `t` is the stream `t` capturing the single subject `t`;
//! - publishing waits for the JetStream ack;
//! - consumer group `g` is the durable pull consumer `g` on the stream, with
//!   explicit acks, so its position outlives any one gateway process.

use std::time::Duration;

use async_nats::jetstream::{self, consumer, stream};
use async_nats::Client;
use bytes::Bytes;
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use super::BrokerError;

/// Retention for per-user topics (7 days).
pub const TOPIC_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Max messages kept per user topic.
pub const TOPIC_MAX_MESSAGES: i64 = 100_000;

/// Max bytes kept per user topic (64MB).
pub const TOPIC_MAX_BYTES: i64 = 64 * 1024 * 1024;

/// Wrapper around the NATS client with JetStream context.
#[derive(Clone)]
pub struct NatsBroker {
    client: Client,
    jetstream: jetstream::Context,
}

impl NatsBroker {
    /// Connect to a NATS server and create a JetStream context.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        info!("[Broker] Connecting to NATS at {}", url);
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        let jetstream = jetstream::new(client.clone());
        Ok(Self { client, jetstream })
    }

    async fn stream(&self, topic: &str) -> Result<stream::Stream, BrokerError> {
        self.jetstream
            .get_or_create_stream(stream::Config {
                name: topic.to_string(),
                subjects: vec![topic.to_string()],
                retention: stream::RetentionPolicy::Limits,
                max_messages: TOPIC_MAX_MESSAGES,
                max_bytes: TOPIC_MAX_BYTES,
                max_age: TOPIC_RETENTION,
                storage: stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| BrokerError::Topic(format!("{}: {}", topic, e)))
    }

    pub async fn ensure_topic(&self, topic: &str) -> Result<(), BrokerError> {
        self.stream(topic).await?;
        debug!("[Broker] Topic '{}' ready", topic);
        Ok(())
    }

    /// Publish a message to JetStream (with acknowledgment).
    pub async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        self.jetstream
            .publish(topic.to_string(), payload)
            .await
            .map_err(|e| BrokerError::Publish(format!("{}: {}", topic, e)))?
            .await
            .map_err(|e| BrokerError::Publish(format!("{}: {}", topic, e)))?;
        Ok(())
    }

    pub async fn subscribe(&self, topic: &str, group: &str) -> Result<NatsConsumer, BrokerError> {
        let stream = self.stream(topic).await?;
        let consumer = stream
            .get_or_create_consumer(
                group,
                consumer::pull::Config {
                    durable_name: Some(group.to_string()),
                    ack_policy: consumer::AckPolicy::Explicit,
                    deliver_policy: consumer::DeliverPolicy::All,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BrokerError::Consume(format!("{}/{}: {}", topic, group, e)))?;
        let messages = consumer
            .messages()
            .await
            .map_err(|e| BrokerError::Consume(format!("{}/{}: {}", topic, group, e)))?;

        info!("[Broker] Subscribed to '{}' as '{}'", topic, group);
        Ok(NatsConsumer {
            topic: topic.to_string(),
            messages,
        })
    }

    /// Flush buffered publishes, giving up after `timeout`
    pub async fn close(&self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.client.flush()).await {
            Ok(Ok(())) => info!("[Broker] Flushed NATS connection"),
            Ok(Err(e)) => warn!("[Broker] Flush failed: {}", e),
            Err(_) => warn!("[Broker] Flush did not finish within {:?}", timeout),
        }
    }
}

/// Pull consumer bound to one user topic
pub struct NatsConsumer {
    topic: String,
    messages: consumer::pull::Stream,
}

impl NatsConsumer {
    pub async fn poll(&mut self, timeout: Duration) -> Result<Option<Bytes>, BrokerError> {
        match tokio::time::timeout(timeout, self.messages.next()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(BrokerError::Consume(format!("{}: message stream ended", self.topic))),
            Ok(Some(Err(e))) => Err(BrokerError::Consume(format!("{}: {}", self.topic, e))),
            Ok(Some(Ok(message))) => {
                message
                    .ack()
                    .await
                    .map_err(|e| BrokerError::Consume(format!("{}: ack failed: {}", self.topic, e)))?;
                Ok(Some(message.payload.clone()))
            }
        }
    }
}
