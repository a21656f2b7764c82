//! Broker Module
//!
//! Topic-based message transport shared by the API (producer) and the
//! gateway (consumer).
//!
//! # Topics
//!
//! Every user owns one topic, named by [`topics::TopicNames::user_topic`].
//! The API publishes envelopes to the topics of their recipients; the
//! gateway runs one consumer per connected user, inside a single consumer
//! group for the whole fleet.
//!
//! # Backends
//!
//! - [`nats::NatsBroker`] - NATS JetStream. A topic is a stream with one
//!   subject of the same name; the consumer group is a durable pull consumer.
//! - [`memory::MemoryBroker`] - in-process logs with per-group offsets, used
//!   by tests and by single-process development when no broker is configured.
//!
//! [`Broker`] dispatches to either one.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

pub mod memory;
pub mod nats;
pub mod publisher;
pub mod topics;

pub use memory::MemoryBroker;
pub use nats::NatsBroker;
pub use publisher::{BroadcastReport, Publisher};
pub use topics::TopicNames;

/// How long `close` waits for in-flight publishes
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Broker errors
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("topic operation failed: {0}")]
    Topic(String),

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("consume failed: {0}")]
    Consume(String),

    #[error("envelope encoding failed: {0}")]
    Encode(String),
}

/// A connected broker
#[derive(Clone)]
pub enum Broker {
    Nats(NatsBroker),
    Memory(MemoryBroker),
}

impl Broker {
    /// Connect to the broker at `url`, or start the in-process broker
    pub async fn connect(url: Option<&str>) -> Result<Self, BrokerError> {
        match url {
            Some(url) => Ok(Broker::Nats(NatsBroker::connect(url).await?)),
            None => {
                tracing::warn!("[Broker] No broker address configured, using the in-process broker");
                Ok(Broker::Memory(MemoryBroker::new()))
            }
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Broker::Nats(_) => "nats",
            Broker::Memory(_) => "memory",
        }
    }

    /// True for the in-process broker, which no other process can reach
    pub fn is_in_process(&self) -> bool {
        matches!(self, Broker::Memory(_))
    }

    /// Create `topic` if it does not exist yet
    ///
    /// Idempotent: an existing topic is not an error.
    pub async fn ensure_topic(&self, topic: &str) -> Result<(), BrokerError> {
        match self {
            Broker::Nats(broker) => broker.ensure_topic(topic).await,
            Broker::Memory(broker) => broker.ensure_topic(topic).await,
        }
    }

    /// Publish one payload to `topic` and wait for the broker to accept it
    pub async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        match self {
            Broker::Nats(broker) => broker.publish(topic, payload).await,
            Broker::Memory(broker) => broker.publish(topic, payload).await,
        }
    }

    /// Join consumer group `group` on `topic`
    ///
    /// The group's position survives consumer restarts; a brand new group
    /// starts at the earliest retained message.
    pub async fn subscribe(&self, topic: &str, group: &str) -> Result<BrokerConsumer, BrokerError> {
        match self {
            Broker::Nats(broker) => Ok(BrokerConsumer::Nats(broker.subscribe(topic, group).await?)),
            Broker::Memory(broker) => Ok(BrokerConsumer::Memory(broker.subscribe(topic, group).await?)),
        }
    }

    /// Flush pending publishes, bounded by [`FLUSH_TIMEOUT`]
    pub async fn close(&self) {
        match self {
            Broker::Nats(broker) => broker.close(FLUSH_TIMEOUT).await,
            Broker::Memory(_) => {}
        }
    }
}

/// A consumer attached to one topic inside a consumer group
pub enum BrokerConsumer {
    Nats(nats::NatsConsumer),
    Memory(memory::MemoryConsumer),
}

impl BrokerConsumer {
    /// Wait up to `timeout` for the next message
    ///
    /// `Ok(None)` means the timeout elapsed. Any error is fatal for this
    /// consumer.
    pub async fn poll(&mut self, timeout: Duration) -> Result<Option<Bytes>, BrokerError> {
        match self {
            BrokerConsumer::Nats(consumer) => consumer.poll(timeout).await,
            BrokerConsumer::Memory(consumer) => consumer.poll(timeout).await,
        }
    }
}
