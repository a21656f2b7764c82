//! In-process broker.
//!
//! Each topic keeps its full log plus one read offset per consumer group, so
//! it behaves like a single-partition topic: a group sees every message
//! once, in publish order, and a restarted consumer resumes where the group
//! left off. Consumers park on a `Notify` between messages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use super::BrokerError;

#[derive(Default)]
struct TopicLog {
    state: Mutex<LogState>,
    notify: Notify,
    /// Live consumers across all groups
    consumers: AtomicUsize,
    /// Set by `fail_topic`; every poll then errors
    failed: AtomicBool,
    /// Set by `fail_subscriptions`; new consumers are refused
    refuse_subscribe: AtomicBool,
    /// Milliseconds every `subscribe` stalls before answering
    subscribe_delay_ms: AtomicU64,
}

#[derive(Default)]
struct LogState {
    messages: Vec<Bytes>,
    offsets: HashMap<String, usize>,
}

impl TopicLog {
    async fn next_for(&self, group: &str) -> Option<Bytes> {
        let mut state = self.state.lock().await;
        let LogState { messages, offsets } = &mut *state;
        let offset = offsets.entry(group.to_string()).or_insert(0);
        let message = messages.get(*offset).cloned()?;
        *offset += 1;
        Some(message)
    }
}

/// Shared in-process broker handle
#[derive(Clone, Default)]
pub struct MemoryBroker {
    topics: Arc<DashMap<String, Arc<TopicLog>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, topic: &str) -> Option<Arc<TopicLog>> {
        self.topics.get(topic).map(|entry| Arc::clone(entry.value()))
    }

    fn topic_or_create(&self, topic: &str) -> Arc<TopicLog> {
        Arc::clone(self.topics.entry(topic.to_string()).or_default().value())
    }

    pub async fn ensure_topic(&self, topic: &str) -> Result<(), BrokerError> {
        self.topic_or_create(topic);
        Ok(())
    }

    pub async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        let log = self
            .topic(topic)
            .ok_or_else(|| BrokerError::UnknownTopic(topic.to_string()))?;
        log.state.lock().await.messages.push(payload);
        log.notify.notify_waiters();
        Ok(())
    }

    pub async fn subscribe(&self, topic: &str, group: &str) -> Result<MemoryConsumer, BrokerError> {
        let log = self.topic_or_create(topic);
        let delay = log.subscribe_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if log.refuse_subscribe.load(Ordering::SeqCst) {
            return Err(BrokerError::Connect(format!("{}: broker unreachable", topic)));
        }
        log.consumers.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConsumer {
            topic: topic.to_string(),
            group: group.to_string(),
            log,
        })
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Number of messages retained on `topic`
    pub async fn message_count(&self, topic: &str) -> usize {
        match self.topic(topic) {
            Some(log) => log.state.lock().await.messages.len(),
            None => 0,
        }
    }

    /// Number of live consumers on `topic`
    pub fn consumer_count(&self, topic: &str) -> usize {
        self.topic(topic)
            .map(|log| log.consumers.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Make every poll on `topic` fail, as if the broker dropped the partition
    pub fn fail_topic(&self, topic: &str) {
        if let Some(log) = self.topic(topic) {
            log.failed.store(true, Ordering::SeqCst);
            log.notify.notify_waiters();
        }
    }

    /// Refuse (or accept again) new consumers on `topic`
    pub fn fail_subscriptions(&self, topic: &str, failing: bool) {
        self.topic_or_create(topic).refuse_subscribe.store(failing, Ordering::SeqCst);
    }

    /// Make every `subscribe` on `topic` take `delay`
    pub fn delay_subscriptions(&self, topic: &str, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.topic_or_create(topic).subscribe_delay_ms.store(millis, Ordering::SeqCst);
    }
}

/// Consumer of one topic inside one group
pub struct MemoryConsumer {
    topic: String,
    group: String,
    log: Arc<TopicLog>,
}

impl MemoryConsumer {
    pub async fn poll(&mut self, timeout: Duration) -> Result<Option<Bytes>, BrokerError> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.log.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a publish in between is not missed.
            notified.as_mut().enable();

            if self.log.failed.load(Ordering::SeqCst) {
                return Err(BrokerError::Consume(format!("{}: partition unavailable", self.topic)));
            }
            if let Some(message) = self.log.next_for(&self.group).await {
                return Ok(Some(message));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

impl Drop for MemoryConsumer {
    fn drop(&mut self) {
        self.log.consumers.fetch_sub(1, Ordering::SeqCst);
    }
}
