//! API-side publication
//!
//! The API never talks to the broker directly from handlers; it goes through
//! [`Publisher`], which knows the topic naming scheme. Publication always
//! happens after the originating database write has committed, and its
//! failures are logged by the caller rather than returned to the client.

use std::collections::BTreeSet;

use bytes::Bytes;
use futures_util::future::join_all;
use tracing::{debug, warn};

use super::{Broker, BrokerError, TopicNames};
use crate::shared::Envelope;

/// Outcome of a broadcast to several recipients
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Recipients whose topic accepted the envelope
    pub delivered: Vec<i64>,
    /// Recipients whose publish failed, with the reason
    pub failed: Vec<(i64, BrokerError)>,
}

impl BroadcastReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Collapse the per-recipient failures into one error
    pub fn into_result(self) -> Result<usize, BrokerError> {
        if self.failed.is_empty() {
            return Ok(self.delivered.len());
        }
        let detail = self
            .failed
            .iter()
            .map(|(user_id, err)| format!("user {}: {}", user_id, err))
            .collect::<Vec<_>>()
            .join("; ");
        Err(BrokerError::Publish(format!(
            "{} of {} recipients failed: {}",
            self.failed.len(),
            self.failed.len() + self.delivered.len(),
            detail
        )))
    }
}

/// Producer handle held in the API state
#[derive(Clone)]
pub struct Publisher {
    broker: Broker,
    names: TopicNames,
}

impl Publisher {
    pub fn new(broker: Broker, names: TopicNames) -> Self {
        Self { broker, names }
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn names(&self) -> &TopicNames {
        &self.names
    }

    /// Create the user's topic; already existing is success
    pub async fn ensure_user_topic(&self, user_id: i64) -> Result<(), BrokerError> {
        let topic = self.names.user_topic(user_id);
        self.broker.ensure_topic(&topic).await?;
        debug!("[Broker] Ensured topic {} for user {}", topic, user_id);
        Ok(())
    }

    /// Publish `envelope` once to the topic of every distinct recipient
    ///
    /// Publishes run concurrently; one failing recipient does not stop the
    /// others. Only an encoding failure aborts the whole broadcast.
    pub async fn broadcast(&self, recipients: &[i64], envelope: &Envelope) -> Result<BroadcastReport, BrokerError> {
        let payload = Bytes::from(
            envelope
                .to_bytes()
                .map_err(|e| BrokerError::Encode(e.to_string()))?,
        );
        let recipients: BTreeSet<i64> = recipients.iter().copied().collect();

        let publishes = recipients.into_iter().map(|user_id| {
            let topic = self.names.user_topic(user_id);
            let payload = payload.clone();
            async move { (user_id, self.broker.publish(&topic, payload).await) }
        });

        let mut report = BroadcastReport::default();
        for (user_id, result) in join_all(publishes).await {
            match result {
                Ok(()) => report.delivered.push(user_id),
                Err(e) => {
                    warn!("[Broker] Publish to user {} failed: {}", user_id, e);
                    report.failed.push((user_id, e));
                }
            }
        }
        Ok(report)
    }

    /// Publish to a single user
    pub async fn send_to_user(&self, user_id: i64, envelope: &Envelope) -> Result<(), BrokerError> {
        self.broadcast(&[user_id], envelope).await?.into_result().map(|_| ())
    }
}
