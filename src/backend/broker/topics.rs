//! Topic and consumer-group naming
//!
//! ```text
//! user topic      {prefix}-[{env}-]user-{user_id}
//! consumer group  {prefix}-[{env}-]chat-service
//! ```
//!
//! The environment segment is present for `dev` and `staging` only, so
//! production names stay short and stable.

use crate::shared::config::{AppConfig, Environment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNames {
    prefix: String,
    environment: Environment,
}

impl TopicNames {
    pub fn new(prefix: impl Into<String>, environment: Environment) -> Self {
        Self {
            prefix: prefix.into(),
            environment,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.topic_prefix.clone(), config.environment)
    }

    fn scope(&self) -> String {
        if self.environment.is_scoped() {
            format!("{}-{}", self.prefix, self.environment)
        } else {
            self.prefix.clone()
        }
    }

    /// Topic carrying every envelope addressed to `user_id`
    pub fn user_topic(&self, user_id: i64) -> String {
        format!("{}-user-{}", self.scope(), user_id)
    }

    /// The single consumer group shared by all gateway instances
    pub fn consumer_group(&self) -> String {
        format!("{}-chat-service", self.scope())
    }
}
