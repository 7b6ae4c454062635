//! # Consumer identity registry.
//!
//! A host runs at most one consumer per `(group, topic)` pair. The builder
//! records every configured consumer here and rejects duplicates before any
//! loop starts; nothing touches the registry at runtime.

use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;

/// Identity of a consumer on one host: group id plus topic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId {
    group: String,
    topic: String,
}

impl ConsumerId {
    /// Creates an identity.
    pub fn new(group: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            topic: topic.into(),
        }
    }

    /// Consumer group id.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.topic)
    }
}

/// Set of consumer identities configured on a host.
#[derive(Debug, Default)]
pub(crate) struct ConsumerRegistry {
    ids: HashSet<ConsumerId>,
}

impl ConsumerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records `id`, failing if it is already present.
    pub(crate) fn register(&mut self, id: ConsumerId) -> Result<(), ConfigError> {
        if self.ids.contains(&id) {
            return Err(ConfigError::DuplicateConsumer {
                group: id.group,
                topic: id.topic,
            });
        }
        self.ids.insert(id);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}
