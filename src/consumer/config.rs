//! # Consumer configuration.
//!
//! [`ConsumerConfigBuilder`] collects everything one consumer needs and
//! validates it in [`build`](ConsumerConfigBuilder::build):
//!
//! ```text
//! with_group_id("billing")           ──► "group.id"           (required)
//! with_enable_auto_commit(false)     ──► "enable.auto.commit" (default true)
//! with_configuration(k, v)           ──► raw transport map, later keys win
//! register_message_handler::<H>(t)   ──► exactly one MessageRegistration
//! with_source_factory(..)            ──► required
//! with_unit_of_work_factory(..)      ──► required
//! with_failure_evaluator(..)         ──► optional, DefaultEvaluator otherwise
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use consumevisor::{
//!     BoxError, ConsumerConfigBuilder, MemorySourceFactory, MessageHandler,
//!     MessageHandlerContext, TransientUnitOfWorkFactory,
//! };
//!
//! struct OrderHandler;
//!
//! #[async_trait]
//! impl MessageHandler<u64> for OrderHandler {
//!     async fn handle(&self, _: &u64, _: &MessageHandlerContext) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! let (_tx, source) = MemorySourceFactory::<String, u64>::channel("orders", 16);
//! let cfg = ConsumerConfigBuilder::<String, u64>::new()
//!     .with_group_id("billing")
//!     .with_enable_auto_commit(false)
//!     .register_message_handler::<OrderHandler>("orders")?
//!     .with_source_factory(Arc::new(source))
//!     .with_unit_of_work_factory(Arc::new(
//!         TransientUnitOfWorkFactory::<String, u64>::new().with_value_handler(|| OrderHandler),
//!     ))
//!     .build()?;
//!
//! assert_eq!(cfg.group_id(), "billing");
//! assert!(!cfg.enable_auto_commit());
//! # Ok::<(), consumevisor::ConfigError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::consumer::MessageRegistration;
use crate::core::ConsumerId;
use crate::error::{ConfigError, RegistrationError};
use crate::handlers::{HandlerMode, HandlerType, MessageHandler};
use crate::message::{MessageResult, Payload};
use crate::policies::{DefaultEvaluator, FailureEvaluator};
use crate::scope::{SourceScopeFactory, UnitOfWorkFactory};

/// Configuration key holding the consumer group id.
pub const GROUP_ID: &str = "group.id";
/// Configuration key holding the auto-commit flag.
pub const ENABLE_AUTO_COMMIT: &str = "enable.auto.commit";

/// Validated configuration of one consumer.
pub struct ConsumerConfig<K: Payload, V: Payload> {
    group_id: String,
    enable_auto_commit: bool,
    configuration: BTreeMap<String, String>,
    registration: Arc<MessageRegistration<K, V>>,
    source_factory: Arc<dyn SourceScopeFactory<K, V>>,
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory<K, V>>,
    evaluator: Arc<dyn FailureEvaluator>,
}

impl<K: Payload, V: Payload> ConsumerConfig<K, V> {
    /// Starts a new builder.
    pub fn builder() -> ConsumerConfigBuilder<K, V> {
        ConsumerConfigBuilder::new()
    }

    /// Consumer group id.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Subscribed topic (taken from the registration).
    pub fn topic(&self) -> &str {
        self.registration.topic()
    }

    /// `(group, topic)` identity used to reject duplicate consumers on a host.
    pub fn id(&self) -> ConsumerId {
        ConsumerId::new(&self.group_id, self.registration.topic())
    }

    /// Whether the source tracks progress itself. When `false` the loop commits.
    pub fn enable_auto_commit(&self) -> bool {
        self.enable_auto_commit
    }

    /// Raw transport configuration, including `group.id` and `enable.auto.commit`.
    pub fn configuration(&self) -> &BTreeMap<String, String> {
        &self.configuration
    }

    /// The single message registration.
    pub fn registration(&self) -> &Arc<MessageRegistration<K, V>> {
        &self.registration
    }

    pub(crate) fn source_factory(&self) -> &Arc<dyn SourceScopeFactory<K, V>> {
        &self.source_factory
    }

    pub(crate) fn unit_of_work_factory(&self) -> &Arc<dyn UnitOfWorkFactory<K, V>> {
        &self.unit_of_work_factory
    }

    pub(crate) fn evaluator(&self) -> &Arc<dyn FailureEvaluator> {
        &self.evaluator
    }
}

impl<K: Payload, V: Payload> fmt::Debug for ConsumerConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("group_id", &self.group_id)
            .field("enable_auto_commit", &self.enable_auto_commit)
            .field("configuration", &self.configuration)
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConsumerConfig`].
pub struct ConsumerConfigBuilder<K: Payload, V: Payload> {
    configuration: BTreeMap<String, String>,
    registration: Option<MessageRegistration<K, V>>,
    source_factory: Option<Arc<dyn SourceScopeFactory<K, V>>>,
    unit_of_work_factory: Option<Arc<dyn UnitOfWorkFactory<K, V>>>,
    evaluator: Option<Arc<dyn FailureEvaluator>>,
}

impl<K: Payload, V: Payload> Default for ConsumerConfigBuilder<K, V> {
    fn default() -> Self {
        Self {
            configuration: BTreeMap::new(),
            registration: None,
            source_factory: None,
            unit_of_work_factory: None,
            evaluator: None,
        }
    }
}

impl<K: Payload, V: Payload> ConsumerConfigBuilder<K, V> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the consumer group id (`group.id`).
    pub fn with_group_id(self, group_id: impl Into<String>) -> Self {
        self.with_configuration(GROUP_ID, group_id)
    }

    /// Sets a raw transport configuration entry. A later call for the same key wins.
    pub fn with_configuration(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    /// Sets `enable.auto.commit`.
    pub fn with_enable_auto_commit(self, enabled: bool) -> Self {
        self.with_configuration(ENABLE_AUTO_COMMIT, if enabled { "true" } else { "false" })
    }

    /// Sets the factory the consumer asks for a fresh source scope on every (re)start.
    pub fn with_source_factory(mut self, factory: Arc<dyn SourceScopeFactory<K, V>>) -> Self {
        self.source_factory = Some(factory);
        self
    }

    /// Sets the factory that resolves handler instances per message.
    pub fn with_unit_of_work_factory(mut self, factory: Arc<dyn UnitOfWorkFactory<K, V>>) -> Self {
        self.unit_of_work_factory = Some(factory);
        self
    }

    /// Sets the failure evaluator consulted by the supervision loop.
    pub fn with_failure_evaluator(mut self, evaluator: Arc<dyn FailureEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Adds the message registration.
    ///
    /// Fails with [`RegistrationError::MultipleRegistrationsNotSupported`] if one is
    /// already present.
    pub fn register(mut self, registration: MessageRegistration<K, V>) -> Result<Self, ConfigError> {
        if self.registration.is_some() {
            return Err(RegistrationError::MultipleRegistrationsNotSupported.into());
        }
        self.registration = Some(registration);
        Ok(self)
    }

    /// Registers value handler `H` for `topic`.
    pub fn register_message_handler<H>(self, topic: impl Into<String>) -> Result<Self, ConfigError>
    where
        H: MessageHandler<V>,
    {
        let ty = HandlerType::implementing::<H, V>();
        let registration = MessageRegistration::new(topic, ty, HandlerMode::Value)?;
        self.register(registration)
    }

    /// Registers full-envelope handler `H` for `topic`.
    pub fn register_message_result_handler<H>(
        self,
        topic: impl Into<String>,
    ) -> Result<Self, ConfigError>
    where
        H: MessageHandler<MessageResult<K, V>>,
    {
        let ty = HandlerType::implementing::<H, MessageResult<K, V>>();
        let registration = MessageRegistration::new(topic, ty, HandlerMode::Envelope)?;
        self.register(registration)
    }

    /// Validates and produces the configuration.
    pub fn build(self) -> Result<ConsumerConfig<K, V>, ConfigError> {
        let group_id = match self.configuration.get(GROUP_ID) {
            Some(v) if !v.trim().is_empty() => v.clone(),
            _ => {
                return Err(ConfigError::MissingConfiguration {
                    key: GROUP_ID.to_string(),
                });
            }
        };
        let enable_auto_commit = parse_auto_commit(self.configuration.get(ENABLE_AUTO_COMMIT))?;

        let registration = self.registration.ok_or(ConfigError::MissingRegistration)?;
        let source_factory = self.source_factory.ok_or(ConfigError::MissingSourceFactory)?;
        let unit_of_work_factory = self
            .unit_of_work_factory
            .ok_or(ConfigError::MissingUnitOfWorkFactory)?;
        let evaluator = self
            .evaluator
            .unwrap_or_else(|| Arc::new(DefaultEvaluator));

        Ok(ConsumerConfig {
            group_id,
            enable_auto_commit,
            configuration: self.configuration,
            registration: Arc::new(registration),
            source_factory,
            unit_of_work_factory,
            evaluator,
        })
    }
}

fn parse_auto_commit(raw: Option<&String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(true);
    };
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::InvalidConfiguration {
            key: ENABLE_AUTO_COMMIT.to_string(),
            value: raw.clone(),
        })
    }
}
