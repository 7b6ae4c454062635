use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    registry::ConsumerRegistry,
    service::{ConsumerService, Service},
    supervisor::Supervisor,
};
use crate::{
    consumer::ConsumerConfig,
    core::SupervisorConfig,
    error::ConfigError,
    events::Bus,
    message::Payload,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Supervisor`] with its consumers and subscribers.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    registry: ConsumerRegistry,
    services: Vec<Arc<dyn Service>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            bus: Bus::new(cfg.bus_capacity_clamped()),
            cfg,
            subscribers: Vec::new(),
            registry: ConsumerRegistry::new(),
            services: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (consumer lifecycle, failures, message flow)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a consumer.
    ///
    /// Fails with [`ConfigError::DuplicateConsumer`] if a consumer with the same
    /// group id and topic was already added.
    pub fn with_consumer<K: Payload, V: Payload>(
        mut self,
        config: ConsumerConfig<K, V>,
    ) -> Result<Self, ConfigError> {
        self.registry.register(config.id())?;
        tracing::debug!(consumer = %config.id(), "consumer registered");

        let service = ConsumerService::new(&config, self.bus.clone());
        self.services.push(Arc::new(service));
        Ok(self)
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Spawns the subscriber workers, so it must be called within a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let subs = Arc::new(SubscriberSet::new(self.subscribers, self.bus.clone()));
        tracing::debug!(
            consumers = self.registry.len(),
            subscribers = subs.len(),
            "supervisor built"
        );

        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.bus,
            subs,
            self.services,
            CancellationToken::new(),
        ))
    }
}
