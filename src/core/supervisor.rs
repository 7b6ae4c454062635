//! # Supervisor: hosts consumer services, event delivery, and graceful shutdown.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`], the
//! [`AliveTracker`] and the runtime cancellation token. It runs one
//! [`ConsumerService`](crate::ConsumerService) per configured consumer and
//! stops them all when shutdown is requested.
//!
//! ## Key responsibilities
//! - subscribe to the [`Bus`] and **fan-out** events via [`SubscriberSet`]
//! - spawn one consumer service per [`ConsumerConfig`](crate::ConsumerConfig), each with a child token
//! - handle OS termination signals (SIGINT/SIGTERM/SIGQUIT, Ctrl-C elsewhere)
//! - perform graceful shutdown with a configurable [`SupervisorConfig::grace`]
//!
//! ## High-level architecture
//! ```text
//! SupervisorBuilder::with_consumer(cfg) ──► ConsumerRegistry (group, topic) unique
//!                                      └──► ConsumerService::new(cfg, bus)
//!
//! Supervisor::run():
//!   subscriber_listener(): Bus.subscribe() ─► AliveTracker::update + SubscriberSet::emit
//!
//!   ConsumerService[0]  ConsumerService[1]  ...  ConsumerService[N-1]
//!          │                   │                         │
//!          └──► set.spawn(service.start(runtime_token.child_token(), ShutdownHandle))
//!
//! Shutdown path (first of):
//!   os signal                      ─┐
//!   Supervisor::shutdown()          ├─► Bus.publish(ShutdownRequested)
//!   service gave up (request)      ─┘   runtime_token.cancel() → child tokens
//!                                       wait_all_with_grace(cfg.grace):
//!                                         ├─ Ok (all joined) → Bus.publish(AllStoppedWithin)
//!                                         └─ Timeout         → Bus.publish(GraceExceeded)
//!                                                              (AliveTracker.snapshot() for stuck consumers)
//!   all services exited on their own ──► Ok(())
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use consumevisor::{
//!     BoxError, ConsumerConfigBuilder, MemorySourceFactory, MessageHandler,
//!     MessageHandlerContext, Supervisor, SupervisorConfig, TransientUnitOfWorkFactory,
//! };
//!
//! struct OrderHandler;
//!
//! #[async_trait]
//! impl MessageHandler<u64> for OrderHandler {
//!     async fn handle(&self, order: &u64, _: &MessageHandlerContext) -> Result<(), BoxError> {
//!         println!("order {order}");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, source) = MemorySourceFactory::<String, u64>::channel("orders", 64);
//!     let orders = ConsumerConfigBuilder::<String, u64>::new()
//!         .with_group_id("billing")
//!         .register_message_handler::<OrderHandler>("orders")?
//!         .with_source_factory(Arc::new(source))
//!         .with_unit_of_work_factory(Arc::new(
//!             TransientUnitOfWorkFactory::<String, u64>::new().with_value_handler(|| OrderHandler),
//!         ))
//!         .build()?;
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_consumer(orders)?
//!         .build();
//!
//!     tx.publish("o-1".into(), 42).await.ok();
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::{
    sync::{Mutex, broadcast::error::RecvError},
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::core::{
    AliveTracker, HostLifetime, ShutdownHandle, SupervisorBuilder, SupervisorConfig,
    service::{Service, ServiceExit},
    shutdown,
};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;

/// Hosts consumer services, event delivery (via [`SubscriberSet`]) and graceful shutdown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    alive: Arc<AliveTracker>,
    names: Vec<String>,
    services: Mutex<Vec<Arc<dyn Service>>>,
    runtime_token: CancellationToken,
    started: AtomicBool,
}

impl Supervisor {
    /// Starts building a supervisor with `cfg`.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        services: Vec<Arc<dyn Service>>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            alive: Arc::new(AliveTracker::new()),
            names: services.iter().map(|s| s.name().to_string()).collect(),
            services: Mutex::new(services),
            runtime_token,
            started: AtomicBool::new(false),
        }
    }

    /// Names (`group/topic`) of the configured consumers, in registration order.
    pub fn consumers(&self) -> &[String] {
        &self.names
    }

    /// The event bus; receivers see every event published after they subscribe.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Sorted names of consumers currently running.
    pub async fn running(&self) -> Vec<String> {
        self.alive.snapshot().await
    }

    /// Handle that stops this supervisor, for use outside of it.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.runtime_token.clone())
    }

    /// Requests an orderly shutdown; [`run`](Self::run) cancels every consumer
    /// and waits for them up to the grace period.
    pub fn shutdown(&self) {
        self.runtime_token.cancel();
    }

    /// Runs every configured consumer until either:
    /// - all of them exit on their own, or
    /// - shutdown is requested (OS signal, [`shutdown`](Self::shutdown), or a consumer
    ///   whose evaluator gave up) → graceful shutdown, which may end with
    ///   [`RuntimeError::GraceExceeded`].
    ///
    /// Consumers and the event listener are started by the first call only. Any
    /// later call starts nothing and returns once shutdown is requested; the
    /// first call alone reports the outcome of the shutdown.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::debug!("supervisor already running, waiting for shutdown");
            self.runtime_token.cancelled().await;
            return Ok(());
        }
        self.subscriber_listener();

        let services = std::mem::take(&mut *self.services.lock().await);
        let mut set = JoinSet::new();
        self.spawn_services(&mut set, services);
        self.drive_shutdown(&mut set).await
    }

    /// Subscribes to the bus and forwards events to the alive tracker and subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let alive = Arc::clone(&self.alive);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        alive.update(&ev).await;
                        set.emit(&ev);
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    fn spawn_services(&self, set: &mut JoinSet<ServiceExit>, services: Vec<Arc<dyn Service>>) {
        let lifetime: Arc<dyn HostLifetime> = Arc::new(self.shutdown_handle());
        for service in services {
            tracing::debug!(consumer = service.name(), "spawning consumer service");
            let child = self.runtime_token.child_token();
            set.spawn(service.start(child, Arc::clone(&lifetime)));
        }
    }

    /// Waits until either all services finish or shutdown is requested.
    async fn drive_shutdown(&self, set: &mut JoinSet<ServiceExit>) -> Result<(), RuntimeError> {
        let reason = tokio::select! {
            biased;
            _ = self.runtime_token.cancelled() => "requested",
            _ = shutdown::os_signal() => "signal",
            _ = drain(set) => return Ok(()),
        };

        tracing::info!(reason, "shutdown requested");
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
        self.runtime_token.cancel();
        self.wait_all_with_grace(set).await
    }

    /// Waits for all services to finish within the configured grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout and returns
    /// [`RuntimeError::GraceExceeded`] with the list of stuck consumers.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<ServiceExit>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;

        match tokio::time::timeout(grace, drain(set)).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.alive.snapshot().await;
                tracing::error!(?grace, ?stuck, "consumers did not stop within grace");
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

async fn drain(set: &mut JoinSet<ServiceExit>) {
    while let Some(res) = set.join_next().await {
        log_join(res);
    }
}

fn log_join(res: Result<ServiceExit, JoinError>) {
    match res {
        Ok(ServiceExit::Cancelled) => {}
        Ok(ServiceExit::ShutdownRequested { error }) => {
            tracing::debug!(error = %error, "consumer service requested shutdown");
        }
        Err(e) if e.is_panic() => tracing::error!(error = %e, "consumer service panicked"),
        Err(_) => {}
    }
}
