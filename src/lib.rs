//! # consumevisor
//!
//! **Consumevisor** is a transport-agnostic message consumption engine for Rust.
//!
//! It pulls messages one at a time from an ordered source, runs each message's
//! handler inside a per-message unit of work, commits the message when the
//! source expects it, and supervises every consumer with a pluggable failure
//! evaluator that either restarts the consumer on a fresh source scope or asks
//! the host to shut down. Transports plug in through two small traits:
//! [`SourceScopeFactory`] and [`UnitOfWorkFactory`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌────────────────┐ ┌────────────────┐ ┌────────────────┐
//!     │ ConsumerConfig │ │ ConsumerConfig │ │ ConsumerConfig │
//!     │ (group, topic) │ │ (group, topic) │ │ (group, topic) │
//!     └───────┬────────┘ └───────┬────────┘ └───────┬────────┘
//!             ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (host)                                                │
//! │  - ConsumerRegistry (one consumer per (group, topic))             │
//! │  - Bus (broadcast events)                                         │
//! │  - AliveTracker (running consumers, sequence-ordered)             │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!  │ConsumerService│  │ConsumerService│  │ConsumerService│  supervision loop
//!  └──────┬────────┘  └──────┬────────┘  └──────┬────────┘  (FailureEvaluator)
//!         ▼                  ▼                  ▼
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!  │   Consumer    │  │   Consumer    │  │   Consumer    │  consumption loop
//!  └──┬─────────┬──┘  └───────────────┘  └───────────────┘
//!     ▼         ▼
//! SourceScope  UnitOfWork ──► MessageHandler
//! (fetch)      (per message)
//! ```
//!
//! ### Lifecycle
//! ```text
//! ConsumerService::run(token, lifetime)
//!
//! loop {
//!   ├─► attempt += 1, publish ConsumerStarting{ attempt }
//!   ├─► consumer.consume_all(token)
//!   │     scope = factory.create_scope()              (fresh on every run)
//!   │     while !cancelled {
//!   │        msg = scope.fetch_next(token)
//!   │        uow = units.create_for(handler_type)
//!   │        uow.run(|instance| handler.handle(msg))  (setup → handle → teardown)
//!   │        if !auto_commit { msg.commit() }
//!   │     }
//!   │     scope.release()
//!   │
//!   ├─ Ok / cancelled ──► publish ConsumerStopped, exit
//!   └─ Err(e) ──► evaluator.evaluate(&e)
//!                  ├─ RestartConsumer ─► publish RestartScheduled, continue
//!                  └─ Default         ─► lifetime.request_shutdown(), exit
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                                   |
//! |-------------------|---------------------------------------------------------------------|------------------------------------------------------|
//! | **Handlers**      | Handle decoded values or full envelopes.                            | [`MessageHandler`], [`HandlerType`], [`HandlerMode`] |
//! | **Registration**  | Bind a topic, a handler type and a message type, checked up front.  | [`MessageRegistration`]                              |
//! | **Boundaries**    | Plug in a transport and a per-message execution scope.              | [`SourceScopeFactory`], [`UnitOfWorkFactory`]        |
//! | **Policies**      | Decide what happens after a failure.                                | [`FailureEvaluator`], [`RestartWithBackoff`]         |
//! | **Hosting**       | Run many consumers, stop them gracefully.                           | [`Supervisor`], [`ConsumerService`]                  |
//! | **Subscriber API**| Hook into consumer lifecycle and message events.                    | [`Subscribe`], [`Event`]                             |
//! | **Errors**        | Typed errors for configuration, consumption and hosting.            | [`ConfigError`], [`ConsumeError`], [`RuntimeError`]  |
//! | **Configuration** | Consumer and host settings.                                         | [`ConsumerConfig`], [`SupervisorConfig`]             |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use consumevisor::{
//!     BackoffPolicy, BoxError, ConsumerConfigBuilder, MemorySourceFactory, MessageHandler,
//!     MessageHandlerContext, RestartWithBackoff, Subscribe, Supervisor, SupervisorConfig,
//!     TransientUnitOfWorkFactory,
//! };
//!
//! struct OrderHandler;
//!
//! #[async_trait]
//! impl MessageHandler<u64> for OrderHandler {
//!     async fn handle(&self, amount: &u64, ctx: &MessageHandlerContext) -> Result<(), BoxError> {
//!         println!("order at offset {}: {amount}", ctx.metadata().offset);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, source) = MemorySourceFactory::<String, u64>::channel("orders", 64);
//!
//!     let orders = ConsumerConfigBuilder::<String, u64>::new()
//!         .with_group_id("billing")
//!         .register_message_handler::<OrderHandler>("orders")?
//!         .with_source_factory(Arc::new(source))
//!         .with_unit_of_work_factory(Arc::new(
//!             TransientUnitOfWorkFactory::<String, u64>::new().with_value_handler(|| OrderHandler),
//!         ))
//!         .with_failure_evaluator(Arc::new(
//!             RestartWithBackoff::new(BackoffPolicy::default()).with_max_restarts(3),
//!         ))
//!         .build()?;
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(consumevisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .with_consumer(orders)?
//!         .build();
//!
//!     tx.publish("o-1".into(), 42).await.ok();
//!
//!     let stop = sup.shutdown_handle();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         consumevisor::HostLifetime::request_shutdown(&stop);
//!     });
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```
mod consumer;
mod core;
mod error;
mod events;
mod handlers;
mod message;
mod policies;
mod scope;
mod subscribers;

// ---- Public re-exports ----

pub use consumer::{
    ConsumerConfig, ConsumerConfigBuilder, ENABLE_AUTO_COMMIT, GROUP_ID, MessageRegistration,
};
pub use self::core::{
    Consumer, ConsumerId, ConsumerService, HostLifetime, ServiceExit, ServiceState,
    ShutdownHandle, Supervisor, SupervisorBuilder, SupervisorConfig, wait_for_shutdown_signal,
};
pub use error::{BoxError, ConfigError, ConsumeError, RegistrationError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{
    HandlerInstance, HandlerMode, HandlerType, HandlerTypeBuilder, MessageHandler, MessageType,
};
pub use message::{
    Commit, CommitFn, CommitRef, Headers, MessageHandlerContext, MessageResult, Metadata, Payload,
};
pub use policies::{
    BackoffPolicy, DefaultEvaluator, EvaluatorFn, FailureEvaluator, FailureStrategy, JitterPolicy,
    RestartWithBackoff,
};
pub use scope::{
    BoxConsumeFuture, HandlerAction, MemorySender, MemorySourceFactory, SourceScope,
    SourceScopeFactory, TransientUnitOfWorkFactory, UnitOfWork, UnitOfWorkFactory,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the built-in logger subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
