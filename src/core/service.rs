//! # ConsumerService: supervision loop around one consumer.
//!
//! Runs [`Consumer::consume_all`] and decides, through the configured
//! [`FailureEvaluator`], what happens when it fails.
//!
//! ## States
//! ```text
//!            ┌──────────────── RestartConsumer ───────────────┐
//!            ▼                                                │
//!   ──► Running ── consume_all Err ──► evaluate ──► Restarting┘
//!          │                              │
//!          │ Ok / token cancelled         └── Default ──► request_shutdown() ──► Stopped
//!          ▼
//!       Stopped (no evaluator call)
//! ```
//!
//! ## Event flow
//! ```text
//! ConsumerStarting{attempt} → [consume_all] → ConsumerStopped            (cancelled)
//!                                           → ConsumerFailed{strategy}
//!                                               ├─ RestartScheduled → ConsumerStarting{attempt+1}
//!                                               └─ StopRequested → ConsumerStopped
//! ```
//!
//! ## Rules
//! - The evaluator is called **once** per failed `consume_all`, never for a clean stop.
//!   A `Canceled` error counts as a clean stop only when the run token was cancelled.
//! - Every restart calls `consume_all` from scratch, which acquires a fresh source scope.
//!   The failed message is not retried.
//! - No restart ceiling beyond what the evaluator decides.
//! - Shutdown is requested from the host at most once per run.
//! - Cancellation observed while evaluating or before restarting stops the loop.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::consumer::ConsumerConfig;
use crate::core::{Consumer, HostLifetime};
use crate::error::ConsumeError;
use crate::events::{Bus, Event, EventKind};
use crate::message::Payload;
use crate::policies::{FailureEvaluator, FailureStrategy};

/// Observable state of a [`ConsumerService`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    /// `consume_all` is running (or about to).
    Running,
    /// The evaluator asked for a restart; a fresh `consume_all` follows.
    Restarting,
    /// The loop has exited.
    Stopped,
}

impl ServiceState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ServiceState::Running,
            1 => ServiceState::Restarting,
            _ => ServiceState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ServiceState::Running => 0,
            ServiceState::Restarting => 1,
            ServiceState::Stopped => 2,
        }
    }
}

/// Why [`ConsumerService::run`] returned.
#[derive(Debug)]
pub enum ServiceExit {
    /// The token was cancelled; the consumer stopped cleanly.
    Cancelled,
    /// The evaluator gave up on `error` and host shutdown was requested.
    ShutdownRequested {
        /// The failure that ended the service.
        error: ConsumeError,
    },
}

impl ServiceExit {
    /// Returns `true` if the service asked its host to stop.
    pub fn is_shutdown_requested(&self) -> bool {
        matches!(self, ServiceExit::ShutdownRequested { .. })
    }
}

/// Long-running service supervising one [`Consumer`].
pub struct ConsumerService<K: Payload, V: Payload> {
    consumer: Consumer<K, V>,
    evaluator: Arc<dyn FailureEvaluator>,
    bus: Bus,
    state: AtomicU8,
}

impl<K: Payload, V: Payload> ConsumerService<K, V> {
    /// Creates the service for `config`, publishing lifecycle events on `bus`.
    pub fn new(config: &ConsumerConfig<K, V>, bus: Bus) -> Self {
        Self {
            consumer: Consumer::new(config, bus.clone()),
            evaluator: Arc::clone(config.evaluator()),
            bus,
            state: AtomicU8::new(ServiceState::Running.as_u8()),
        }
    }

    /// Consumer name, `group/topic`.
    pub fn name(&self) -> &str {
        self.consumer.name()
    }

    /// The supervised consumer.
    pub fn consumer(&self) -> &Consumer<K, V> {
        &self.consumer
    }

    /// Current state.
    pub fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Runs the supervision loop until `token` is cancelled or the evaluator gives up.
    ///
    /// When the evaluator answers [`FailureStrategy::Default`], `lifetime` is asked
    /// to shut the host down and the failure is returned in
    /// [`ServiceExit::ShutdownRequested`].
    pub async fn run(&self, token: CancellationToken, lifetime: &dyn HostLifetime) -> ServiceExit {
        let span = tracing::info_span!(
            "consumer",
            group = self.consumer.id().group(),
            topic = self.consumer.id().topic(),
        );
        self.supervise(token, lifetime).instrument(span).await
    }

    async fn supervise(&self, token: CancellationToken, lifetime: &dyn HostLifetime) -> ServiceExit {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.set_state(ServiceState::Running);
            tracing::info!(attempt, "consumer starting");
            self.publish(Event::new(EventKind::ConsumerStarting).with_attempt(attempt));

            let error = match self.consumer.consume_all(&token).await {
                Ok(()) => return self.stopped(attempt),
                Err(ConsumeError::Canceled) if token.is_cancelled() => return self.stopped(attempt),
                Err(e) => e,
            };

            let strategy = tokio::select! {
                s = self.evaluator.evaluate(&error) => s,
                _ = token.cancelled() => {
                    tracing::info!(error = %error, "cancelled while evaluating failure");
                    return self.stopped(attempt);
                }
            };
            self.publish(
                Event::new(EventKind::ConsumerFailed)
                    .with_attempt(attempt)
                    .with_reason(error.to_string())
                    .with_strategy(strategy),
            );

            match strategy {
                FailureStrategy::RestartConsumer => {
                    if token.is_cancelled() {
                        return self.stopped(attempt);
                    }
                    self.set_state(ServiceState::Restarting);
                    tracing::warn!(attempt, error = %error, "consumer failed, restarting");
                    self.publish(Event::new(EventKind::RestartScheduled).with_attempt(attempt));
                }
                FailureStrategy::Default => {
                    tracing::error!(attempt, error = %error, "consumer failed, requesting host shutdown");
                    self.publish(Event::new(EventKind::StopRequested).with_reason(error.to_string()));
                    lifetime.request_shutdown();

                    self.set_state(ServiceState::Stopped);
                    self.publish(
                        Event::new(EventKind::ConsumerStopped)
                            .with_attempt(attempt)
                            .with_reason(error.to_string()),
                    );
                    return ServiceExit::ShutdownRequested { error };
                }
            }
        }
    }

    fn stopped(&self, attempt: u32) -> ServiceExit {
        self.set_state(ServiceState::Stopped);
        tracing::info!(attempt, "consumer stopped");
        self.publish(Event::new(EventKind::ConsumerStopped).with_attempt(attempt));
        ServiceExit::Cancelled
    }

    fn set_state(&self, state: ServiceState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn publish(&self, event: Event) {
        self.bus.publish_for(&self.consumer.name, event);
    }
}

impl<K: Payload, V: Payload> fmt::Debug for ConsumerService<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerService")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// Boxed future of a running service.
pub(crate) type BoxServiceFuture = Pin<Box<dyn Future<Output = ServiceExit> + Send>>;

/// Type-erased service, so one host can run consumers of different key/value types.
pub(crate) trait Service: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn start(self: Arc<Self>, token: CancellationToken, lifetime: Arc<dyn HostLifetime>) -> BoxServiceFuture;
}

impl<K: Payload, V: Payload> Service for ConsumerService<K, V> {
    fn name(&self) -> &str {
        ConsumerService::name(self)
    }

    fn start(self: Arc<Self>, token: CancellationToken, lifetime: Arc<dyn HostLifetime>) -> BoxServiceFuture {
        Box::pin(async move { self.run(token, lifetime.as_ref()).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn service(
        source: ScriptedSource,
        log: &Log,
        auto_commit: bool,
        evaluator: Arc<dyn FailureEvaluator>,
        bus: Bus,
    ) -> ConsumerService<String, u32> {
        let cfg = builder(source, OrderedUnits::new(log.clone()), auto_commit)
            .with_failure_evaluator(evaluator)
            .build()
            .unwrap();
        ConsumerService::new(&cfg, bus)
    }

    #[tokio::test]
    async fn restarts_until_evaluator_gives_up() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![
            Step::Fail("broker down"),
            Step::Fail("broker down"),
            Step::Fail("broker down"),
        ]);
        let evaluator = ScriptedEvaluator::restarts(2);
        let lifetime = CountingLifetime::default();
        let svc = service(source.clone(), &log, true, evaluator.clone(), Bus::new(64));

        let exit = svc.run(CancellationToken::new(), &lifetime).await;

        assert!(exit.is_shutdown_requested());
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(lifetime.requests.load(Ordering::SeqCst), 1);
        assert_eq!(source.created.load(Ordering::SeqCst), 3, "fresh scope per run");
        assert_eq!(source.released.load(Ordering::SeqCst), 3);
        assert_eq!(svc.state(), ServiceState::Stopped);
    }

    #[tokio::test]
    async fn default_evaluator_requests_shutdown_once() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![Step::Fail("broker down")]);
        let lifetime = CountingLifetime::default();
        let svc = service(source, &log, true, Arc::new(crate::policies::DefaultEvaluator), Bus::new(64));

        let exit = svc.run(CancellationToken::new(), &lifetime).await;

        match exit {
            ServiceExit::ShutdownRequested { error } => {
                assert!(matches!(error, ConsumeError::Fetch { .. }));
            }
            other => panic!("unexpected exit: {other:?}"),
        }
        assert_eq!(lifetime.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_without_evaluating() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Step::Message(committing(1, &log)),
            Step::Message(committing(2, &log)),
        ])
        .cancel_after(2, token.clone());
        let evaluator = ScriptedEvaluator::restarts(0);
        let lifetime = CountingLifetime::default();
        let svc = service(source, &log, true, evaluator.clone(), Bus::new(64));

        let exit = svc.run(token, &lifetime).await;

        assert!(matches!(exit, ServiceExit::Cancelled));
        assert_eq!(log.handled(), vec![1, 2]);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(lifetime.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_failure_reaches_evaluator_after_earlier_commit() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![
            Step::Message(committing(1, &log)),
            Step::Message(committing(FAIL, &log)),
        ]);
        let lifetime = CountingLifetime::default();
        let svc = service(source, &log, false, Arc::new(crate::policies::DefaultEvaluator), Bus::new(64));

        let exit = svc.run(CancellationToken::new(), &lifetime).await;

        match exit {
            ServiceExit::ShutdownRequested { error } => {
                assert!(matches!(error, ConsumeError::Handler { .. }));
            }
            other => panic!("unexpected exit: {other:?}"),
        }
        let commits = log.entries().iter().filter(|e| *e == "commit").count();
        assert_eq!(commits, 1);
        assert_eq!(log.handled(), vec![1, FAIL]);
    }

    #[tokio::test]
    async fn restart_skips_the_failed_message() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Step::Message(committing(FAIL, &log)),
            Step::Message(committing(2, &log)),
        ])
        .cancel_after(2, token.clone());
        let evaluator = ScriptedEvaluator::restarts(1);
        let lifetime = CountingLifetime::default();
        let svc = service(source.clone(), &log, true, evaluator.clone(), Bus::new(64));

        let exit = svc.run(token, &lifetime).await;

        assert!(matches!(exit, ServiceExit::Cancelled));
        assert_eq!(log.handled(), vec![FAIL, 2]);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.created.load(Ordering::SeqCst), 2);
        assert_eq!(lifetime.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stray_canceled_is_evaluated_like_any_failure() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Canceled]);
        let evaluator = ScriptedEvaluator::restarts(0);
        let lifetime = CountingLifetime::default();
        let svc = service(source, &log, true, evaluator.clone(), Bus::new(64));

        let exit = svc.run(token.clone(), &lifetime).await;

        match exit {
            ServiceExit::ShutdownRequested { error } => assert!(error.is_canceled()),
            other => panic!("unexpected exit: {other:?}"),
        }
        assert!(!token.is_cancelled());
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(lifetime.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_evaluation_stops_the_loop() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Fail("broker down")]);
        let slow = crate::policies::EvaluatorFn::arc(|_: &ConsumeError| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            FailureStrategy::RestartConsumer
        });
        let lifetime = CountingLifetime::default();
        let svc = service(source.clone(), &log, true, slow, Bus::new(64));

        let t = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            t.cancel();
        });
        let exit = svc.run(token, &lifetime).await;

        assert!(matches!(exit, ServiceExit::Cancelled));
        assert_eq!(source.created.load(Ordering::SeqCst), 1);
        assert_eq!(lifetime.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lifecycle_events_are_published_in_order() {
        let log = Log::default();
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let source = ScriptedSource::new(vec![Step::Fail("broker down"), Step::Fail("broker down")]);
        let svc = service(source, &log, true, ScriptedEvaluator::restarts(1), bus);

        svc.run(CancellationToken::new(), &CountingLifetime::default()).await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.consumer.as_deref(), Some("test-group/orders"));
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::ConsumerStarting,
                EventKind::ConsumerFailed,
                EventKind::RestartScheduled,
                EventKind::ConsumerStarting,
                EventKind::ConsumerFailed,
                EventKind::StopRequested,
                EventKind::ConsumerStopped,
            ]
        );
    }
}
