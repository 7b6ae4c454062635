//! # Consumer: the consumption loop.
//!
//! A [`Consumer`] owns no transport state. Every call to
//! [`consume_single`](Consumer::consume_single) or [`consume_all`](Consumer::consume_all)
//! acquires a **fresh** source scope from the factory and releases it on every
//! exit path (success, error, or the future being dropped).
//!
//! ## Loop
//! ```text
//! consume_all(token):
//!   scope = factory.create_scope()?            (exactly once per call)
//!   while !token.is_cancelled() {
//!       run_cycle(scope)  ── Ok        ──► next
//!                         ── Canceled  ──► break, Ok(())   (token cancelled)
//!                         ── Err(e)    ──► return Err(e)   (includes a Canceled
//!                                                           the token did not cause)
//!   }
//!   scope.release()                            (exactly once per call)
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::consumer::{ConsumerConfig, MessageRegistration};
use crate::core::{ConsumerId, runner::run_cycle};
use crate::error::ConsumeError;
use crate::events::Bus;
use crate::message::Payload;
use crate::scope::{ScopeGuard, SourceScopeFactory, UnitOfWorkFactory};

/// Pulls messages one at a time and dispatches them to the registered handler.
pub struct Consumer<K: Payload, V: Payload> {
    pub(crate) id: ConsumerId,
    pub(crate) name: Arc<str>,
    pub(crate) registration: Arc<MessageRegistration<K, V>>,
    pub(crate) scopes: Arc<dyn SourceScopeFactory<K, V>>,
    pub(crate) units: Arc<dyn UnitOfWorkFactory<K, V>>,
    pub(crate) auto_commit: bool,
    pub(crate) bus: Bus,
}

impl<K: Payload, V: Payload> Consumer<K, V> {
    /// Creates a consumer for `config`, publishing message events on `bus`.
    pub fn new(config: &ConsumerConfig<K, V>, bus: Bus) -> Self {
        let id = config.id();
        Self {
            name: Arc::from(id.to_string()),
            id,
            registration: Arc::clone(config.registration()),
            scopes: Arc::clone(config.source_factory()),
            units: Arc::clone(config.unit_of_work_factory()),
            auto_commit: config.enable_auto_commit(),
            bus,
        }
    }

    /// `(group, topic)` identity.
    pub fn id(&self) -> &ConsumerId {
        &self.id
    }

    /// Display name, `group/topic`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquires a scope, runs exactly one cycle and releases the scope.
    ///
    /// A cancelled fetch is returned as [`ConsumeError::Canceled`].
    pub async fn consume_single(&self, token: &CancellationToken) -> Result<(), ConsumeError> {
        let mut scope = self.open_scope()?;
        run_cycle(self, &mut *scope, token).await
    }

    /// Acquires a scope and runs cycles until `token` is cancelled.
    ///
    /// Returns `Ok(())` on cancellation of `token` (checked before each cycle, or
    /// observed by the fetch) and the first cycle error otherwise. A
    /// [`ConsumeError::Canceled`] raised while `token` is still live is an error.
    pub async fn consume_all(&self, token: &CancellationToken) -> Result<(), ConsumeError> {
        let mut scope = self.open_scope()?;
        while !token.is_cancelled() {
            match run_cycle(self, &mut *scope, token).await {
                Ok(()) => {}
                Err(ConsumeError::Canceled) if token.is_cancelled() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn open_scope(&self) -> Result<ScopeGuard<K, V>, ConsumeError> {
        let scope = self.scopes.create_scope()?;
        tracing::debug!("source scope acquired");
        Ok(ScopeGuard::new(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::*;
    use crate::handlers::{HandlerInstance, HandlerType};
    use crate::message::{MessageResult, Metadata};
    use crate::scope::{BoxConsumeFuture, HandlerAction, UnitOfWork};
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    #[tokio::test]
    async fn unit_of_work_wraps_handler_and_commit_comes_last() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![Step::Message(committing(1, &log))]);
        let cfg = config(source.clone(), OrderedUnits::new(log.clone()), false);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        consumer.consume_single(&CancellationToken::new()).await.unwrap();

        assert_eq!(log.entries(), vec!["before", "handle 1", "after", "commit"]);
        assert_eq!(source.created.load(Ordering::SeqCst), 1);
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auto_commit_never_commits() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Step::Message(committing(1, &log)),
            Step::Message(committing(2, &log)),
            Step::Message(committing(3, &log)),
            Step::Message(committing(4, &log)),
        ])
        .cancel_after(4, token.clone());
        let cfg = config(source, OrderedUnits::new(log.clone()), true);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        consumer.consume_single(&CancellationToken::new()).await.unwrap();
        consumer.consume_all(&token).await.unwrap();

        assert_eq!(log.handled(), vec![1, 2, 3, 4]);
        assert!(!log.entries().contains(&"commit".to_string()));
    }

    #[tokio::test]
    async fn unresolved_unit_of_work_fails_and_releases_scope() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![Step::Message(committing(1, &log))]);
        let cfg = config(source.clone(), NoUnits, false);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        let err = consumer
            .consume_single(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConsumeError::UnresolvedUnitOfWork { .. }));
        assert!(log.entries().is_empty());
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_instance_is_invalid() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![Step::Message(committing(1, &log))]);
        let cfg = config(source, FixedUnits(None), false);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        let err = consumer
            .consume_single(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConsumeError::InvalidHandlerInstance { .. }));
        assert!(log.entries().is_empty(), "nothing may be committed");
    }

    #[tokio::test]
    async fn wrong_shaped_instance_is_invalid() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![Step::Message(committing(1, &log))]);
        let envelope = HandlerInstance::envelope(EnvelopeRecorder(log.clone()));
        let cfg = config(source, FixedUnits(Some(envelope)), false);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        let err = consumer
            .consume_single(&CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ConsumeError::InvalidHandlerInstance { reason, .. } => {
                assert!(reason.contains("full-envelope"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_error_skips_commit() {
        let log = Log::default();
        let source = ScriptedSource::new(vec![Step::Message(committing(FAIL, &log))]);
        let cfg = config(source.clone(), OrderedUnits::new(log.clone()), false);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        let err = consumer
            .consume_all(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConsumeError::Handler { .. }));
        assert!(!log.entries().contains(&"commit".to_string()));
        assert_eq!(source.created.load(Ordering::SeqCst), 1);
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn consume_all_stops_on_cancel_after_second_fetch() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Step::Message(committing(1, &log)),
            Step::Message(committing(2, &log)),
            Step::Message(committing(3, &log)),
        ])
        .cancel_after(2, token.clone());
        let cfg = config(source.clone(), OrderedUnits::new(log.clone()), true);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        consumer.consume_all(&token).await.unwrap();

        assert_eq!(log.handled(), vec![1, 2]);
        assert_eq!(source.created.load(Ordering::SeqCst), 1);
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn canceled_fetch_ends_consume_all_cleanly() {
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![]);
        let cfg = config(source.clone(), OrderedUnits::new(Log::default()), true);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        let t = token.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            t.cancel();
        });

        consumer.consume_all(&token).await.unwrap();
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn canceled_with_live_token_is_an_error() {
        let log = Log::default();
        let token = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Step::Message(committing(1, &log)),
            Step::Canceled,
            Step::Message(committing(2, &log)),
        ]);
        let cfg = config(source.clone(), OrderedUnits::new(log.clone()), true);
        let consumer = Consumer::new(&cfg, Bus::new(16));

        let err = consumer.consume_all(&token).await.unwrap_err();

        assert!(err.is_canceled());
        assert!(!token.is_cancelled());
        assert_eq!(log.handled(), vec![1]);
        assert_eq!(source.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn message_events_are_published() {
        let log = Log::default();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let source = ScriptedSource::new(vec![Step::Message(committing(7, &log))]);
        let cfg = config(source, OrderedUnits::new(log), false);
        let consumer = Consumer::new(&cfg, bus);

        consumer.consume_single(&CancellationToken::new()).await.unwrap();

        let handled = rx.recv().await.unwrap();
        assert_eq!(handled.kind, crate::events::EventKind::MessageHandled);
        assert_eq!(handled.offset, Some(7));
        assert_eq!(handled.consumer.as_deref(), Some("test-group/orders"));
        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.kind, crate::events::EventKind::MessageCommitted);
    }

    #[tokio::test]
    async fn message_without_commit_action_is_not_reported_committed() {
        let log = Log::default();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let bare = MessageResult::new("key-5".to_string(), 5, Metadata::new("orders", 0, 5));
        let source = ScriptedSource::new(vec![Step::Message(bare)]);
        let cfg = config(source, OrderedUnits::new(log.clone()), false);
        let consumer = Consumer::new(&cfg, bus);

        consumer.consume_single(&CancellationToken::new()).await.unwrap();

        assert_eq!(log.handled(), vec![5]);
        let handled = rx.recv().await.unwrap();
        assert_eq!(handled.kind, crate::events::EventKind::MessageHandled);
        assert!(rx.try_recv().is_err(), "no MessageCommitted expected");
    }

    struct NoUnits;

    impl crate::scope::UnitOfWorkFactory<String, u32> for NoUnits {
        fn create_for(&self, _: &HandlerType) -> Option<Box<dyn UnitOfWork<String, u32>>> {
            None
        }
    }

    struct FixedUnits(Option<HandlerInstance<String, u32>>);

    impl crate::scope::UnitOfWorkFactory<String, u32> for FixedUnits {
        fn create_for(&self, _: &HandlerType) -> Option<Box<dyn UnitOfWork<String, u32>>> {
            Some(Box::new(FixedUnit(Mutex::new(self.0.clone()))))
        }
    }

    struct FixedUnit(Mutex<Option<HandlerInstance<String, u32>>>);

    impl UnitOfWork<String, u32> for FixedUnit {
        fn run<'a>(&'a self, action: HandlerAction<'a, String, u32>) -> BoxConsumeFuture<'a> {
            let instance = self.0.lock().unwrap().take();
            action(instance)
        }
    }

    struct EnvelopeRecorder(Log);

    #[async_trait::async_trait]
    impl crate::handlers::MessageHandler<MessageResult<String, u32>> for EnvelopeRecorder {
        async fn handle(
            &self,
            msg: &MessageResult<String, u32>,
            _: &crate::message::MessageHandlerContext,
        ) -> Result<(), crate::error::BoxError> {
            self.0.push(format!("envelope {}", msg.value()));
            Ok(())
        }
    }

    #[test]
    fn name_is_group_and_topic() {
        let source = ScriptedSource::new(vec![]);
        let cfg = config(source, NoUnits, true);
        let consumer = Consumer::new(&cfg, Bus::new(1));
        assert_eq!(consumer.name(), "test-group/orders");
        assert_eq!(consumer.id().topic(), "orders");
    }
}
