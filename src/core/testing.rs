//! Test doubles shared by the core unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::consumer::{ConsumerConfig, ConsumerConfigBuilder};
use crate::core::HostLifetime;
use crate::error::{BoxError, ConsumeError};
use crate::handlers::{HandlerInstance, HandlerType, MessageHandler};
use crate::message::{CommitFn, MessageHandlerContext, MessageResult, Metadata};
use crate::policies::{FailureEvaluator, FailureStrategy};
use crate::scope::{
    BoxConsumeFuture, HandlerAction, SourceScope, SourceScopeFactory, UnitOfWork,
    UnitOfWorkFactory,
};

/// Value the [`Recorder`] handler fails on.
pub(crate) const FAIL: u32 = 999;

/// Shared, ordered record of what happened during a test.
#[derive(Clone, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Values seen by the handler, in order.
    pub(crate) fn handled(&self) -> Vec<u32> {
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix("handle "))
            .filter_map(|v| v.parse().ok())
            .collect()
    }
}

/// Builds a message whose commit action appends `"commit"` to `log`.
pub(crate) fn committing(value: u32, log: &Log) -> MessageResult<String, u32> {
    let log = log.clone();
    MessageResult::new(
        format!("key-{value}"),
        value,
        Metadata::new("orders", 0, i64::from(value)),
    )
    .with_commit(CommitFn::new(move || {
        let log = log.clone();
        async move {
            log.push("commit");
            Ok::<_, BoxError>(())
        }
    }))
}

pub(crate) enum Step {
    Message(MessageResult<String, u32>),
    Fail(&'static str),
    /// `Canceled` without the consumer's token being cancelled.
    Canceled,
}

/// Scripted source. Scopes share one queue of steps; once it is empty a fetch
/// waits for cancellation.
#[derive(Clone)]
pub(crate) struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    fetches: Arc<AtomicUsize>,
    cancel_after: Option<(usize, CancellationToken)>,
    pub(crate) created: Arc<AtomicUsize>,
    pub(crate) released: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            fetches: Arc::new(AtomicUsize::new(0)),
            cancel_after: None,
            created: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cancels `token` while serving the `n`-th fetch.
    pub(crate) fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }
}

impl SourceScopeFactory<String, u32> for ScriptedSource {
    fn create_scope(&self) -> Result<Box<dyn SourceScope<String, u32>>, ConsumeError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedScope {
            source: self.clone(),
            released: false,
        }))
    }
}

struct ScriptedScope {
    source: ScriptedSource,
    released: bool,
}

#[async_trait]
impl SourceScope<String, u32> for ScriptedScope {
    async fn fetch_next(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<MessageResult<String, u32>, ConsumeError> {
        let n = self.source.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.source.cancel_after {
            if n == *after {
                token.cancel();
            }
        }
        let step = self.source.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Message(msg)) => Ok(msg),
            Some(Step::Fail(reason)) => Err(ConsumeError::fetch(reason)),
            Some(Step::Canceled) => Err(ConsumeError::Canceled),
            None => {
                cancel.cancelled().await;
                Err(ConsumeError::Canceled)
            }
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Value handler appending `"handle {v}"`; fails on [`FAIL`].
pub(crate) struct Recorder(pub(crate) Log);

#[async_trait]
impl MessageHandler<u32> for Recorder {
    async fn handle(&self, value: &u32, _: &MessageHandlerContext) -> Result<(), BoxError> {
        self.0.push(format!("handle {value}"));
        if *value == FAIL {
            return Err("boom".into());
        }
        Ok(())
    }
}

/// Unit-of-work factory bracketing every handler call with `"before"` / `"after"`.
pub(crate) struct OrderedUnits {
    log: Log,
}

impl OrderedUnits {
    pub(crate) fn new(log: Log) -> Self {
        Self { log }
    }
}

impl UnitOfWorkFactory<String, u32> for OrderedUnits {
    fn create_for(&self, _: &HandlerType) -> Option<Box<dyn UnitOfWork<String, u32>>> {
        Some(Box::new(OrderedUnit {
            log: self.log.clone(),
        }))
    }
}

struct OrderedUnit {
    log: Log,
}

impl UnitOfWork<String, u32> for OrderedUnit {
    fn run<'a>(&'a self, action: HandlerAction<'a, String, u32>) -> BoxConsumeFuture<'a> {
        Box::pin(async move {
            self.log.push("before");
            let res = action(Some(HandlerInstance::value(Recorder(self.log.clone())))).await;
            self.log.push("after");
            res
        })
    }
}

/// Consumer `test-group/orders` with a [`Recorder`] value handler.
pub(crate) fn config<S, U>(source: S, units: U, auto_commit: bool) -> ConsumerConfig<String, u32>
where
    S: SourceScopeFactory<String, u32>,
    U: UnitOfWorkFactory<String, u32>,
{
    builder(source, units, auto_commit).build().unwrap()
}

/// Same as [`config`], left open for further settings.
pub(crate) fn builder<S, U>(source: S, units: U, auto_commit: bool) -> ConsumerConfigBuilder<String, u32>
where
    S: SourceScopeFactory<String, u32>,
    U: UnitOfWorkFactory<String, u32>,
{
    ConsumerConfigBuilder::<String, u32>::new()
        .with_group_id("test-group")
        .with_enable_auto_commit(auto_commit)
        .register_message_handler::<Recorder>("orders")
        .unwrap()
        .with_source_factory(Arc::new(source))
        .with_unit_of_work_factory(Arc::new(units))
}

/// Evaluator answering from a script, then [`FailureStrategy::Default`].
pub(crate) struct ScriptedEvaluator {
    answers: Mutex<VecDeque<FailureStrategy>>,
    pub(crate) calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub(crate) fn restarts(n: usize) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(std::iter::repeat_n(FailureStrategy::RestartConsumer, n).collect()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FailureEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, _: &ConsumeError) -> FailureStrategy {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FailureStrategy::Default)
    }
}

/// Counts shutdown requests.
#[derive(Default)]
pub(crate) struct CountingLifetime {
    pub(crate) requests: AtomicUsize,
}

impl HostLifetime for CountingLifetime {
    fn request_shutdown(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
