//! # Failure evaluators.
//!
//! A [`FailureEvaluator`] is consulted by the supervision loop **once** per
//! failed `consume_all` call (never for a clean cancellation). Its answer is final
//! for that failure: there is no implicit restart ceiling on top of it.
//!
//! - [`DefaultEvaluator`] always answers [`FailureStrategy::Default`].
//! - [`EvaluatorFn`] wraps a closure `F: Fn(&ConsumeError) -> Fut`.
//! - [`RestartWithBackoff`] restarts up to a limit, sleeping per [`BackoffPolicy`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use consumevisor::{ConsumeError, EvaluatorFn, FailureEvaluator, FailureStrategy};
//!
//! // Restart three times, then give up.
//! let left = Arc::new(AtomicU32::new(3));
//! let eval = EvaluatorFn::arc(move |_err: &ConsumeError| {
//!     let left = left.clone();
//!     async move {
//!         match left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
//!             Ok(_) => FailureStrategy::RestartConsumer,
//!             Err(_) => FailureStrategy::Default,
//!         }
//!     }
//! });
//! # let _: Arc<dyn FailureEvaluator> = eval;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ConsumeError;
use crate::policies::{BackoffPolicy, FailureStrategy};

/// Decides what happens after a consumer failed.
#[async_trait]
pub trait FailureEvaluator: Send + Sync + 'static {
    /// Returns the strategy for `error`.
    ///
    /// May suspend (e.g. to delay a restart); the host cancels by dropping the future.
    async fn evaluate(&self, error: &ConsumeError) -> FailureStrategy;
}

/// Evaluator that always stops the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEvaluator;

#[async_trait]
impl FailureEvaluator for DefaultEvaluator {
    async fn evaluate(&self, _error: &ConsumeError) -> FailureStrategy {
        FailureStrategy::Default
    }
}

/// Function-backed evaluator.
///
/// The closure receives the error by reference and must return an owned future,
/// so anything it needs from the error has to be extracted up front.
pub struct EvaluatorFn<F> {
    f: F,
}

impl<F, Fut> EvaluatorFn<F>
where
    F: Fn(&ConsumeError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FailureStrategy> + Send + 'static,
{
    /// Creates a new function-backed evaluator.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the evaluator and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> FailureEvaluator for EvaluatorFn<F>
where
    F: Fn(&ConsumeError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FailureStrategy> + Send + 'static,
{
    async fn evaluate(&self, error: &ConsumeError) -> FailureStrategy {
        (self.f)(error).await
    }
}

/// Restarts the consumer after a backoff delay, up to `max_restarts` times.
///
/// ### Rules
/// - Non-retryable errors ([`ConsumeError::is_retryable`]) answer `Default` immediately.
/// - Restart `n` (0-based) sleeps `backoff.next(n)` before answering `RestartConsumer`.
/// - Once `max_restarts` restarts were granted every further failure answers `Default`.
/// - The counter lives in the evaluator; share one instance per consumer.
#[derive(Debug)]
pub struct RestartWithBackoff {
    backoff: BackoffPolicy,
    max_restarts: Option<u32>,
    restarts: AtomicU32,
}

impl RestartWithBackoff {
    /// Unbounded restarts delayed by `backoff`.
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            backoff,
            max_restarts: None,
            restarts: AtomicU32::new(0),
        }
    }

    /// Caps the number of granted restarts.
    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = Some(max);
        self
    }

    /// Number of restarts granted so far.
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::Relaxed)
    }

    fn grant(&self) -> Option<u32> {
        self.restarts
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| match self.max_restarts {
                Some(max) if n >= max => None,
                _ => Some(n.saturating_add(1)),
            })
            .ok()
    }
}

impl Default for RestartWithBackoff {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}

#[async_trait]
impl FailureEvaluator for RestartWithBackoff {
    async fn evaluate(&self, error: &ConsumeError) -> FailureStrategy {
        if !error.is_retryable() {
            return FailureStrategy::Default;
        }
        let Some(attempt) = self.grant() else {
            return FailureStrategy::Default;
        };

        let delay = self.backoff.next(attempt);
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        FailureStrategy::RestartConsumer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::JitterPolicy;
    use std::sync::atomic::AtomicUsize;

    fn no_delay() -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    #[tokio::test]
    async fn default_evaluator_always_stops() {
        let eval = DefaultEvaluator;
        for err in [ConsumeError::handler("boom"), ConsumeError::fetch("gone")] {
            assert_eq!(eval.evaluate(&err).await, FailureStrategy::Default);
        }
    }

    #[tokio::test]
    async fn closure_evaluator_sees_each_error() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let eval = EvaluatorFn::new(move |err: &ConsumeError| {
            s.fetch_add(1, Ordering::SeqCst);
            let retry = err.is_retryable();
            async move {
                if retry {
                    FailureStrategy::RestartConsumer
                } else {
                    FailureStrategy::Default
                }
            }
        });

        assert_eq!(
            eval.evaluate(&ConsumeError::handler("x")).await,
            FailureStrategy::RestartConsumer
        );
        assert_eq!(
            eval.evaluate(&ConsumeError::UnresolvedUnitOfWork { handler: "H" }).await,
            FailureStrategy::Default
        );
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn restart_with_backoff_stops_after_limit() {
        let eval = RestartWithBackoff::new(no_delay()).with_max_restarts(2);
        let err = ConsumeError::handler("boom");

        assert_eq!(eval.evaluate(&err).await, FailureStrategy::RestartConsumer);
        assert_eq!(eval.evaluate(&err).await, FailureStrategy::RestartConsumer);
        assert_eq!(eval.evaluate(&err).await, FailureStrategy::Default);
        assert_eq!(eval.evaluate(&err).await, FailureStrategy::Default);
        assert_eq!(eval.restarts(), 2);
    }

    #[tokio::test]
    async fn restart_with_backoff_rejects_resolution_errors() {
        let eval = RestartWithBackoff::new(no_delay());
        let err = ConsumeError::InvalidHandlerInstance {
            handler: "H",
            reason: "absent".into(),
        };
        assert_eq!(eval.evaluate(&err).await, FailureStrategy::Default);
        assert_eq!(eval.restarts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_with_backoff_sleeps_before_answering() {
        let eval = RestartWithBackoff::new(BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
        });
        let err = ConsumeError::fetch("gone");

        let start = tokio::time::Instant::now();
        eval.evaluate(&err).await;
        assert!(start.elapsed() >= Duration::from_millis(100));

        let start = tokio::time::Instant::now();
        eval.evaluate(&err).await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
