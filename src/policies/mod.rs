//! Failure policies: what the supervision loop does after a consumer fails.
//!
//! ## Contents
//! - [`FailureStrategy`]  the decision: stop the host or restart the consumer
//! - [`FailureEvaluator`] maps a [`ConsumeError`](crate::ConsumeError) to a strategy
//! - [`DefaultEvaluator`] always stops; [`EvaluatorFn`] adapts a closure
//! - [`RestartWithBackoff`] restarts a bounded number of times with a delay
//! - [`BackoffPolicy`] / [`JitterPolicy`] delay growth and randomization
//!
//! ## Quick wiring
//! ```text
//! ConsumerConfig { evaluator: Arc<dyn FailureEvaluator>, .. }
//!      └─► core::service::ConsumerService uses:
//!           - evaluator.evaluate(&err) once per failed consume_all
//!           - Default         → HostLifetime::request_shutdown(), stop
//!           - RestartConsumer → consume_all again with a fresh source scope
//! ```
//!
//! ## Defaults
//! - [`DefaultEvaluator`] when no evaluator is configured.
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0 (constant), max=30s, jitter=None.

mod backoff;
mod evaluator;
mod jitter;
mod strategy;

pub use backoff::BackoffPolicy;
pub use evaluator::{DefaultEvaluator, EvaluatorFn, FailureEvaluator, RestartWithBackoff};
pub use jitter::JitterPolicy;
pub use strategy::FailureStrategy;
