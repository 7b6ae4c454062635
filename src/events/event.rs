//! # Runtime events emitted by the host and its consumers.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Consumer lifecycle**: starting, failed, restart scheduled, stopped, stop requested
//! - **Message flow**: handled, committed (one pair per consumption cycle)
//! - **Shutdown**: requested, all stopped within grace, grace exceeded
//! - **Subscriber health**: overflow, panic
//!
//! The [`Event`] struct carries metadata such as the consumer name, the attempt
//! number, the message position, the failure reason and the chosen strategy.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use consumevisor::{Event, EventKind, FailureStrategy};
//!
//! let ev = Event::new(EventKind::ConsumerFailed)
//!     .with_consumer("billing/orders")
//!     .with_attempt(3)
//!     .with_reason("handler failed: boom")
//!     .with_strategy(FailureStrategy::RestartConsumer);
//!
//! assert_eq!(ev.kind, EventKind::ConsumerFailed);
//! assert_eq!(ev.consumer.as_deref(), Some("billing/orders"));
//! assert_eq!(ev.strategy, Some(FailureStrategy::RestartConsumer));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::message::Metadata;
use crate::policies::FailureStrategy;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `consumer`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `consumer`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Host shutdown requested (OS signal, `Supervisor::shutdown` or a consumer giving up).
    ///
    /// Sets:
    /// - `reason`: `"signal"` for an OS signal, `"requested"` otherwise
    ShutdownRequested,

    /// All consumers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some consumers did not stop in time.
    ///
    /// Sets:
    /// - `reason`: comma-separated stuck consumers
    GraceExceeded,

    // === Consumer lifecycle events ===
    /// A consumer service is (re)starting `consume_all`.
    ///
    /// Sets:
    /// - `consumer`: consumer name (`group/topic`)
    /// - `attempt`: 1 for the first run, +1 per restart
    ConsumerStarting,

    /// `consume_all` returned an error; the evaluator has decided.
    ///
    /// Sets:
    /// - `consumer`, `attempt`
    /// - `reason`: error message
    /// - `strategy`: the evaluator's answer
    ConsumerFailed,

    /// The evaluator chose to restart; a fresh source scope follows.
    ///
    /// Sets:
    /// - `consumer`
    /// - `attempt`: the attempt that failed
    RestartScheduled,

    /// The consumer service ended (cancelled or gave up).
    ///
    /// Sets:
    /// - `consumer`, `attempt`
    /// - `reason`: present when the service stopped because of a failure
    ConsumerStopped,

    /// A consumer service asked the host to shut down.
    ///
    /// Sets:
    /// - `consumer`
    /// - `reason`: the error that led to it
    StopRequested,

    // === Message flow events ===
    /// A message went through its unit of work without error.
    ///
    /// Sets:
    /// - `consumer`
    /// - `partition`, `offset`: message position
    MessageHandled,

    /// The loop committed a handled message. Only published when auto-commit is
    /// disabled and the message carried a commit action.
    ///
    /// Sets:
    /// - `consumer`
    /// - `partition`, `offset`: message position
    MessageCommitted,
}

impl EventKind {
    /// `true` for per-message events, published once per consumption cycle.
    pub fn is_message_event(self) -> bool {
        matches!(self, EventKind::MessageHandled | EventKind::MessageCommitted)
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Consumer (or subscriber) name, if applicable.
    pub consumer: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Partition of the message, for message flow events.
    pub partition: Option<i32>,
    /// Offset of the message, for message flow events.
    pub offset: Option<i64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Strategy chosen by the failure evaluator.
    pub strategy: Option<FailureStrategy>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            consumer: None,
            attempt: None,
            partition: None,
            offset: None,
            reason: None,
            strategy: None,
        }
    }

    /// Attaches a consumer name.
    #[inline]
    pub fn with_consumer(mut self, consumer: impl Into<Arc<str>>) -> Self {
        self.consumer = Some(consumer.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the position of a message.
    #[inline]
    pub fn with_position(mut self, metadata: &Metadata) -> Self {
        self.partition = Some(metadata.partition);
        self.offset = Some(metadata.offset);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the evaluator's decision.
    #[inline]
    pub fn with_strategy(mut self, strategy: FailureStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_consumer(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_consumer(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::ConsumerStarting);
        let b = Event::new(EventKind::ConsumerStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn position_is_copied_from_metadata() {
        let meta = Metadata::new("orders", 3, 42);
        let ev = Event::new(EventKind::MessageHandled).with_position(&meta);
        assert_eq!(ev.partition, Some(3));
        assert_eq!(ev.offset, Some(42));
    }

    #[test]
    fn subscriber_helpers_set_kind_and_name() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.consumer.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));

        let ev = Event::subscriber_panicked("audit", "boom".into());
        assert!(ev.is_subscriber_panic());
    }
}
