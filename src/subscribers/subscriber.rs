//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers into the runtime.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - Message events (`MessageHandled`, `MessageCommitted`) arrive once per
//!   consumed message. Subscribers that only follow consumer lifecycles should
//!   filter them out through [`Subscribe::wants`] to keep their queue short.
//! - A slow subscriber only fills its own queue; consumers never wait on it.
//! - On overflow the event is dropped **for this subscriber only** and
//!   `EventKind::SubscriberOverflow` is published.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use consumevisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::ConsumerFailed) {
//!             // bump a counter labelled with ev.consumer
//!         }
//!     }
//!
//!     fn wants(&self, ev: &Event) -> bool { !ev.kind.is_message_event() }
//!     fn name(&self) -> &'static str { "failures" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of runtime events (logging, metrics, alerting).
///
/// Use async I/O and handle errors internally; a panic is caught and reported,
/// but the event that caused it is lost for this subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, from the subscriber's own worker task.
    async fn on_event(&self, event: &Event);

    /// Whether `event` should be queued for this subscriber. Default: every event.
    fn wants(&self, event: &Event) -> bool {
        let _ = event;
        true
    }

    /// Name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
