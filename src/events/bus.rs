//! # Event bus shared by consumers and their host.
//!
//! [`Bus`] wraps a [`tokio::sync::broadcast`] channel. Consumption cycles publish
//! per-message events, consumer services publish lifecycle events and the
//! [`Supervisor`](crate::Supervisor) publishes host events, all without waiting.
//!
//! ```text
//! Consumer (cycle)   ── publish_message(MessageHandled | MessageCommitted, name, metadata)
//! ConsumerService    ── publish_for(name, ConsumerStarting | ConsumerFailed | ...)   ──► Bus
//! Supervisor         ── publish(ShutdownRequested | AllStoppedWithin | ...)
//!
//! Bus ──► Supervisor listener ──► AliveTracker + SubscriberSet
//!     └─► any receiver from Bus::subscribe()
//! ```
//!
//! ## Rules
//! - Publishing never waits; a slow observer never delays a consumption cycle.
//! - One ring buffer of `capacity` events serves every receiver. A receiver that
//!   falls behind gets `RecvError::Lagged(n)` and loses the `n` oldest events.
//! - Events published while nobody is subscribed are dropped.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::{Event, EventKind};
use crate::message::Metadata;

/// Broadcast channel for runtime events. Clones share the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus buffering up to `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev` to every current receiver; dropped if there is none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Publishes `ev` on behalf of the consumer named `consumer` (`group/topic`).
    pub(crate) fn publish_for(&self, consumer: &Arc<str>, ev: Event) {
        self.publish(ev.with_consumer(Arc::clone(consumer)));
    }

    /// Publishes a per-message event carrying the message's partition and offset.
    pub(crate) fn publish_message(&self, kind: EventKind, consumer: &Arc<str>, metadata: &Metadata) {
        debug_assert!(kind.is_message_event());
        self.publish_for(consumer, Event::new(kind).with_position(metadata));
    }

    /// New receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of receivers currently attached.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
