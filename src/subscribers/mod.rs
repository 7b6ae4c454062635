//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for observing the runtime; the
//! [`SubscriberSet`] gives every subscriber its own bounded queue and worker.
//!
//! ## Architecture
//! ```text
//! ConsumerService / Consumer ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                              │
//!                                                              ├──► AliveTracker (host-internal)
//!                                                              └──► SubscriberSet::emit
//!                                                                        │
//!                                                            ┌───────────┼───────────┐
//!                                                            ▼           ▼           ▼
//!                                                        LogWriter    Metrics     Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use consumevisor::{Event, EventKind, Subscribe};
//!
//! struct Lag;
//!
//! #[async_trait]
//! impl Subscribe for Lag {
//!     async fn on_event(&self, ev: &Event) {
//!         if let (EventKind::MessageCommitted, Some(offset)) = (ev.kind, ev.offset) {
//!             // export committed offset
//!             let _ = offset;
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "lag"
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
