//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish
//! runtime events emitted by the host, the consumer services, the consumption
//! loops and the subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `ConsumerService`, `Consumer` (per cycle),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's listener, which updates the `AliveTracker`
//!   and fans out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
