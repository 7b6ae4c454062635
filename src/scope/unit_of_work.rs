//! # Unit of work: per-message execution boundary.
//!
//! For every message the consumption loop asks the [`UnitOfWorkFactory`] for a
//! unit of work bound to the registered handler type, then hands it a
//! [`HandlerAction`]. The unit of work resolves a handler instance, calls the
//! action with it and tears the instance down when the action completes.
//!
//! ## Ordering
//! ```text
//! run(action):
//!   setup (resolve instance, open transaction, ...)
//!   action(Some(instance)).await      ← handler runs here
//!   teardown (drop instance, close transaction, ...)
//! ```
//! The loop commits only after `run` has fully returned.
//!
//! Passing `None` to the action is reported by the loop as
//! [`ConsumeError::InvalidHandlerInstance`].
//!
//! # Example
//! ```
//! use consumevisor::{BoxConsumeFuture, HandlerAction, HandlerInstance, UnitOfWork};
//!
//! struct Logged<K: consumevisor::Payload, V: consumevisor::Payload> {
//!     handler: HandlerInstance<K, V>,
//! }
//!
//! impl<K: consumevisor::Payload, V: consumevisor::Payload> UnitOfWork<K, V> for Logged<K, V> {
//!     fn run<'a>(&'a self, action: HandlerAction<'a, K, V>) -> BoxConsumeFuture<'a> {
//!         Box::pin(async move {
//!             println!("before");
//!             let res = action(Some(self.handler.clone())).await;
//!             println!("after");
//!             res
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::error::ConsumeError;
use crate::handlers::{HandlerInstance, HandlerType};
use crate::message::Payload;

/// Boxed future produced by units of work and handler actions.
pub type BoxConsumeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ConsumeError>> + Send + 'a>>;

/// Action a unit of work runs with the resolved handler instance.
pub type HandlerAction<'a, K, V> =
    Box<dyn FnOnce(Option<HandlerInstance<K, V>>) -> BoxConsumeFuture<'a> + Send + 'a>;

/// Per-message execution scope bounding a handler instance's lifetime.
pub trait UnitOfWork<K: Payload, V: Payload>: Send + Sync {
    /// Resolves a handler instance and runs `action` with it.
    fn run<'a>(&'a self, action: HandlerAction<'a, K, V>) -> BoxConsumeFuture<'a>;
}

/// Creates units of work for handler types.
pub trait UnitOfWorkFactory<K: Payload, V: Payload>: Send + Sync + 'static {
    /// Returns a unit of work for `handler`, or `None` if it cannot be resolved.
    fn create_for(&self, handler: &HandlerType) -> Option<Box<dyn UnitOfWork<K, V>>>;
}
