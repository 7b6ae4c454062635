//! # Handler capability.
//!
//! A type handles messages of type `M` by implementing [`MessageHandler<M>`].
//! `M` is either the decoded payload `V` (value handler) or the whole
//! [`MessageResult<K, V>`] (full-envelope handler).
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use consumevisor::{BoxError, MessageHandler, MessageHandlerContext, MessageResult};
//!
//! struct Order { id: u64 }
//!
//! struct OrderHandler;
//!
//! #[async_trait]
//! impl MessageHandler<Order> for OrderHandler {
//!     async fn handle(&self, order: &Order, _ctx: &MessageHandlerContext) -> Result<(), BoxError> {
//!         let _ = order.id;
//!         Ok(())
//!     }
//! }
//!
//! struct AuditHandler;
//!
//! #[async_trait]
//! impl MessageHandler<MessageResult<String, Order>> for AuditHandler {
//!     async fn handle(
//!         &self,
//!         msg: &MessageResult<String, Order>,
//!         _ctx: &MessageHandlerContext,
//!     ) -> Result<(), BoxError> {
//!         let _ = (msg.key(), msg.metadata().offset);
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::message::{MessageHandlerContext, MessageResult, Payload};

/// Handles messages of type `M`.
#[async_trait]
pub trait MessageHandler<M: Payload>: Send + Sync + 'static {
    /// Processes one message. An error aborts the cycle and reaches the supervision loop.
    async fn handle(&self, message: &M, ctx: &MessageHandlerContext) -> Result<(), BoxError>;
}

/// Whether a registration dispatches the decoded value or the full envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerMode {
    /// Handler receives only the decoded payload `V`.
    Value,
    /// Handler receives the whole `MessageResult<K, V>`.
    Envelope,
}

impl HandlerMode {
    /// Maps the "is full-envelope handler" flag to a mode.
    pub fn from_envelope_flag(is_full_envelope_handler: bool) -> Self {
        if is_full_envelope_handler {
            HandlerMode::Envelope
        } else {
            HandlerMode::Value
        }
    }

    /// Returns `true` for [`HandlerMode::Envelope`].
    pub fn is_full_envelope(self) -> bool {
        matches!(self, HandlerMode::Envelope)
    }
}

impl fmt::Display for HandlerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerMode::Value => f.write_str("value"),
            HandlerMode::Envelope => f.write_str("full-envelope"),
        }
    }
}

/// A handler instance resolved by a unit of work.
pub enum HandlerInstance<K: Payload, V: Payload> {
    /// Receives the decoded payload.
    Value(Arc<dyn MessageHandler<V>>),
    /// Receives the full envelope.
    Envelope(Arc<dyn MessageHandler<MessageResult<K, V>>>),
}

impl<K: Payload, V: Payload> HandlerInstance<K, V> {
    /// Wraps a value handler.
    pub fn value<H: MessageHandler<V>>(handler: H) -> Self {
        HandlerInstance::Value(Arc::new(handler))
    }

    /// Wraps a full-envelope handler.
    pub fn envelope<H: MessageHandler<MessageResult<K, V>>>(handler: H) -> Self {
        HandlerInstance::Envelope(Arc::new(handler))
    }

    /// The mode this instance can serve.
    pub fn mode(&self) -> HandlerMode {
        match self {
            HandlerInstance::Value(_) => HandlerMode::Value,
            HandlerInstance::Envelope(_) => HandlerMode::Envelope,
        }
    }
}

impl<K: Payload, V: Payload> Clone for HandlerInstance<K, V> {
    fn clone(&self) -> Self {
        match self {
            HandlerInstance::Value(h) => HandlerInstance::Value(Arc::clone(h)),
            HandlerInstance::Envelope(h) => HandlerInstance::Envelope(Arc::clone(h)),
        }
    }
}

impl<K: Payload, V: Payload> fmt::Debug for HandlerInstance<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerInstance::Value(_) => f.write_str("HandlerInstance::Value"),
            HandlerInstance::Envelope(_) => f.write_str("HandlerInstance::Envelope"),
        }
    }
}
