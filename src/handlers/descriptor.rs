//! # Type descriptors for registration-time validation.
//!
//! [`MessageType`] identifies a payload type; [`HandlerType`] identifies a handler
//! type together with the message types it is known to handle.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use consumevisor::{BoxError, HandlerType, MessageHandler, MessageHandlerContext, MessageType};
//!
//! struct Ping;
//! struct PingHandler;
//!
//! #[async_trait]
//! impl MessageHandler<Ping> for PingHandler {
//!     async fn handle(&self, _: &Ping, _: &MessageHandlerContext) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! let ty = HandlerType::implementing::<PingHandler, Ping>();
//! assert!(ty.handles(&MessageType::of::<Ping>()));
//! assert!(!ty.handles(&MessageType::of::<String>()));
//!
//! // Identity only: handles nothing.
//! let opaque = HandlerType::of::<PingHandler>().build();
//! assert!(!opaque.handles(&MessageType::of::<Ping>()));
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;

use crate::handlers::MessageHandler;
use crate::message::Payload;

/// Identity of a message (or key) type.
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    /// Descriptor of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Type identity.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of a handler type plus the message types it handles.
#[derive(Clone, Debug)]
pub struct HandlerType {
    id: TypeId,
    name: &'static str,
    handles: Vec<MessageType>,
}

impl HandlerType {
    /// Starts a descriptor for `H` with no recorded capabilities.
    pub fn of<H: 'static>() -> HandlerTypeBuilder<H> {
        HandlerTypeBuilder {
            handles: Vec::new(),
            _handler: PhantomData,
        }
    }

    /// Descriptor for `H` recording that it handles `M`.
    pub fn implementing<H, M>() -> Self
    where
        H: MessageHandler<M>,
        M: Payload,
    {
        Self::of::<H>().handles::<M>().build()
    }

    /// Type identity of the handler.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name of the handler.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the handler implements [`MessageHandler`] for `message`.
    pub fn handles(&self, message: &MessageType) -> bool {
        self.handles.contains(message)
    }

    /// Message types this handler is known to handle.
    pub fn capabilities(&self) -> &[MessageType] {
        &self.handles
    }
}

impl PartialEq for HandlerType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HandlerType {}

/// Builder for [`HandlerType`]; see [`HandlerType::of`].
pub struct HandlerTypeBuilder<H> {
    handles: Vec<MessageType>,
    _handler: PhantomData<fn() -> H>,
}

impl<H: 'static> HandlerTypeBuilder<H> {
    /// Records that `H` handles `M`.
    pub fn handles<M>(mut self) -> Self
    where
        H: MessageHandler<M>,
        M: Payload,
    {
        let ty = MessageType::of::<M>();
        if !self.handles.contains(&ty) {
            self.handles.push(ty);
        }
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> HandlerType {
        HandlerType {
            id: TypeId::of::<H>(),
            name: type_name::<H>(),
            handles: self.handles,
        }
    }
}
