//! Message handlers and the descriptors used to validate them.
//!
//! ## Contents
//! - [`MessageHandler`] the handler capability, generic over what it receives
//! - [`HandlerMode`]    value handler vs full-envelope handler
//! - [`HandlerInstance`] a resolved handler, tagged by mode
//! - [`HandlerType`], [`MessageType`] type descriptors checked at registration
//!
//! ## Capability check
//! ```text
//! register(topic, HandlerType, HandlerMode)
//!   ├─ Value    → expected = MessageType::of::<V>()
//!   └─ Envelope → expected = MessageType::of::<MessageResult<K, V>>()
//!        HandlerType::handles(expected)?  ── no ──► InvalidRegistration
//! ```
//! Capabilities enter a [`HandlerType`] only through constructors bounded by
//! `H: MessageHandler<M>`, so the check is as strong as the compiler's.

mod descriptor;
mod handler;

pub use descriptor::{HandlerType, HandlerTypeBuilder, MessageType};
pub use handler::{HandlerInstance, HandlerMode, MessageHandler};
