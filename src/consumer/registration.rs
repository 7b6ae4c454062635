//! # Message registration.
//!
//! [`MessageRegistration`] binds a topic, a handler type and a message type
//! together. It is validated once at construction and immutable afterwards.
//!
//! ## Rules
//! - The topic must be non-empty. It is checked before any source is built:
//!   transports tend to fail badly on an empty subscription.
//! - The handler type must implement [`MessageHandler`](crate::MessageHandler) for
//!   `V` in [`HandlerMode::Value`], or for `MessageResult<K, V>` in
//!   [`HandlerMode::Envelope`].

use std::fmt;
use std::marker::PhantomData;

use crate::error::RegistrationError;
use crate::handlers::{HandlerMode, HandlerType, MessageType};
use crate::message::{MessageResult, Payload};

/// Validated binding of topic, handler type and message type.
pub struct MessageRegistration<K, V> {
    topic: String,
    handler_type: HandlerType,
    mode: HandlerMode,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: Payload, V: Payload> MessageRegistration<K, V> {
    /// Validates and creates a registration.
    ///
    /// # Example
    /// ```
    /// use async_trait::async_trait;
    /// use consumevisor::{
    ///     BoxError, HandlerMode, HandlerType, MessageHandler, MessageHandlerContext,
    ///     MessageRegistration, RegistrationError,
    /// };
    ///
    /// struct Order;
    /// struct OrderHandler;
    ///
    /// #[async_trait]
    /// impl MessageHandler<Order> for OrderHandler {
    ///     async fn handle(&self, _: &Order, _: &MessageHandlerContext) -> Result<(), BoxError> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let ty = HandlerType::implementing::<OrderHandler, Order>();
    /// let reg = MessageRegistration::<String, Order>::new("orders", ty.clone(), HandlerMode::Value)?;
    /// assert_eq!(reg.topic(), "orders");
    ///
    /// // The same handler cannot take full envelopes.
    /// let err = MessageRegistration::<String, Order>::new("orders", ty, HandlerMode::Envelope);
    /// assert!(matches!(err, Err(RegistrationError::InvalidRegistration { .. })));
    /// # Ok::<(), RegistrationError>(())
    /// ```
    pub fn new(
        topic: impl Into<String>,
        handler_type: HandlerType,
        mode: HandlerMode,
    ) -> Result<Self, RegistrationError> {
        let topic = ensure_valid_topic(topic.into())?;
        ensure_handler_capability(&handler_type, Self::expected_message_type(mode))?;

        Ok(Self {
            topic,
            handler_type,
            mode,
            _types: PhantomData,
        })
    }

    /// The message type a handler must accept in `mode`.
    pub fn expected_message_type(mode: HandlerMode) -> MessageType {
        match mode {
            HandlerMode::Value => MessageType::of::<V>(),
            HandlerMode::Envelope => MessageType::of::<MessageResult<K, V>>(),
        }
    }

    /// Subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Registered handler type.
    pub fn handler_type(&self) -> &HandlerType {
        &self.handler_type
    }

    /// Decoded payload type.
    pub fn message_type(&self) -> MessageType {
        MessageType::of::<V>()
    }

    /// Key type.
    pub fn key_type(&self) -> MessageType {
        MessageType::of::<K>()
    }

    /// Dispatch mode.
    pub fn mode(&self) -> HandlerMode {
        self.mode
    }

    /// Returns `true` if the handler receives the full envelope.
    pub fn is_full_envelope_handler(&self) -> bool {
        self.mode.is_full_envelope()
    }
}

impl<K, V> fmt::Debug for MessageRegistration<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRegistration")
            .field("topic", &self.topic)
            .field("handler_type", &self.handler_type.name())
            .field("mode", &self.mode)
            .finish()
    }
}

fn ensure_valid_topic(topic: String) -> Result<String, RegistrationError> {
    if topic.trim().is_empty() {
        return Err(RegistrationError::InvalidRegistration {
            reason: "topic must have a value".to_string(),
        });
    }
    Ok(topic)
}

fn ensure_handler_capability(
    handler_type: &HandlerType,
    expected: MessageType,
) -> Result<(), RegistrationError> {
    if handler_type.handles(&expected) {
        return Ok(());
    }
    Err(RegistrationError::InvalidRegistration {
        reason: format!(
            "handler type \"{}\" does not implement MessageHandler<{}>",
            handler_type.name(),
            expected.name()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handlers::MessageHandler;
    use crate::message::MessageHandlerContext;
    use async_trait::async_trait;

    struct FooMessage;
    struct BarMessage;

    struct FooHandler;

    #[async_trait]
    impl MessageHandler<FooMessage> for FooHandler {
        async fn handle(&self, _: &FooMessage, _: &MessageHandlerContext) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct BarHandler;

    #[async_trait]
    impl MessageHandler<BarMessage> for BarHandler {
        async fn handle(&self, _: &BarMessage, _: &MessageHandlerContext) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct FooEnvelopeHandler;

    #[async_trait]
    impl MessageHandler<MessageResult<String, FooMessage>> for FooEnvelopeHandler {
        async fn handle(
            &self,
            _: &MessageResult<String, FooMessage>,
            _: &MessageHandlerContext,
        ) -> Result<(), BoxError> {
            Ok(())
        }
    }

    type Registration = MessageRegistration<String, FooMessage>;

    #[test]
    fn returns_registered_values() {
        let ty = HandlerType::implementing::<FooHandler, FooMessage>();
        let reg = Registration::new("foo", ty.clone(), HandlerMode::Value).unwrap();

        assert_eq!(reg.handler_type(), &ty);
        assert_eq!(reg.message_type(), MessageType::of::<FooMessage>());
        assert_eq!(reg.key_type(), MessageType::of::<String>());
        assert_eq!(reg.topic(), "foo");
        assert!(!reg.is_full_envelope_handler());
    }

    #[test]
    fn rejects_empty_topic_for_any_handler() {
        for ty in [
            HandlerType::implementing::<FooHandler, FooMessage>(),
            HandlerType::implementing::<BarHandler, BarMessage>(),
            HandlerType::of::<String>().build(),
        ] {
            for topic in ["", "   "] {
                let err = Registration::new(topic, ty.clone(), HandlerMode::Value).unwrap_err();
                assert!(matches!(err, RegistrationError::InvalidRegistration { .. }));
            }
        }
    }

    #[test]
    fn rejects_handler_for_different_message_type() {
        let ty = HandlerType::implementing::<BarHandler, BarMessage>();
        let err = Registration::new("foo", ty, HandlerMode::Value).unwrap_err();

        match err {
            RegistrationError::InvalidRegistration { reason } => {
                assert!(reason.contains("BarHandler"), "{reason}");
                assert!(reason.contains("FooMessage"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_type_without_handler_capability() {
        let ty = HandlerType::of::<FooHandler>().build();
        assert!(Registration::new("foo", ty, HandlerMode::Value).is_err());
    }

    #[test]
    fn envelope_mode_expects_envelope_capability() {
        let value_ty = HandlerType::implementing::<FooHandler, FooMessage>();
        let envelope_ty =
            HandlerType::implementing::<FooEnvelopeHandler, MessageResult<String, FooMessage>>();

        assert!(Registration::new("foo", value_ty, HandlerMode::Envelope).is_err());
        assert!(Registration::new("foo", envelope_ty.clone(), HandlerMode::Value).is_err());

        let reg = Registration::new("foo", envelope_ty, HandlerMode::Envelope).unwrap();
        assert!(reg.is_full_envelope_handler());
    }
}
