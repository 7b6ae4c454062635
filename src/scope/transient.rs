//! # Transient unit-of-work factory.
//!
//! [`TransientUnitOfWorkFactory`] maps a handler type to a provider closure.
//! Each unit of work builds a **fresh** handler instance, passes it to the
//! action and drops it once the action completes, so no handler state survives
//! from one message to the next unless the provider shares it explicitly
//! (e.g. through an `Arc` captured by the closure).
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use consumevisor::{
//!     BoxError, HandlerType, MessageHandler, MessageHandlerContext, TransientUnitOfWorkFactory,
//!     UnitOfWorkFactory,
//! };
//!
//! struct Order;
//! struct OrderHandler;
//!
//! #[async_trait]
//! impl MessageHandler<Order> for OrderHandler {
//!     async fn handle(&self, _: &Order, _: &MessageHandlerContext) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! let factory = TransientUnitOfWorkFactory::<String, Order>::new()
//!     .with_value_handler(|| OrderHandler);
//!
//! let ty = HandlerType::implementing::<OrderHandler, Order>();
//! assert!(factory.create_for(&ty).is_some());
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::handlers::{HandlerInstance, HandlerType, MessageHandler};
use crate::message::{MessageResult, Payload};
use crate::scope::{BoxConsumeFuture, HandlerAction, UnitOfWork, UnitOfWorkFactory};

type Provider<K, V> = Arc<dyn Fn() -> HandlerInstance<K, V> + Send + Sync>;

/// Unit-of-work factory creating one handler instance per message.
pub struct TransientUnitOfWorkFactory<K: Payload, V: Payload> {
    providers: HashMap<TypeId, Provider<K, V>>,
}

impl<K: Payload, V: Payload> Default for TransientUnitOfWorkFactory<K, V> {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }
}

impl<K: Payload, V: Payload> TransientUnitOfWorkFactory<K, V> {
    /// Creates an empty factory; it resolves nothing until providers are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider for value handler `H`.
    pub fn with_value_handler<H, F>(mut self, provider: F) -> Self
    where
        H: MessageHandler<V>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.providers.insert(
            TypeId::of::<H>(),
            Arc::new(move || HandlerInstance::value(provider())),
        );
        self
    }

    /// Registers a provider for full-envelope handler `H`.
    pub fn with_envelope_handler<H, F>(mut self, provider: F) -> Self
    where
        H: MessageHandler<MessageResult<K, V>>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.providers.insert(
            TypeId::of::<H>(),
            Arc::new(move || HandlerInstance::envelope(provider())),
        );
        self
    }
}

impl<K: Payload, V: Payload> UnitOfWorkFactory<K, V> for TransientUnitOfWorkFactory<K, V> {
    fn create_for(&self, handler: &HandlerType) -> Option<Box<dyn UnitOfWork<K, V>>> {
        let provider = self.providers.get(&handler.id())?;
        Some(Box::new(TransientUnitOfWork {
            provider: Arc::clone(provider),
        }))
    }
}

struct TransientUnitOfWork<K: Payload, V: Payload> {
    provider: Provider<K, V>,
}

impl<K: Payload, V: Payload> UnitOfWork<K, V> for TransientUnitOfWork<K, V> {
    fn run<'a>(&'a self, action: HandlerAction<'a, K, V>) -> BoxConsumeFuture<'a> {
        let instance = (self.provider)();
        Box::pin(action(Some(instance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::message::MessageHandlerContext;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted(Arc<AtomicUsize>);

    #[async_trait]
    impl MessageHandler<u32> for Counted {
        async fn handle(&self, _: &u32, _: &MessageHandlerContext) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct Unknown;

    #[test]
    fn unknown_handler_type_is_unresolved() {
        let factory = TransientUnitOfWorkFactory::<(), u32>::new();
        let ty = HandlerType::of::<Unknown>().build();
        assert!(factory.create_for(&ty).is_none());
    }

    #[tokio::test]
    async fn builds_fresh_instance_per_unit_of_work() {
        let built = Arc::new(AtomicUsize::new(0));
        let b = built.clone();
        let factory = TransientUnitOfWorkFactory::<(), u32>::new().with_value_handler(move || {
            b.fetch_add(1, Ordering::SeqCst);
            Counted(b.clone())
        });
        let ty = HandlerType::implementing::<Counted, u32>();

        for _ in 0..3 {
            let uow = factory.create_for(&ty).unwrap();
            uow.run(Box::new(|instance| {
                Box::pin(async move {
                    assert!(matches!(instance, Some(HandlerInstance::Value(_))));
                    Ok(())
                })
            }))
            .await
            .unwrap();
        }

        assert_eq!(built.load(Ordering::SeqCst), 3);
    }
}
