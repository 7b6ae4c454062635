//! # One consumption cycle.
//!
//! Fetches one message from an open source scope, dispatches it to the
//! registered handler inside a unit of work and, when auto-commit is disabled,
//! commits it.
//!
//! ## Flow
//! ```text
//! scope.fetch_next(token) ──► MessageResult
//!        │ (suspends; Canceled once the token fires)
//!        ▼
//! MessageHandlerContext { message type, metadata, child token }
//!        ▼
//! units.create_for(handler_type) ── None ──► UnresolvedUnitOfWork
//!        ▼
//! uow.run(action):  setup → action(instance) → teardown
//!                              ├─ None          ──► InvalidHandlerInstance
//!                              ├─ wrong shape   ──► InvalidHandlerInstance
//!                              ├─ Value(h)      ──► h.handle(message.value())
//!                              └─ Envelope(h)   ──► h.handle(&message)
//!        ▼ Ok                                       publish MessageHandled
//! auto_commit == false && committable ──► message.commit() ──► publish MessageCommitted
//! ```
//!
//! ## Rules
//! - Commit happens only after the unit of work returned successfully, i.e. after teardown.
//! - A message without a commit action is never reported as committed.
//! - No error is handled locally; every failure ends the cycle unchanged.

use tokio_util::sync::CancellationToken;

use crate::consumer::MessageRegistration;
use crate::core::consumer::Consumer;
use crate::error::ConsumeError;
use crate::events::EventKind;
use crate::handlers::{HandlerInstance, HandlerMode};
use crate::message::{MessageHandlerContext, MessageResult, Payload};
use crate::scope::{BoxConsumeFuture, HandlerAction, SourceScope};

/// Runs exactly one fetch-dispatch-commit cycle on `scope`.
pub(crate) async fn run_cycle<K: Payload, V: Payload>(
    consumer: &Consumer<K, V>,
    scope: &mut dyn SourceScope<K, V>,
    token: &CancellationToken,
) -> Result<(), ConsumeError> {
    let mut message = scope.fetch_next(token).await?;
    tracing::trace!(
        partition = message.metadata().partition,
        offset = message.metadata().offset,
        "message fetched"
    );

    let registration = consumer.registration.as_ref();
    let ctx = MessageHandlerContext::new(
        registration.message_type().name(),
        message.metadata().clone(),
        token.child_token(),
    );

    let handler_type = registration.handler_type();
    let uow = consumer
        .units
        .create_for(handler_type)
        .ok_or(ConsumeError::UnresolvedUnitOfWork {
            handler: handler_type.name(),
        })?;

    {
        let msg = &message;
        let ctx = &ctx;
        let action: HandlerAction<'_, K, V> = Box::new(move |instance| {
            let fut: BoxConsumeFuture<'_> = Box::pin(dispatch(registration, instance, msg, ctx));
            fut
        });
        uow.run(action).await?;
    }
    drop(uow);
    consumer
        .bus
        .publish_message(EventKind::MessageHandled, &consumer.name, message.metadata());

    if !consumer.auto_commit && message.is_committable() {
        message.commit().await?;
        tracing::debug!(offset = message.metadata().offset, "message committed");
        consumer
            .bus
            .publish_message(EventKind::MessageCommitted, &consumer.name, message.metadata());
    }
    Ok(())
}

/// Hands the message to the resolved instance according to the registration's mode.
async fn dispatch<K: Payload, V: Payload>(
    registration: &MessageRegistration<K, V>,
    instance: Option<HandlerInstance<K, V>>,
    message: &MessageResult<K, V>,
    ctx: &MessageHandlerContext,
) -> Result<(), ConsumeError> {
    let handler = registration.handler_type().name();
    let Some(instance) = instance else {
        return Err(ConsumeError::InvalidHandlerInstance {
            handler,
            reason: "unit of work produced no handler instance".to_string(),
        });
    };

    let res = match (registration.mode(), instance) {
        (HandlerMode::Value, HandlerInstance::Value(h)) => h.handle(message.value(), ctx).await,
        (HandlerMode::Envelope, HandlerInstance::Envelope(h)) => h.handle(message, ctx).await,
        (expected, other) => {
            return Err(ConsumeError::InvalidHandlerInstance {
                handler,
                reason: format!(
                    "expected a {expected} handler instance, got a {} one",
                    other.mode()
                ),
            });
        }
    };
    res.map_err(ConsumeError::handler)
}
