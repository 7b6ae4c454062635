use tokio_util::sync::CancellationToken;

use crate::message::Metadata;

/// Per-message context handed to a handler next to the message itself.
///
/// Built fresh by the consumption loop for every cycle.
#[derive(Clone, Debug)]
pub struct MessageHandlerContext {
    message_type: &'static str,
    metadata: Metadata,
    cancel: CancellationToken,
}

impl MessageHandlerContext {
    /// Creates a context; useful when testing handlers in isolation.
    pub fn new(message_type: &'static str, metadata: Metadata, cancel: CancellationToken) -> Self {
        Self {
            message_type,
            metadata,
            cancel,
        }
    }

    /// Type name of the registered message (decoded payload) type.
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// Metadata of the message being handled.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Token cancelled when the consumer is asked to stop.
    ///
    /// The loop never interrupts a running handler; long handlers may watch this
    /// token to finish early.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
