//! # Source scope: an acquired handle to an ordered message source.
//!
//! A [`SourceScopeFactory`] is asked for a **new** scope every time consumption
//! (re)starts; a factory must not hand out a transport instance cached from a
//! previous scope.
//!
//! ## Rules
//! - [`SourceScope::fetch_next`] is the only call that may block indefinitely.
//!   It must observe the token and return [`ConsumeError::Canceled`] promptly
//!   once it is cancelled (no busy-spinning).
//! - [`SourceScope::release`] must be idempotent; the consumption loop calls it
//!   exactly once per scope, on every exit path.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ConsumeError;
use crate::message::{MessageResult, Payload};

/// Acquired, releasable handle to an ordered message source.
#[async_trait]
pub trait SourceScope<K: Payload, V: Payload>: Send {
    /// Returns the next message, waiting until one is available or `cancel` fires.
    async fn fetch_next(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<MessageResult<K, V>, ConsumeError>;

    /// Releases the underlying resources.
    fn release(&mut self);
}

/// Creates source scopes.
pub trait SourceScopeFactory<K: Payload, V: Payload>: Send + Sync + 'static {
    /// Creates a fresh scope.
    fn create_scope(&self) -> Result<Box<dyn SourceScope<K, V>>, ConsumeError>;
}
