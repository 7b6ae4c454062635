//! # Commit actions attached to fetched messages.
//!
//! A source that tracks progress itself (auto-commit) attaches nothing. A source
//! that expects the loop to acknowledge messages attaches a [`Commit`]; the loop
//! invokes it once the handler has returned successfully.
//!
//! [`CommitFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per call.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use consumevisor::{BoxError, CommitFn, CommitRef};
//!
//! let committed = Arc::new(AtomicU64::new(0));
//! let c = committed.clone();
//! let commit: CommitRef = CommitFn::arc(move || {
//!     let c = c.clone();
//!     async move {
//!         c.store(42, Ordering::SeqCst);
//!         Ok::<_, BoxError>(())
//!     }
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Shared handle to a commit action.
pub type CommitRef = Arc<dyn Commit>;

/// Acknowledges one message back to its source.
#[async_trait]
pub trait Commit: Send + Sync + 'static {
    /// Makes the message's progress observable to the source.
    async fn commit(&self) -> Result<(), BoxError>;
}

/// Function-backed commit action.
pub struct CommitFn<F> {
    f: F,
}

impl<F> CommitFn<F> {
    /// Creates a new function-backed commit action.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the action and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Commit for CommitFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn commit(&self) -> Result<(), BoxError> {
        (self.f)().await
    }
}
