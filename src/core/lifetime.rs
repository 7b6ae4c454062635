//! # Host lifetime.
//!
//! A consumer service that gives up (its evaluator answered
//! [`FailureStrategy::Default`](crate::FailureStrategy)) does not exit the
//! process by itself: it asks its host to stop through [`HostLifetime`].

use tokio_util::sync::CancellationToken;

/// Handle through which a consumer service asks its host to stop.
pub trait HostLifetime: Send + Sync + 'static {
    /// Requests an orderly shutdown of the host. Must be idempotent.
    fn request_shutdown(&self);
}

/// [`HostLifetime`] backed by the host's runtime cancellation token.
///
/// Obtained from [`Supervisor::shutdown_handle`](crate::Supervisor::shutdown_handle);
/// can also be built around any token to drive a [`ConsumerService`](crate::ConsumerService)
/// without a supervisor.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Wraps `token`; requesting shutdown cancels it.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Returns `true` once shutdown was requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl HostLifetime for ShutdownHandle {
    fn request_shutdown(&self) {
        self.token.cancel();
    }
}
