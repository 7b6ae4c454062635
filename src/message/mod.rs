//! Fetched messages and the values that travel with them.
//!
//! ## Contents
//! - [`MessageResult`] one fetched message: key, value, headers, metadata, commit action
//! - [`Headers`]       ordered header list (duplicate keys allowed)
//! - [`Metadata`]      topic / partition / offset / timestamp
//! - [`Commit`], [`CommitFn`] the commit action a source attaches to a message
//! - [`MessageHandlerContext`] per-message context handed to handlers
//!
//! A [`MessageResult`] is created by a source scope per fetch, consumed by the
//! consumption loop and optionally committed, then discarded.

mod commit;
mod context;
mod headers;
mod result;

pub use commit::{Commit, CommitFn, CommitRef};
pub use context::MessageHandlerContext;
pub use headers::Headers;
pub use result::{Metadata, MessageResult};

/// Bounds shared by keys, values and anything a handler may receive.
///
/// Blanket-implemented; never implement it by hand.
pub trait Payload: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Payload for T {}
