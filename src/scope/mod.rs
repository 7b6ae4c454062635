//! Boundaries between the consumption loop and its collaborators.
//!
//! ```text
//!  SourceScopeFactory ──create_scope()──► SourceScope ──fetch_next()──► MessageResult
//!                                              └──release() (exactly once, via guard)
//!
//!  UnitOfWorkFactory ──create_for(&HandlerType)──► Option<UnitOfWork>
//!                                                       └──run(action) ─► action(Some(HandlerInstance))
//! ```
//!
//! ## Contents
//! - [`SourceScope`], [`SourceScopeFactory`] ordered message source
//! - [`UnitOfWork`], [`UnitOfWorkFactory`] per-message handler resolution
//! - [`MemorySourceFactory`] in-process source over a tokio channel
//! - [`TransientUnitOfWorkFactory`] fresh handler instance per message

mod guard;
mod memory;
mod source;
mod transient;
mod unit_of_work;

pub(crate) use guard::ScopeGuard;
pub use memory::{MemorySender, MemorySourceFactory};
pub use source::{SourceScope, SourceScopeFactory};
pub use transient::TransientUnitOfWorkFactory;
pub use unit_of_work::{BoxConsumeFuture, HandlerAction, UnitOfWork, UnitOfWorkFactory};
