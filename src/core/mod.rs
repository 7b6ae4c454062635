//! Runtime core: consumption, supervision and hosting.
//!
//! Modules:
//! - [`runner`]: one fetch-dispatch-commit cycle;
//! - [`consumer`]: the consumption loop over a source scope;
//! - [`service`]: the supervision loop consulting the failure evaluator;
//! - [`supervisor`]: hosts services, handles shutdown and grace;
//! - [`registry`]: `(group, topic)` identity of consumers;
//! - [`lifetime`]: how a service asks its host to stop;
//! - [`shutdown`]: cross-platform termination signals.

mod alive;
mod builder;
mod config;
mod consumer;
mod lifetime;
mod registry;
mod runner;
mod service;
mod shutdown;
mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub(crate) use alive::AliveTracker;
pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use consumer::Consumer;
pub use lifetime::{HostLifetime, ShutdownHandle};
pub use registry::ConsumerId;
pub use service::{ConsumerService, ServiceExit, ServiceState};
pub use shutdown::wait_for_shutdown_signal;
pub use supervisor::Supervisor;
