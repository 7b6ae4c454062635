//! Consumer-side configuration: the message registration and the builder that
//! validates a consumer before a host ever runs it.

mod config;
mod registration;

pub use config::{ConsumerConfig, ConsumerConfigBuilder, ENABLE_AUTO_COMMIT, GROUP_ID};
pub use registration::MessageRegistration;
