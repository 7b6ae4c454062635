//! Error types used by the consumevisor runtime, its configuration and its consumers.
//!
//! This module defines four error enums:
//!
//! - [`RegistrationError`]: a topic/handler/message binding was rejected.
//! - [`ConfigError`]: a consumer or host configuration could not be built.
//! - [`ConsumeError`]: a consumption cycle failed (handed to the supervision loop).
//! - [`RuntimeError`]: the host itself failed (shutdown grace exceeded).
//!
//! All of them provide [`as_label`](ConsumeError::as_label) for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by user-supplied handlers, sources and commit actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced while binding a topic, a message type and a handler type.
///
/// Both variants are fatal at configuration time and are never retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Topic is empty or the handler type does not implement the expected capability.
    #[error("invalid message registration: {reason}")]
    InvalidRegistration {
        /// What was wrong with the registration.
        reason: String,
    },

    /// A consumer configuration already holds a registration.
    #[error("only one message registration is supported per consumer")]
    MultipleRegistrationsNotSupported,
}

impl RegistrationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use consumevisor::RegistrationError;
    ///
    /// let err = RegistrationError::MultipleRegistrationsNotSupported;
    /// assert_eq!(err.as_label(), "registration_multiple");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::InvalidRegistration { .. } => "registration_invalid",
            RegistrationError::MultipleRegistrationsNotSupported => "registration_multiple",
        }
    }
}

/// # Errors produced while building consumer or host configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration key has no value.
    #[error("missing required configuration key \"{key}\"")]
    MissingConfiguration {
        /// The missing key.
        key: String,
    },

    /// A configuration key holds a value that cannot be interpreted.
    #[error("invalid value \"{value}\" for configuration key \"{key}\"")]
    InvalidConfiguration {
        /// The offending key.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// No message registration was supplied.
    #[error("no message handler registered")]
    MissingRegistration,

    /// No source scope factory was supplied.
    #[error("no source scope factory configured")]
    MissingSourceFactory,

    /// No unit-of-work factory was supplied.
    #[error("no unit of work factory configured")]
    MissingUnitOfWorkFactory,

    /// Another consumer with the same (group, topic) identity is already configured.
    #[error("multiple consumers cannot be configured with group id \"{group}\" for topic \"{topic}\"")]
    DuplicateConsumer {
        /// Consumer group id.
        group: String,
        /// Subscribed topic.
        topic: String,
    },

    /// The message registration was rejected.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingConfiguration { .. } => "config_missing_key",
            ConfigError::InvalidConfiguration { .. } => "config_invalid_value",
            ConfigError::MissingRegistration => "config_missing_registration",
            ConfigError::MissingSourceFactory => "config_missing_source_factory",
            ConfigError::MissingUnitOfWorkFactory => "config_missing_unit_of_work_factory",
            ConfigError::DuplicateConsumer { .. } => "config_duplicate_consumer",
            ConfigError::Registration(e) => e.as_label(),
        }
    }
}

/// # Errors produced by a consumption cycle.
///
/// The consumption loop never recovers locally: every variant ends the current
/// `consume_all`/`consume_single` call and is handed to the supervision loop
/// unmodified. [`ConsumeError::Canceled`] is the exception only when the
/// consumer's own token was cancelled.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConsumeError {
    /// The unit-of-work factory returned nothing for the registered handler type.
    #[error("unable to create unit of work for handler type \"{handler}\"")]
    UnresolvedUnitOfWork {
        /// Registered handler type name.
        handler: &'static str,
    },

    /// The unit of work produced no handler instance, or one of the wrong shape.
    #[error("invalid handler instance for handler type \"{handler}\": {reason}")]
    InvalidHandlerInstance {
        /// Registered handler type name.
        handler: &'static str,
        /// Why the instance was rejected.
        reason: String,
    },

    /// The handler returned an error.
    #[error("handler failed: {source}")]
    Handler {
        /// The handler's error.
        source: BoxError,
    },

    /// Fetching the next message failed.
    #[error("fetch failed: {source}")]
    Fetch {
        /// The source's error.
        source: BoxError,
    },

    /// Committing a handled message failed.
    #[error("commit failed: {source}")]
    Commit {
        /// The commit action's error.
        source: BoxError,
    },

    /// The source scope could not be created.
    #[error("unable to create source scope: {source}")]
    Scope {
        /// The factory's error.
        source: BoxError,
    },

    /// The fetch observed cancellation before a message arrived.
    #[error("consumption cancelled")]
    Canceled,
}

impl ConsumeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use consumevisor::ConsumeError;
    ///
    /// let err = ConsumeError::UnresolvedUnitOfWork { handler: "OrderHandler" };
    /// assert_eq!(err.as_label(), "consume_unresolved_unit_of_work");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConsumeError::UnresolvedUnitOfWork { .. } => "consume_unresolved_unit_of_work",
            ConsumeError::InvalidHandlerInstance { .. } => "consume_invalid_handler_instance",
            ConsumeError::Handler { .. } => "consume_handler_failed",
            ConsumeError::Fetch { .. } => "consume_fetch_failed",
            ConsumeError::Commit { .. } => "consume_commit_failed",
            ConsumeError::Scope { .. } => "consume_scope_failed",
            ConsumeError::Canceled => "consume_canceled",
        }
    }

    /// Wraps a handler error.
    pub fn handler(source: impl Into<BoxError>) -> Self {
        ConsumeError::Handler {
            source: source.into(),
        }
    }

    /// Wraps a fetch error.
    pub fn fetch(source: impl Into<BoxError>) -> Self {
        ConsumeError::Fetch {
            source: source.into(),
        }
    }

    /// Wraps a commit error.
    pub fn commit(source: impl Into<BoxError>) -> Self {
        ConsumeError::Commit {
            source: source.into(),
        }
    }

    /// Wraps a scope creation error.
    pub fn scope(source: impl Into<BoxError>) -> Self {
        ConsumeError::Scope {
            source: source.into(),
        }
    }

    /// Returns `true` for [`ConsumeError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, ConsumeError::Canceled)
    }

    /// Indicates whether restarting the consumer can possibly help.
    ///
    /// Returns `false` for handler resolution failures: a fresh scope resolves
    /// the same handler the same way.
    ///
    /// # Example
    /// ```
    /// use consumevisor::ConsumeError;
    ///
    /// assert!(ConsumeError::fetch("broker went away").is_retryable());
    /// assert!(!ConsumeError::UnresolvedUnitOfWork { handler: "H" }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ConsumeError::UnresolvedUnitOfWork { .. } | ConsumeError::InvalidHandlerInstance { .. }
        )
    }
}

/// # Errors produced by the hosting runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some consumers were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Consumers that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use consumevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
