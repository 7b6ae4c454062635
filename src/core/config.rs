//! # Host configuration.
//!
//! [`SupervisorConfig`] holds the settings of the hosting runtime. Everything
//! per consumer lives in [`ConsumerConfig`](crate::ConsumerConfig).

use std::time::Duration;

/// Configuration of the [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `grace`: how long shutdown waits for consumers after cancelling them (`0s` = no wait)
/// - `bus_capacity`: event bus ring buffer size (min 1; see [`bus_capacity_clamped`](Self::bus_capacity_clamped))
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for consumers to stop once shutdown began.
    ///
    /// Exceeding it makes [`Supervisor::run`](crate::Supervisor::run) return
    /// `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging by more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// `grace = 30s`, `bus_capacity = 1024`.
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
