//! # Randomization of restart delays.
//!
//! Consumers sharing a broker tend to fail together (the broker went away) and
//! would restart in lockstep without jitter. [`JitterPolicy::spread`] turns the
//! exponential delay computed by [`BackoffPolicy`](crate::BackoffPolicy) into
//! the delay actually slept by [`RestartWithBackoff`](crate::RestartWithBackoff).
//!
//! ```text
//! None          delay
//! Full          random[0, delay]
//! Equal         delay/2 + random[0, delay/2]
//! Decorrelated  random[first, min(delay × 3, max)]
//! ```

use std::time::Duration;

use rand::Rng;

/// Randomization applied to restart delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// Exact delay.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// `delay/2 + random[0, delay/2]`.
    Equal,
    /// Random delay in `[first, delay × 3]`, capped at `max`.
    Decorrelated,
}

impl JitterPolicy {
    /// Randomizes `delay`, the backoff delay of the coming restart.
    ///
    /// `first` and `max` are the policy bounds; only `Decorrelated` uses them.
    /// The result of `Decorrelated` never falls below `first`.
    pub fn spread(&self, delay: Duration, first: Duration, max: Duration) -> Duration {
        let ms = millis(delay);
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => random_ms(0, ms),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half) + random_ms(0, half)
            }
            JitterPolicy::Decorrelated => {
                let lo = millis(first);
                let hi = ms.saturating_mul(3).min(millis(max)).max(lo);
                random_ms(lo, hi)
            }
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn random_ms(lo: u64, hi: u64) -> Duration {
    if lo >= hi {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::rng().random_range(lo..=hi))
}
