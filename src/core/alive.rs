//! # Consumer liveness tracker with sequence-based ordering.
//!
//! Keeps track of which consumer services are currently running so the host can
//! name the stuck ones when shutdown exceeds its grace period.
//!
//! ## Architecture
//! ```text
//! ConsumerService ──► Bus ──► subscriber_listener() ──► AliveTracker::update()
//!                                                              │
//!                                                              ▼
//!                                                  HashMap<String, ConsumerState>
//!                                                     (name → {last_seq, alive})
//! ```
//!
//! ## Rules
//! - Only `ConsumerStarting` / `ConsumerStopped` change alive state
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Reads are **eventually consistent** with the bus

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone)]
struct ConsumerState {
    last_seq: u64,
    alive: bool,
}

/// Thread-safe tracker of running consumers.
#[derive(Debug, Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<String, ConsumerState>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `ev` if it is newer than the last event seen for its consumer.
    ///
    /// Returns `true` if the alive state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let alive = match ev.kind {
            EventKind::ConsumerStarting => true,
            EventKind::ConsumerStopped => false,
            _ => return false,
        };
        let Some(name) = ev.consumer.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(ConsumerState {
            last_seq: 0,
            alive: false,
        });
        if entry.last_seq != 0 && ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        let changed = entry.alive != alive;
        entry.alive = alive;
        changed
    }

    /// Sorted names of consumers currently alive.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, s)| s.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    /// Returns `true` if `name` is currently alive.
    pub async fn is_alive(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .map(|s| s.alive)
            .unwrap_or(false)
    }
}
