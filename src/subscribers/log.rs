//! # Logging subscriber.
//!
//! [`LogWriter`] renders runtime events through `tracing`, under the
//! `consumevisor::events` target. Install any `tracing` subscriber to see them.
//!
//! ## Levels
//! ```text
//! debug  message-handled / message-committed
//! info   consumer-starting / consumer-stopped / shutdown-requested / all-stopped
//! warn   consumer-failed / restart-scheduled / subscriber-overflow
//! error  stop-requested / grace-exceeded / subscriber-panicked
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "consumevisor::events";

/// Subscriber writing every event to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let consumer = e.consumer.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ConsumerStarting => {
                tracing::info!(target: TARGET, seq = e.seq, consumer, attempt = e.attempt, "consumer-starting");
            }
            EventKind::ConsumerFailed => {
                tracing::warn!(
                    target: TARGET,
                    seq = e.seq,
                    consumer,
                    attempt = e.attempt,
                    strategy = e.strategy.map(|s| s.as_label()),
                    reason,
                    "consumer-failed"
                );
            }
            EventKind::RestartScheduled => {
                tracing::warn!(target: TARGET, seq = e.seq, consumer, after_attempt = e.attempt, "restart-scheduled");
            }
            EventKind::ConsumerStopped => {
                tracing::info!(target: TARGET, seq = e.seq, consumer, attempt = e.attempt, reason, "consumer-stopped");
            }
            EventKind::StopRequested => {
                tracing::error!(target: TARGET, seq = e.seq, consumer, reason, "stop-requested");
            }
            EventKind::MessageHandled => {
                tracing::debug!(target: TARGET, seq = e.seq, consumer, partition = e.partition, offset = e.offset, "message-handled");
            }
            EventKind::MessageCommitted => {
                tracing::debug!(target: TARGET, seq = e.seq, consumer, partition = e.partition, offset = e.offset, "message-committed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: TARGET, seq = e.seq, reason, "shutdown-requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: TARGET, seq = e.seq, "all-stopped-within-grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!(target: TARGET, seq = e.seq, stuck = reason, "grace-exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: TARGET, seq = e.seq, subscriber = consumer, reason, "subscriber-overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: TARGET, seq = e.seq, subscriber = consumer, reason, "subscriber-panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
