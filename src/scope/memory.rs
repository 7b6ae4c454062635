//! # In-process message source.
//!
//! [`MemorySourceFactory`] is a source backed by a bounded tokio `mpsc` channel,
//! useful for tests, demos and in-process pipelines. [`MemorySender`] is the
//! producing half.
//!
//! Every [`create_scope`](SourceScopeFactory::create_scope) returns a new scope
//! reading from the same channel, so messages queued before a restart are
//! delivered to the restarted consumer. Messages carry no commit action: the
//! channel forgets a message as soon as it is received.
//!
//! ## Example
//! ```rust
//! use consumevisor::MemorySourceFactory;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (tx, source) = MemorySourceFactory::<String, u64>::channel("orders", 16);
//! tx.publish("order-1".to_string(), 42).await.unwrap();
//! # let _ = source;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::ConsumeError;
use crate::message::{MessageResult, Metadata, Payload};
use crate::scope::{SourceScope, SourceScopeFactory};

/// Producing half of an in-process source.
pub struct MemorySender<K, V> {
    topic: Arc<str>,
    offset: Arc<AtomicI64>,
    tx: mpsc::Sender<MessageResult<K, V>>,
}

impl<K, V> Clone for MemorySender<K, V> {
    fn clone(&self) -> Self {
        Self {
            topic: Arc::clone(&self.topic),
            offset: Arc::clone(&self.offset),
            tx: self.tx.clone(),
        }
    }
}

impl<K: Payload, V: Payload> MemorySender<K, V> {
    /// Queues a fully built message, waiting for channel capacity.
    ///
    /// Returns the message back if every scope factory has been dropped.
    pub async fn send(&self, message: MessageResult<K, V>) -> Result<(), MessageResult<K, V>> {
        self.tx.send(message).await.map_err(|e| e.0)
    }

    /// Queues `key`/`value` on partition 0 with the next offset.
    pub async fn publish(&self, key: K, value: V) -> Result<(), MessageResult<K, V>> {
        let offset = self.offset.fetch_add(1, Ordering::Relaxed);
        let meta = Metadata::new(Arc::clone(&self.topic), 0, offset);
        self.send(MessageResult::new(key, value, meta)).await
    }
}

/// Source scope factory reading from an in-process channel.
pub struct MemorySourceFactory<K, V> {
    rx: Arc<Mutex<mpsc::Receiver<MessageResult<K, V>>>>,
}

impl<K: Payload, V: Payload> MemorySourceFactory<K, V> {
    /// Creates a bounded channel for `topic` and returns both halves.
    pub fn channel(topic: impl Into<Arc<str>>, capacity: usize) -> (MemorySender<K, V>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sender = MemorySender {
            topic: topic.into(),
            offset: Arc::new(AtomicI64::new(0)),
            tx,
        };
        let factory = Self {
            rx: Arc::new(Mutex::new(rx)),
        };
        (sender, factory)
    }
}

impl<K: Payload, V: Payload> SourceScopeFactory<K, V> for MemorySourceFactory<K, V> {
    fn create_scope(&self) -> Result<Box<dyn SourceScope<K, V>>, ConsumeError> {
        Ok(Box::new(MemoryScope {
            rx: Arc::clone(&self.rx),
            released: false,
        }))
    }
}

struct MemoryScope<K, V> {
    rx: Arc<Mutex<mpsc::Receiver<MessageResult<K, V>>>>,
    released: bool,
}

#[async_trait]
impl<K: Payload, V: Payload> SourceScope<K, V> for MemoryScope<K, V> {
    async fn fetch_next(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<MessageResult<K, V>, ConsumeError> {
        if self.released {
            return Err(ConsumeError::fetch("memory source scope already released"));
        }
        let mut rx = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConsumeError::Canceled),
            guard = self.rx.lock() => guard,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConsumeError::Canceled),
            msg = rx.recv() => msg.ok_or_else(|| ConsumeError::fetch("memory source closed")),
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}
