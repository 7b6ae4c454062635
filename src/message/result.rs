//! # One fetched message.
//!
//! [`MessageResult`] is the full envelope a source scope yields per fetch. Value
//! handlers only ever see [`MessageResult::value`]; full-envelope handlers see the
//! whole struct.
//!
//! ## Rules
//! - [`MessageResult::commit`] runs the attached action **at most once**; later
//!   calls (and calls on messages without an action) are no-ops.

use std::sync::Arc;
use std::time::SystemTime;

use crate::error::ConsumeError;
use crate::message::{Commit, CommitRef, Headers};

/// Where a message came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Topic the message was read from.
    pub topic: Arc<str>,
    /// Partition (or partition-like shard) identifier.
    pub partition: i32,
    /// Position of the message within the partition.
    pub offset: i64,
    /// Source timestamp.
    pub timestamp: SystemTime,
}

impl Metadata {
    /// Creates metadata stamped with the current wall-clock time.
    pub fn new(topic: impl Into<Arc<str>>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            timestamp: SystemTime::now(),
        }
    }

    /// Overrides the timestamp.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A fetched message: key, decoded value, headers, metadata and commit action.
pub struct MessageResult<K, V> {
    key: K,
    value: V,
    headers: Headers,
    metadata: Metadata,
    commit: Option<CommitRef>,
}

impl<K, V> MessageResult<K, V> {
    /// Creates a message without headers and without a commit action.
    pub fn new(key: K, value: V, metadata: Metadata) -> Self {
        Self {
            key,
            value,
            headers: Headers::new(),
            metadata,
            commit: None,
        }
    }

    /// Attaches headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Attaches the commit action the loop runs after a successful dispatch.
    pub fn with_commit(mut self, commit: impl Commit) -> Self {
        self.commit = Some(Arc::new(commit));
        self
    }

    /// Attaches an already shared commit action.
    pub fn with_commit_ref(mut self, commit: CommitRef) -> Self {
        self.commit = Some(commit);
        self
    }

    /// Message key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Decoded payload.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Message headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Message metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns `true` while a commit action is attached and not yet used.
    pub fn is_committable(&self) -> bool {
        self.commit.is_some()
    }

    /// Runs the commit action, if any, consuming it.
    pub async fn commit(&mut self) -> Result<(), ConsumeError> {
        match self.commit.take() {
            Some(action) => action.commit().await.map_err(ConsumeError::commit),
            None => Ok(()),
        }
    }

    /// Splits the message into key and value, dropping everything else.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for MessageResult<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageResult")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("headers", &self.headers)
            .field("metadata", &self.metadata)
            .field("committable", &self.commit.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::message::CommitFn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn commit_runs_at_most_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut msg = MessageResult::new("k", 1u32, Metadata::new("orders", 0, 7)).with_commit(
            CommitFn::new(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }
            }),
        );

        assert!(msg.is_committable());
        msg.commit().await.unwrap();
        msg.commit().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!msg.is_committable());
    }

    #[tokio::test]
    async fn commit_error_is_wrapped() {
        let mut msg = MessageResult::new((), (), Metadata::new("orders", 0, 0))
            .with_commit(CommitFn::new(|| async { Err::<(), BoxError>("broker gone".into()) }));

        let err = msg.commit().await.unwrap_err();
        assert!(matches!(err, ConsumeError::Commit { .. }));
    }
}
