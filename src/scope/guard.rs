use std::ops::{Deref, DerefMut};

use crate::message::Payload;
use crate::scope::SourceScope;

/// Owns a source scope and releases it exactly once when dropped.
///
/// Dropping covers every exit path of a consumption call: normal return,
/// `?` propagation, and the future itself being dropped mid-await.
pub(crate) struct ScopeGuard<K: Payload, V: Payload> {
    scope: Box<dyn SourceScope<K, V>>,
}

impl<K: Payload, V: Payload> ScopeGuard<K, V> {
    pub(crate) fn new(scope: Box<dyn SourceScope<K, V>>) -> Self {
        Self { scope }
    }
}

impl<K: Payload, V: Payload> Deref for ScopeGuard<K, V> {
    type Target = dyn SourceScope<K, V>;

    fn deref(&self) -> &Self::Target {
        self.scope.as_ref()
    }
}

impl<K: Payload, V: Payload> DerefMut for ScopeGuard<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scope.as_mut()
    }
}

impl<K: Payload, V: Payload> Drop for ScopeGuard<K, V> {
    fn drop(&mut self) {
        self.scope.release();
    }
}
