use core::future::Future;
use std::sync::Arc;

use crate::error::StoreError;

/// A key with its current value and the version token needed to replace it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvPair {
    /// Full key, including any namespace prefix.
    pub key: String,
    /// Stored value. This crate only ever stores decimal integers.
    pub value: String,
    /// Opaque modification index; changes on every write.
    pub version: u64,
}

impl KvPair {
    /// Parses the value as a decimal integer.
    pub fn parse_value(&self) -> Option<i64> {
        self.value.trim().parse().ok()
    }
}

/// A strongly consistent key-value store with compare-and-swap by version.
///
/// Implementations must be linearizable per key: once `cas` returns `true`
/// for a version, every other `cas` against that same version returns
/// `false`.
pub trait CoordinationStore: Send + Sync {
    /// Reads a key. Returns `Ok(None)` if it does not exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<KvPair>, StoreError>> + Send;

    /// Writes a key unconditionally, creating it if needed.
    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Writes a key only if its version still equals `version`.
    ///
    /// Returns `Ok(false)` when another writer got there first. A `version`
    /// of zero only succeeds if the key does not exist yet.
    fn cas(
        &self,
        key: &str,
        value: &str,
        version: u64,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

impl<S> CoordinationStore for Arc<S>
where
    S: CoordinationStore,
{
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<KvPair>, StoreError>> + Send {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).put(key, value)
    }

    fn cas(
        &self,
        key: &str,
        value: &str,
        version: u64,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).cas(key, value, version)
    }
}
