use std::collections::HashMap;

use parking_lot::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::{
    error::StoreError,
    store::{CoordinationStore, KvPair},
};

#[derive(Debug)]
struct Entry {
    value: String,
    version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    // Store-wide modification index, like Consul's Raft index.
    index: u64,
}

impl Inner {
    fn bump(&mut self) -> u64 {
        self.index += 1;
        self.index
    }
}

/// Operation counts served by a [`MemoryStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub gets: u64,
    pub puts: u64,
    pub cas_attempts: u64,
    pub cas_conflicts: u64,
}

/// An in-process [`CoordinationStore`].
///
/// A single mutex makes every operation linearizable, which is the only
/// property the counter and allocator protocols rely on. Each operation
/// yields to the scheduler first so concurrent callers interleave the way
/// they would against a remote store.
///
/// Faults can be injected with [`MemoryStore::force_conflicts`] and
/// [`MemoryStore::set_offline`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    forced_conflicts: AtomicU32,
    offline: AtomicBool,
    gets: AtomicU64,
    puts: AtomicU64,
    cas_attempts: AtomicU64,
    cas_conflicts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a key, as an operator would before clients call `Next` on it.
    pub fn seed(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock();
        let version = inner.bump();
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                version,
            },
        );
    }

    /// Returns the raw value stored under `key`, bypassing the counters.
    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.lock().entries.get(key).map(|e| e.value.clone())
    }

    /// Makes the next `n` compare-and-swap calls fail as if another writer
    /// had changed the key in between.
    pub fn force_conflicts(&self, n: u32) {
        self.forced_conflicts.store(n, Ordering::SeqCst);
    }

    /// While offline, every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns how many operations have been served so far.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            cas_attempts: self.cas_attempts.load(Ordering::Relaxed),
            cas_conflicts: self.cas_conflicts.load(Ordering::Relaxed),
        }
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "memory store is offline".to_string(),
            });
        }
        Ok(())
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CoordinationStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<KvPair>, StoreError> {
        tokio::task::yield_now().await;
        self.check_online()?;
        self.gets.fetch_add(1, Ordering::Relaxed);

        let inner = self.inner.lock();
        Ok(inner.entries.get(key).map(|e| KvPair {
            key: key.to_string(),
            value: e.value.clone(),
            version: e.version,
        }))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.check_online()?;
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.seed(key, value);
        Ok(())
    }

    async fn cas(&self, key: &str, value: &str, version: u64) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        self.check_online()?;
        self.cas_attempts.fetch_add(1, Ordering::Relaxed);

        if self.take_forced_conflict() {
            self.cas_conflicts.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        }

        let mut inner = self.inner.lock();
        let current = inner.entries.get(key).map(|e| e.version);
        let swapped = match current {
            Some(v) if v == version => true,
            None if version == 0 => true,
            _ => false,
        };

        if swapped {
            let version = inner.bump();
            inner.entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    version,
                },
            );
        } else {
            self.cas_conflicts.fetch_add(1, Ordering::Relaxed);
        }
        Ok(swapped)
    }
}
