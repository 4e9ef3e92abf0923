//! Registry of in-flight calls keyed by dedup key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::CancellationToken;
use crate::core::DedupKey;

/// Live cancellation handles grouped by dedup key.
///
/// Each bucket maps a unique, time-ordered id to the handle of one call.
/// A bucket disappears as soon as its last handle is removed. Every
/// read-modify-write happens under one mutex.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    buckets: Mutex<HashMap<DedupKey, HashMap<Uuid, CancellationToken>>>,
}

impl PendingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every live call under `key` and returns how many were cancelled.
    ///
    /// Does not wait for the calls to observe the cancellation; they stay
    /// registered until they settle.
    pub fn cancel_pending(&self, key: DedupKey, reason: &str) -> usize {
        let handles: Vec<CancellationToken> = self
            .buckets
            .lock()
            .get(&key)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default();

        // Callbacks may touch the registry, so cancel outside the lock.
        for handle in &handles {
            handle.cancel(reason);
        }
        handles.len()
    }

    /// Registers a call's handle under `key`.
    ///
    /// The returned guard removes the registration when released or dropped.
    #[must_use]
    pub fn register(self: &Arc<Self>, key: DedupKey, token: CancellationToken) -> PendingGuard {
        let id = Uuid::now_v7();
        self.buckets.lock().entry(key).or_default().insert(id, token);
        debug!(key, %id, "Registered pending call");
        self.guard(key, id)
    }

    /// Registers a call's handle under `key` and cancels every call that was
    /// already registered there.
    ///
    /// Taking the snapshot and inserting the new handle happen under one
    /// lock, so of two racing callers the later one always sees the earlier.
    /// Cancellation runs after the lock is released. Returns how many calls
    /// were cancelled together with the new registration.
    #[must_use]
    pub fn supersede(
        self: &Arc<Self>,
        key: DedupKey,
        token: CancellationToken,
        reason: &str,
    ) -> (usize, PendingGuard) {
        let id = Uuid::now_v7();
        let superseded: Vec<CancellationToken> = {
            let mut buckets = self.buckets.lock();
            let bucket = buckets.entry(key).or_default();
            let previous = bucket.values().cloned().collect();
            bucket.insert(id, token);
            previous
        };
        debug!(key, %id, superseded = superseded.len(), "Registered pending call");

        for handle in &superseded {
            handle.cancel(reason);
        }
        (superseded.len(), self.guard(key, id))
    }

    fn guard(self: &Arc<Self>, key: DedupKey, id: Uuid) -> PendingGuard {
        PendingGuard {
            registry: Arc::clone(self),
            key,
            id,
            released: false,
        }
    }

    fn remove(&self, key: DedupKey, id: Uuid) -> bool {
        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(&key) else {
            return false;
        };
        let removed = bucket.remove(&id).is_some();
        if bucket.is_empty() {
            buckets.remove(&key);
        }
        removed
    }

    /// Returns true if any call is registered under `key`.
    #[must_use]
    pub fn contains_key(&self, key: DedupKey) -> bool {
        self.buckets.lock().contains_key(&key)
    }

    /// Returns the number of calls registered under `key`.
    #[must_use]
    pub fn pending_for(&self, key: DedupKey) -> usize {
        self.buckets.lock().get(&key).map_or(0, HashMap::len)
    }

    /// Returns the number of live buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Returns true if no call is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }
}

/// A single registration in a [`PendingRegistry`].
#[derive(Debug)]
pub struct PendingGuard {
    registry: Arc<PendingRegistry>,
    key: DedupKey,
    id: Uuid,
    released: bool,
}

impl PendingGuard {
    /// The key this registration lives under.
    #[must_use]
    pub const fn key(&self) -> DedupKey {
        self.key
    }

    /// The unique id of this registration.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Removes the registration now.
    ///
    /// Returns false if it was already gone.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.registry.remove(self.key, self.id)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.released {
            self.registry.remove(self.key, self.id);
        }
    }
}
