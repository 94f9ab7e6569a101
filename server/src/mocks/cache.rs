//! In-memory roster cache.

use crate::cache::RosterCache;
use rollcall_core::{AttendeeSummary, RosterFilter, roster};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory [`RosterCache`] without expiry.
///
/// Flip [`set_unavailable`](Self::set_unavailable) to simulate a cache
/// outage: reads become misses and writes become no-ops, which is
/// exactly the degradation the real cache promises.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Vec<AttendeeSummary>>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<AttendeeSummary>>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Simulate (or clear) a cache outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no snapshots are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether a snapshot exists for this exact key.
    #[must_use]
    pub fn contains(&self, event_id: i64, filter: &RosterFilter) -> bool {
        self.lock().contains_key(&filter.cache_key(event_id))
    }
}

impl RosterCache for MemoryCache {
    async fn get(&self, event_id: i64, filter: &RosterFilter) -> Option<Vec<AttendeeSummary>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return None;
        }
        self.lock().get(&filter.cache_key(event_id)).cloned()
    }

    async fn put(&self, event_id: i64, filter: &RosterFilter, students: &[AttendeeSummary]) {
        if self.unavailable.load(Ordering::SeqCst) {
            return;
        }
        self.lock()
            .insert(filter.cache_key(event_id), students.to_vec());
    }

    async fn invalidate(&self, event_id: i64) {
        if self.unavailable.load(Ordering::SeqCst) {
            return;
        }
        let prefix = roster::event_key_prefix(event_id);
        self.lock().retain(|key, _| !key.starts_with(&prefix));
    }
}
