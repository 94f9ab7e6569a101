//! Roster cache collaborator.
//!
//! Roster reads are dashboard-heavy and check-ins comparatively rare,
//! so snapshots are cached under a short TTL and invalidated on every
//! write. The cache is an optimization, never authoritative: every
//! failure mode degrades to a miss or a no-op and must not surface to
//! the caller.

pub mod redis;

pub use redis::RedisRosterCache;

use rollcall_core::{AttendeeSummary, RosterFilter};

/// Read-through cache for roster snapshots, keyed by
/// `(event, filter-set)`.
///
/// Implementations absorb their own failures: `get` reports a miss,
/// `put` and `invalidate` log and return. None of the three may fail
/// the surrounding request.
pub trait RosterCache: Send + Sync {
    /// Fetch a snapshot, if present and unexpired. A cache failure is a
    /// miss.
    fn get(
        &self,
        event_id: i64,
        filter: &RosterFilter,
    ) -> impl Future<Output = Option<Vec<AttendeeSummary>>> + Send;

    /// Store a snapshot under the composite key with the configured TTL.
    fn put(
        &self,
        event_id: i64,
        filter: &RosterFilter,
        students: &[AttendeeSummary],
    ) -> impl Future<Output = ()> + Send;

    /// Drop every cached variant for the event, regardless of filter
    /// suffix. Called synchronously on every successful check-in,
    /// before the response is returned.
    fn invalidate(&self, event_id: i64) -> impl Future<Output = ()> + Send;
}
