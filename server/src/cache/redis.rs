//! Redis-based roster cache implementation.
//!
//! Snapshots are stored as JSON under the composite key derived by
//! [`RosterFilter::cache_key`], with a fixed TTL (60 seconds by
//! default). Invalidation scans the event's key prefix so every filter
//! variant is dropped together.

use crate::cache::RosterCache;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use rollcall_core::{AttendeeSummary, CacheConfig, CheckinError, Result, RosterFilter, roster};

/// Redis-backed roster cache.
///
/// Holds a [`ConnectionManager`] for connection pooling; cloning the
/// cache clones the handle, not the connection.
#[derive(Clone)]
pub struct RedisRosterCache {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    /// Snapshot TTL in seconds.
    ttl_seconds: u64,
}

impl RedisRosterCache {
    /// Create a new Redis roster cache.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `config` - TTL configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the connection to Redis fails. This is the
    /// only fallible path in the cache; once constructed, every
    /// operation absorbs its own failures.
    pub async fn new(redis_url: &str, config: &CacheConfig) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CheckinError::Storage(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CheckinError::Storage(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self {
            conn_manager,
            ttl_seconds: config.ttl_seconds,
        })
    }
}

impl RosterCache for RedisRosterCache {
    async fn get(&self, event_id: i64, filter: &RosterFilter) -> Option<Vec<AttendeeSummary>> {
        let mut conn = self.conn_manager.clone();
        let key = filter.cache_key(event_id);

        let cached: Option<String> = match conn.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Roster cache read failed, treating as miss");
                return None;
            }
        };

        let json = cached?;
        match serde_json::from_str(&json) {
            Ok(students) => Some(students),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt roster snapshot, treating as miss");
                None
            }
        }
    }

    async fn put(&self, event_id: i64, filter: &RosterFilter, students: &[AttendeeSummary]) {
        let mut conn = self.conn_manager.clone();
        let key = filter.cache_key(event_id);

        let json = match serde_json::to_string(students) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize roster snapshot");
                return;
            }
        };

        if let Err(e) = conn
            .set_ex::<_, _, ()>(&key, json, self.ttl_seconds)
            .await
        {
            tracing::warn!(key = %key, error = %e, "Roster cache write failed");
        }
    }

    async fn invalidate(&self, event_id: i64) {
        let mut conn = self.conn_manager.clone();
        let pattern = format!("{}*", roster::event_key_prefix(event_id));

        let keys: Vec<String> = match conn.keys(&pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(event_id, error = %e, "Roster cache key scan failed");
                return;
            }
        };

        if keys.is_empty() {
            return;
        }

        match conn.del::<_, ()>(&keys).await {
            Ok(()) => {
                tracing::debug!(event_id, dropped = keys.len(), "Invalidated roster cache");
            }
            Err(e) => {
                tracing::warn!(event_id, error = %e, "Roster cache invalidation failed");
            }
        }
    }
}
