//! Application state shared across all HTTP handlers.

use crate::cache::RedisRosterCache;
use crate::checkin::CheckinPipeline;
use crate::hub::BroadcastHub;
use crate::store::PostgresStore;
use rollcall_core::TokenCodec;

/// Pipeline instantiated with the production collaborators.
pub type ProductionPipeline = CheckinPipeline<PostgresStore, RedisRosterCache>;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Check-in pipeline over Postgres and Redis.
    pub pipeline: ProductionPipeline,
    /// Live-view fan-out hub.
    pub hub: BroadcastHub,
    /// Token codec, used at event creation to issue the QR token.
    pub codec: TokenCodec,
}

impl AppState {
    /// Assemble the application state.
    #[must_use]
    pub const fn new(pipeline: ProductionPipeline, hub: BroadcastHub, codec: TokenCodec) -> Self {
        Self {
            pipeline,
            hub,
            codec,
        }
    }
}
