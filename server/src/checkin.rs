//! Check-in state machine and roster read-through.
//!
//! A (event, user) pair moves `NOT_CHECKED_IN -> CHECKED_IN` exactly
//! once; there is no reverse transition. The transition runs a strictly
//! ordered sequence: token verification, event-id match, event
//! liveness, duplicate check, atomic insert, cache invalidation,
//! broadcast. The first four steps are pure validation and fail fast
//! with no side effects; the insert delegates race safety to storage's
//! uniqueness constraint; the last two are absorbed side effects that
//! can never un-commit a check-in.

use crate::cache::RosterCache;
use crate::hub::{BroadcastHub, StreamMessage};
use crate::store::{AttendanceStore, InsertOutcome};
use chrono::Utc;
use rollcall_core::{
    AttendeeSummary, CheckinConfig, CheckinError, NewAttendance, Result, RosterFilter, TokenCodec,
};

/// Orchestrates check-ins and cached roster reads over abstract storage
/// and cache collaborators.
#[derive(Clone)]
pub struct CheckinPipeline<S, C> {
    store: S,
    cache: C,
    hub: BroadcastHub,
    codec: TokenCodec,
    config: CheckinConfig,
}

impl<S, C> CheckinPipeline<S, C>
where
    S: AttendanceStore,
    C: RosterCache,
{
    /// Assemble a pipeline.
    pub const fn new(
        store: S,
        cache: C,
        hub: BroadcastHub,
        codec: TokenCodec,
        config: CheckinConfig,
    ) -> Self {
        Self {
            store,
            cache,
            hub,
            codec,
            config,
        }
    }

    /// Storage collaborator, for callers needing direct reads.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Process one scan of `qr_data` by `user_id` against `event_id`.
    ///
    /// # Errors
    ///
    /// - [`CheckinError::InvalidToken`] — signature, expiry or format
    ///   failure.
    /// - [`CheckinError::TokenEventMismatch`] — token valid, wrong
    ///   event.
    /// - [`CheckinError::EventNotActive`] — event missing or past the
    ///   grace window.
    /// - [`CheckinError::AlreadyCheckedIn`] — duplicate attempt,
    ///   including the loser of a concurrent race.
    /// - [`CheckinError::Storage`] — storage fault.
    pub async fn check_in(
        &self,
        event_id: i64,
        user_id: i64,
        qr_data: &str,
    ) -> Result<NewAttendance> {
        // 1. Signature and expiry.
        let token = self
            .codec
            .verify(qr_data)
            .ok_or(CheckinError::InvalidToken)?;

        // 2. The token must have been issued for this event.
        if token.event_id != event_id {
            return Err(CheckinError::TokenEventMismatch);
        }

        // 3. The event must exist and still accept check-ins.
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(CheckinError::EventNotActive)?;
        if event.date + self.config.grace_window < Utc::now() {
            return Err(CheckinError::EventNotActive);
        }

        // 4. Fast-path duplicate check. Races slipping past this are
        //    caught by the insert below.
        if self.store.already_checked_in(event_id, user_id).await? {
            return Err(CheckinError::AlreadyCheckedIn);
        }

        // 5. Atomic insert; the uniqueness constraint arbitrates races.
        let record = match self.store.insert_attendance(event_id, user_id).await? {
            InsertOutcome::Inserted(record) => record,
            InsertOutcome::Duplicate => return Err(CheckinError::AlreadyCheckedIn),
        };

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| CheckinError::Storage(format!("user {user_id} missing after insert")))?;

        tracing::info!(
            event_id,
            user_id,
            attendance_id = record.id,
            "Check-in committed"
        );

        // 6. Post-commit side effects. Cache and broadcast failures are
        //    absorbed by their layers; the check-in is already durable.
        self.cache.invalidate(event_id).await;

        let attendance = NewAttendance {
            attendance: record,
            user,
        };
        self.hub
            .broadcast(event_id, StreamMessage::new_attendance(attendance.clone()))
            .await;

        Ok(attendance)
    }

    /// Roster read-through: serve from cache when a fresh snapshot
    /// exists, otherwise query storage and repopulate.
    ///
    /// Returns the roster and whether the cache satisfied the request.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::Storage`] only for storage faults; cache
    /// faults degrade to a storage read.
    pub async fn roster(
        &self,
        event_id: i64,
        filter: &RosterFilter,
    ) -> Result<(Vec<AttendeeSummary>, bool)> {
        if let Some(students) = self.cache.get(event_id, filter).await {
            return Ok((students, true));
        }

        let students = self.store.roster(event_id, filter).await?;
        self.cache.put(event_id, filter, &students).await;
        Ok((students, false))
    }
}
