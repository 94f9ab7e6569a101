//! Storage collaborator.
//!
//! The relational store is the source of truth for users, events and
//! attendance. The check-in pipeline and handlers consume it through
//! the [`AttendanceStore`] trait; `PostgresStore` is the production
//! implementation and `mocks::MemoryStore` the in-memory double.
//!
//! The one invariant the store must enforce itself is
//! `UNIQUE(event_id, user_id)` on attendance: when two check-in
//! attempts for the same pair race, exactly one insert commits and the
//! others observe [`InsertOutcome::Duplicate`].

pub mod postgres;

pub use postgres::PostgresStore;

use rollcall_core::{
    AttendanceRecord, AttendeeSummary, EventSummary, NewEvent, Result, RosterFilter, UserProfile,
};

/// Outcome of an attendance insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was created; this caller won the (event, user) slot.
    Inserted(AttendanceRecord),
    /// The pair already holds a record (pre-existing or lost race).
    Duplicate,
}

/// Abstract operations the attendance core needs from storage.
pub trait AttendanceStore: Send + Sync {
    /// Look up an event by id.
    fn find_event(&self, event_id: i64) -> impl Future<Output = Result<Option<EventSummary>>> + Send;

    /// Atomically create an attendance record for `(event_id, user_id)`.
    ///
    /// The uniqueness constraint decides races; a conflicting insert
    /// reports [`InsertOutcome::Duplicate`] instead of an error.
    fn insert_attendance(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> impl Future<Output = Result<InsertOutcome>> + Send;

    /// Whether `(event_id, user_id)` already holds an attendance record.
    fn already_checked_in(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Look up a user's identity for broadcast payloads.
    fn find_user(&self, user_id: i64) -> impl Future<Output = Result<Option<UserProfile>>> + Send;

    /// Checked-in students for an event, newest first, narrowed by the
    /// typed filter.
    fn roster(
        &self,
        event_id: i64,
        filter: &RosterFilter,
    ) -> impl Future<Output = Result<Vec<AttendeeSummary>>> + Send;

    /// Create a new event owned by `organizer_id`.
    fn insert_event(
        &self,
        organizer_id: i64,
        event: &NewEvent,
    ) -> impl Future<Output = Result<EventSummary>> + Send;

    /// Attach the rendered QR artifact to an event.
    fn set_event_qr(&self, event_id: i64, qr: &str) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the stored QR artifact for an event, if any.
    fn event_qr(&self, event_id: i64) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Number of attendance records for an event.
    fn attendee_count(&self, event_id: i64) -> impl Future<Output = Result<i64>> + Send;
}
