//! In-memory attendance store.

use crate::store::{AttendanceStore, InsertOutcome};
use chrono::{DateTime, Utc};
use rollcall_core::{
    AttendanceRecord, AttendeeSummary, EventSummary, NewEvent, Result, RosterFilter, UserProfile,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    events: HashMap<i64, EventSummary>,
    event_qr: HashMap<i64, String>,
    users: HashMap<i64, UserProfile>,
    /// Keyed by (event_id, user_id) — the uniqueness invariant.
    attendance: HashMap<(i64, i64), AttendanceRecord>,
    next_event_id: i64,
    next_attendance_id: i64,
    roster_queries: usize,
}

/// In-memory [`AttendanceStore`].
///
/// Every user is treated as a student for roster purposes. Inserts are
/// atomic with respect to concurrent callers: the whole check-and-insert
/// happens under one lock, mirroring the database's unique constraint.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning only matters if a test panicked mid-mutation;
        // recover with whatever state is there.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed a user.
    pub fn add_user(&self, user: UserProfile) {
        self.lock().users.insert(user.id, user);
    }

    /// Seed an event scheduled at `date`; returns the stored summary.
    pub fn add_event_on(&self, date: DateTime<Utc>) -> EventSummary {
        let mut inner = self.lock();
        inner.next_event_id += 1;
        let event = EventSummary {
            id: inner.next_event_id,
            name: format!("Event {}", inner.next_event_id),
            description: None,
            department: "CS".to_string(),
            date,
            organizer_id: 1,
            created_at: Utc::now(),
        };
        inner.events.insert(event.id, event.clone());
        event
    }

    /// Number of attendance records held for `event_id`.
    #[must_use]
    pub fn attendance_count(&self, event_id: i64) -> usize {
        self.lock()
            .attendance
            .keys()
            .filter(|(e, _)| *e == event_id)
            .count()
    }

    /// How many roster queries have hit storage (for cache-hit tests).
    #[must_use]
    pub fn roster_query_count(&self) -> usize {
        self.lock().roster_queries
    }
}

impl AttendanceStore for MemoryStore {
    async fn find_event(&self, event_id: i64) -> Result<Option<EventSummary>> {
        Ok(self.lock().events.get(&event_id).cloned())
    }

    async fn insert_attendance(&self, event_id: i64, user_id: i64) -> Result<InsertOutcome> {
        let mut inner = self.lock();
        if inner.attendance.contains_key(&(event_id, user_id)) {
            return Ok(InsertOutcome::Duplicate);
        }
        inner.next_attendance_id += 1;
        let record = AttendanceRecord {
            id: inner.next_attendance_id,
            event_id,
            user_id,
            timestamp: Utc::now(),
        };
        inner.attendance.insert((event_id, user_id), record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    async fn already_checked_in(&self, event_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.lock().attendance.contains_key(&(event_id, user_id)))
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn roster(&self, event_id: i64, filter: &RosterFilter) -> Result<Vec<AttendeeSummary>> {
        let mut inner = self.lock();
        inner.roster_queries += 1;

        let mut students: Vec<AttendeeSummary> = inner
            .attendance
            .iter()
            .filter(|((e, _), _)| *e == event_id)
            .filter_map(|((_, user_id), record)| {
                let user = inner.users.get(user_id)?;
                if let Some(division) = &filter.division {
                    if user.division.as_deref() != Some(division) {
                        return None;
                    }
                }
                if let Some(department) = &filter.department {
                    if &user.department != department {
                        return None;
                    }
                }
                Some(AttendeeSummary {
                    id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    roll_no: user.roll_no.clone(),
                    division: user.division.clone(),
                    department: user.department.clone(),
                    timestamp: record.timestamp,
                })
            })
            .collect();

        students.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(students)
    }

    async fn insert_event(&self, organizer_id: i64, event: &NewEvent) -> Result<EventSummary> {
        let mut inner = self.lock();
        inner.next_event_id += 1;
        let event = EventSummary {
            id: inner.next_event_id,
            name: event.name.clone(),
            description: event.description.clone(),
            department: event.department.clone(),
            date: event.date,
            organizer_id,
            created_at: Utc::now(),
        };
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn set_event_qr(&self, event_id: i64, qr: &str) -> Result<()> {
        self.lock().event_qr.insert(event_id, qr.to_string());
        Ok(())
    }

    async fn event_qr(&self, event_id: i64) -> Result<Option<String>> {
        Ok(self.lock().event_qr.get(&event_id).cloned())
    }

    async fn attendee_count(&self, event_id: i64) -> Result<i64> {
        Ok(i64::try_from(self.attendance_count(event_id)).unwrap_or(i64::MAX))
    }
}
