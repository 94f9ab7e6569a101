//! `PostgreSQL` implementation of the storage collaborator.
//!
//! Queries bind typed parameters; roster narrowing uses NULL-coalesced
//! parameters instead of string-assembled clauses, so the query shape
//! matches the [`RosterFilter`] the cache key is derived from.

use crate::store::{AttendanceStore, InsertOutcome};
use chrono::{DateTime, Utc};
use rollcall_core::{
    AttendanceRecord, AttendeeSummary, CheckinError, EventSummary, NewEvent, Result, RosterFilter,
    UserProfile,
};
use sqlx::PgPool;

/// `PostgreSQL`-backed attendance store.
#[derive(Clone)]
pub struct PostgresStore {
    /// Connection pool.
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: Option<String>,
    department: String,
    date: DateTime<Utc>,
    organizer_id: i64,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for EventSummary {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            department: row.department,
            date: row.date,
            organizer_id: row.organizer_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: i64,
    event_id: i64,
    user_id: i64,
    timestamp: DateTime<Utc>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            timestamp: row.timestamp,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttendeeRow {
    id: i64,
    name: String,
    email: String,
    roll_no: Option<String>,
    division: Option<String>,
    department: String,
    timestamp: DateTime<Utc>,
}

impl From<AttendeeRow> for AttendeeSummary {
    fn from(row: AttendeeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            roll_no: row.roll_no,
            division: row.division,
            department: row.department,
            timestamp: row.timestamp,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    roll_no: Option<String>,
    division: Option<String>,
    department: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            roll_no: row.roll_no,
            division: row.division,
            department: row.department,
        }
    }
}

fn storage_err(e: sqlx::Error) -> CheckinError {
    CheckinError::Storage(e.to_string())
}

impl PostgresStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns a storage error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CheckinError::Storage(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl AttendanceStore for PostgresStore {
    async fn find_event(&self, event_id: i64) -> Result<Option<EventSummary>> {
        let row = sqlx::query_as::<_, EventRow>(
            r"
            SELECT id, name, description, department, date, organizer_id, created_at
            FROM events
            WHERE id = $1
            ",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(EventSummary::from))
    }

    async fn insert_attendance(&self, event_id: i64, user_id: i64) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, AttendanceRow>(
            r"
            INSERT INTO event_attendance (event_id, user_id)
            VALUES ($1, $2)
            RETURNING id, event_id, user_id, timestamp
            ",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok(InsertOutcome::Inserted(row.into())),
            // The UNIQUE(event_id, user_id) constraint decides races:
            // the loser sees 23505, not a partial write.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(storage_err(e)),
        }
    }

    async fn already_checked_in(&self, event_id: i64, user_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM event_attendance WHERE event_id = $1 AND user_id = $2
            )
            ",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(exists)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, roll_no, division, department
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(UserProfile::from))
    }

    async fn roster(&self, event_id: i64, filter: &RosterFilter) -> Result<Vec<AttendeeSummary>> {
        let rows = sqlx::query_as::<_, AttendeeRow>(
            r"
            SELECT u.id, u.name, u.email, u.roll_no, u.division, u.department, ea.timestamp
            FROM users u
            JOIN event_attendance ea ON u.id = ea.user_id
            WHERE ea.event_id = $1
              AND u.role = 'STUDENT'
              AND ($2::text IS NULL OR u.division = $2)
              AND ($3::text IS NULL OR u.department = $3)
            ORDER BY ea.timestamp DESC
            ",
        )
        .bind(event_id)
        .bind(filter.division.as_deref())
        .bind(filter.department.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.into_iter().map(AttendeeSummary::from).collect())
    }

    async fn insert_event(&self, organizer_id: i64, event: &NewEvent) -> Result<EventSummary> {
        let row = sqlx::query_as::<_, EventRow>(
            r"
            INSERT INTO events (name, description, department, date, organizer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, department, date, organizer_id, created_at
            ",
        )
        .bind(&event.name)
        .bind(event.description.as_deref())
        .bind(&event.department)
        .bind(event.date)
        .bind(organizer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.into())
    }

    async fn set_event_qr(&self, event_id: i64, qr: &str) -> Result<()> {
        sqlx::query("UPDATE events SET qr_code = $1 WHERE id = $2")
            .bind(qr)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn event_qr(&self, event_id: i64) -> Result<Option<String>> {
        let qr = sqlx::query_scalar::<_, Option<String>>(
            "SELECT qr_code FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(qr.flatten())
    }

    async fn attendee_count(&self, event_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM event_attendance WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(count)
    }
}
