//! Domain models shared between storage, cache and wire formats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of an authenticated user, as supplied by the external auth
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Attends events by scanning QR codes.
    Student,
    /// Views rosters and live attendance.
    Faculty,
    /// Creates events and owns their QR codes.
    Organizer,
    /// Full access.
    Admin,
}

impl UserRole {
    /// Role-gate predicate for the live attendance stream: everyone but
    /// students may watch.
    #[must_use]
    pub const fn can_view_live_attendance(self) -> bool {
        !matches!(self, Self::Student)
    }

    /// Canonical wire spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Faculty => "FACULTY",
            Self::Organizer => "ORGANIZER",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "FACULTY" => Ok(Self::Faculty),
            "ORGANIZER" => Ok(Self::Organizer),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

/// An event as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event id.
    pub id: i64,
    /// Event name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Department hosting the event.
    pub department: String,
    /// Scheduled date. Check-ins are accepted until this plus the
    /// configured grace window.
    pub date: DateTime<Utc>,
    /// User id of the organizer who created the event.
    pub organizer_id: i64,
    /// Creation time, server-assigned.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new event.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    /// Event name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Department hosting the event.
    pub department: String,
    /// Scheduled date.
    pub date: DateTime<Utc>,
}

/// A persisted attendance fact. Created once per (event, user) pair and
/// never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Record id.
    pub id: i64,
    /// Event attended.
    pub event_id: i64,
    /// Attending user.
    pub user_id: i64,
    /// Check-in time, server-assigned.
    pub timestamp: DateTime<Utc>,
}

/// Identity of a user, as carried in broadcast payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Roll number, if recorded.
    pub roll_no: Option<String>,
    /// Division, if recorded.
    pub division: Option<String>,
    /// Department.
    pub department: String,
}

/// One attendee row in a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeSummary {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Roll number, if recorded.
    pub roll_no: Option<String>,
    /// Division, if recorded.
    pub division: Option<String>,
    /// Department.
    pub department: String,
    /// Check-in time for the event the roster belongs to.
    pub timestamp: DateTime<Utc>,
}

/// Payload broadcast to live viewers when a check-in commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttendance {
    /// The persisted attendance record.
    pub attendance: AttendanceRecord,
    /// Identity of the attendee, for display without a follow-up query.
    pub user: UserProfile,
}
