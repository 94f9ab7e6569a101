//! Event endpoints: creation, detail, QR fetch, check-in, roster and
//! the live attendance stream.

use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use rollcall_core::{
    qr::render_qr_png, AttendanceRecord, AttendeeSummary, EventSummary, NewAttendance, NewEvent,
    RosterFilter, UserRole,
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AuthenticatedUser;
use crate::hub::{BroadcastHub, Frame};
use crate::state::AppState;
use crate::store::AttendanceStore;
use crate::WebResult;

// ═══════════════════════════════════════════════════════════════════════════
// Event creation
// ═══════════════════════════════════════════════════════════════════════════

/// Response for event creation: the persisted event plus its QR code
/// rendered as a PNG data URL.
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    /// Confirmation text.
    pub message: String,
    /// The event as persisted.
    pub event: EventSummary,
    /// PNG data URL of the signed check-in token.
    pub qr_code: String,
}

/// `POST /api/events`. Organizer and admin only.
///
/// Persists the event, issues its signed token, renders the QR artifact
/// and stores it alongside the event.
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<NewEvent>,
) -> WebResult<(StatusCode, Json<CreateEventResponse>)> {
    if !matches!(user.role, UserRole::Organizer | UserRole::Admin) {
        return Err(AppError::forbidden("Only organizers can create events"));
    }

    let event = state.pipeline.store().insert_event(user.id, &body).await?;
    let token = state.codec.issue(event.id)?;
    let qr_code = render_qr_png(&token)?;
    state.pipeline.store().set_event_qr(event.id, &qr_code).await?;

    tracing::info!(event_id = event.id, organizer_id = user.id, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            message: "Event created successfully".to_owned(),
            event,
            qr_code,
        }),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════
// Event detail and QR fetch
// ═══════════════════════════════════════════════════════════════════════════

/// Response for event detail.
#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    /// The event.
    pub event: EventSummary,
    /// Number of attendance records so far.
    pub attendee_count: i64,
}

/// `GET /api/events/:id`.
pub async fn get_event(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(event_id): Path<i64>,
) -> WebResult<Json<EventDetailResponse>> {
    let store = state.pipeline.store();
    let event = store
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("event", event_id))?;
    let attendee_count = store.attendee_count(event_id).await?;

    Ok(Json(EventDetailResponse {
        event,
        attendee_count,
    }))
}

/// Response for QR fetch.
#[derive(Debug, Serialize)]
pub struct QrResponse {
    /// PNG data URL of the event's signed token.
    pub qr_code: String,
}

/// `GET /api/events/:id/qr`. Students are refused outright; an
/// organizer sees only their own events, which reads as not-found for
/// everyone else's.
pub async fn get_event_qr(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(event_id): Path<i64>,
) -> WebResult<Json<QrResponse>> {
    if user.role == UserRole::Student {
        return Err(AppError::forbidden("Students cannot fetch event QR codes"));
    }

    let store = state.pipeline.store();
    let event = store
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("event", event_id))?;
    if user.role == UserRole::Organizer && event.organizer_id != user.id {
        return Err(AppError::not_found("event", event_id));
    }

    let qr_code = store
        .event_qr(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("QR code for event", event_id))?;

    Ok(Json(QrResponse { qr_code }))
}

// ═══════════════════════════════════════════════════════════════════════════
// Check-in
// ═══════════════════════════════════════════════════════════════════════════

/// Body of a check-in request: the scanned QR payload.
#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    /// Raw token text decoded from the QR image.
    pub qr_data: String,
}

/// Response for a committed check-in.
#[derive(Debug, Serialize)]
pub struct CheckinResponse {
    /// Confirmation text.
    pub message: String,
    /// The committed attendance record.
    pub attendance: AttendanceRecord,
}

/// `POST /api/events/:id/checkin`.
pub async fn check_in(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    Json(body): Json<CheckinRequest>,
) -> WebResult<Json<CheckinResponse>> {
    let NewAttendance { attendance, .. } = state
        .pipeline
        .check_in(event_id, user.id, &body.qr_data)
        .await?;

    Ok(Json(CheckinResponse {
        message: "Checked in successfully".to_owned(),
        attendance,
    }))
}

// ═══════════════════════════════════════════════════════════════════════════
// Roster
// ═══════════════════════════════════════════════════════════════════════════

/// Query string of a roster request. Empty values are treated as
/// absent so `?division=&department=CS` narrows by department only.
#[derive(Debug, Default, Deserialize)]
pub struct RosterQuery {
    /// Restrict to one division.
    pub division: Option<String>,
    /// Restrict to one department.
    pub department: Option<String>,
}

impl RosterQuery {
    fn into_filter(self) -> RosterFilter {
        RosterFilter {
            division: self.division.filter(|v| !v.is_empty()),
            department: self.department.filter(|v| !v.is_empty()),
        }
    }
}

/// Response for a roster read.
#[derive(Debug, Serialize)]
pub struct RosterResponse {
    /// Checked-in students, newest first.
    pub students: Vec<AttendeeSummary>,
    /// Whether the cache satisfied this read.
    pub from_cache: bool,
}

/// `GET /api/events/:id/students`.
pub async fn roster(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    Query(query): Query<RosterQuery>,
) -> WebResult<Json<RosterResponse>> {
    state
        .pipeline
        .store()
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("event", event_id))?;

    let filter = query.into_filter();
    let (students, from_cache) = state.pipeline.roster(event_id, &filter).await?;

    Ok(Json(RosterResponse {
        students,
        from_cache,
    }))
}

// ═══════════════════════════════════════════════════════════════════════════
// Live attendance stream
// ═══════════════════════════════════════════════════════════════════════════

/// Unsubscribes from the hub when the SSE stream is dropped, which is
/// how axum signals client disconnect.
struct StreamGuard {
    hub: BroadcastHub,
    event_id: i64,
    subscriber_id: Uuid,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let hub = self.hub.clone();
        let event_id = self.event_id;
        let subscriber_id = self.subscriber_id;
        tokio::spawn(async move {
            hub.unsubscribe(event_id, subscriber_id).await;
        });
    }
}

fn frame_to_event(frame: Frame) -> Event {
    match frame {
        Frame::Heartbeat => Event::default().comment("heartbeat"),
        Frame::Message(message) => match serde_json::to_string(&message) {
            Ok(json) => Event::default().data(json),
            Err(error) => {
                tracing::warn!(%error, "Dropping unserializable stream message");
                Event::default().comment("skipped")
            }
        },
    }
}

/// `GET /api/events/:id/attendance-stream`. Students are refused; the
/// live view is for faculty, organizers and admins.
pub async fn attendance_stream(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(event_id): Path<i64>,
) -> WebResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if !user.role.can_view_live_attendance() {
        return Err(AppError::forbidden(
            "Students cannot view the live attendance stream",
        ));
    }

    state
        .pipeline
        .store()
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("event", event_id))?;

    let subscription = state.hub.subscribe(event_id).await;
    tracing::info!(
        event_id,
        subscriber_id = %subscription.id,
        user_id = user.id,
        "Attendance stream opened"
    );

    let guard = StreamGuard {
        hub: state.hub.clone(),
        event_id,
        subscriber_id: subscription.id,
    };
    let stream = ReceiverStream::new(subscription.frames).map(move |frame| {
        // Tie the guard's lifetime to the stream so dropping the
        // response unsubscribes.
        let _ = &guard;
        Ok::<Event, Infallible>(frame_to_event(frame))
    });

    Ok(Sse::new(stream))
}
