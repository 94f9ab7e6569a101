//! Route table.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{events, health};
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/events", post(events::create_event))
        .route("/api/events/:id", get(events::get_event))
        .route("/api/events/:id/qr", get(events::get_event_qr))
        .route("/api/events/:id/checkin", post(events::check_in))
        .route("/api/events/:id/students", get(events::roster))
        .route(
            "/api/events/:id/attendance-stream",
            get(events::attendance_stream),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
