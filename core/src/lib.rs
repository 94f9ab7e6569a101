//! Domain layer for the rollcall attendance service.
//!
//! This crate holds everything that can be computed without I/O:
//!
//! - **Token codec** ([`token::TokenCodec`]) — signs and verifies the
//!   compact, time-boxed payload that binds a QR scan to one event.
//! - **QR encoder** ([`qr::render_qr_png`]) — renders a signed token as a
//!   scannable PNG data URL.
//! - **Roster filters** ([`roster::RosterFilter`]) — typed filter object
//!   plus the composite cache-key derivation used by the roster cache.
//! - **Domain models** ([`model`]) — events, attendance records and
//!   attendee summaries shared between storage, cache and wire formats.
//! - **Error taxonomy** ([`error::CheckinError`]) — the expected failure
//!   modes of a check-in attempt.
//! - **Configuration** ([`config`]) — builder-style knobs with the
//!   reference defaults (24h token validity, 1-day check-in grace
//!   window, 60s roster cache TTL, 30s heartbeat).
//!
//! The imperative shell (HTTP, Postgres, Redis, SSE) lives in
//! `rollcall-server` and consumes these types.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod model;
pub mod qr;
pub mod roster;
pub mod token;

// Re-export key types for convenience
pub use config::{CacheConfig, CheckinConfig, HubConfig, TokenConfig};
pub use error::{CheckinError, QrError, Result};
pub use model::{
    AttendanceRecord, AttendeeSummary, EventSummary, NewAttendance, NewEvent, UserProfile, UserRole,
};
pub use roster::RosterFilter;
pub use token::{QrToken, SignError, TokenCodec};
