//! Imperative shell of the rollcall attendance service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            HTTP layer (Axum)                 │  ← routes, extractors,
//! │  handlers · router · error mapping           │    SSE framing
//! ├──────────────────────────────────────────────┤
//! │            Check-in pipeline                 │  ← ordered validation,
//! │  token → event → state → insert →            │    race-safe insert,
//! │  cache invalidate → broadcast                │    absorbed side effects
//! ├──────────────┬──────────────┬────────────────┤
//! │  Postgres    │  Redis       │  Broadcast hub │
//! │  (source of  │  (roster     │  (in-process   │
//! │   truth)     │   snapshots) │   fan-out)     │
//! └──────────────┴──────────────┴────────────────┘
//! ```
//!
//! Storage and cache sit behind the [`store::AttendanceStore`] and
//! [`cache::RosterCache`] traits; the `mocks` module provides in-memory
//! doubles so the pipeline is testable at memory speed.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod checkin;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod hub;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
pub mod router;
pub mod state;
pub mod store;

// Re-export key types for convenience
pub use checkin::CheckinPipeline;
pub use error::AppError;
pub use hub::{BroadcastHub, StreamMessage};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
