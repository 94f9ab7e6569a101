//! Error taxonomy for check-in and QR operations.

use thiserror::Error;

/// Result type alias for check-in operations.
pub type Result<T> = std::result::Result<T, CheckinError>;

/// Expected failure modes of a check-in attempt.
///
/// The first four variants are terminal validation outcomes returned to
/// the scanning client with a distinguishing status and message; none of
/// them leaves any state behind. Cache and broadcast failures are *not*
/// part of this taxonomy — they are absorbed where they occur and never
/// fail a check-in that already committed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckinError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════

    /// Token is malformed, expired or carries a bad signature.
    #[error("Invalid or expired QR code")]
    InvalidToken,

    /// Token is valid but was issued for a different event.
    #[error("QR code does not match the event")]
    TokenEventMismatch,

    /// Event does not exist or its date is past the check-in grace window.
    #[error("Event not found or no longer active")]
    EventNotActive,

    /// The (event, user) pair already holds an attendance record.
    #[error("You are already checked in to this event")]
    AlreadyCheckedIn,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CheckinError {
    /// Returns `true` if this error is a normal validation outcome caused
    /// by the scanning user, as opposed to a system fault.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rollcall_core::CheckinError;
    /// assert!(CheckinError::AlreadyCheckedIn.is_user_error());
    /// assert!(!CheckinError::Storage("down".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken
                | Self::TokenEventMismatch
                | Self::EventNotActive
                | Self::AlreadyCheckedIn
        )
    }
}

/// QR rendering failure.
///
/// Encoding is a pure transform; the only way it fails is a payload the
/// symbology cannot hold (or a raster that cannot be serialized), and
/// that is reported rather than swallowed.
#[derive(Debug, Error)]
pub enum QrError {
    /// The token string does not fit into a QR symbol.
    #[error("Payload cannot be encoded as a QR code: {0}")]
    Encode(String),

    /// The rendered raster could not be serialized to PNG.
    #[error("Failed to serialize QR image: {0}")]
    Image(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_user_errors() {
        assert!(CheckinError::InvalidToken.is_user_error());
        assert!(CheckinError::TokenEventMismatch.is_user_error());
        assert!(CheckinError::EventNotActive.is_user_error());
        assert!(CheckinError::AlreadyCheckedIn.is_user_error());
    }

    #[test]
    fn storage_error_is_not_a_user_error() {
        assert!(!CheckinError::Storage("connection refused".into()).is_user_error());
    }

    #[test]
    fn messages_are_actionable() {
        assert_eq!(
            CheckinError::InvalidToken.to_string(),
            "Invalid or expired QR code"
        );
        assert_eq!(
            CheckinError::AlreadyCheckedIn.to_string(),
            "You are already checked in to this event"
        );
    }
}
