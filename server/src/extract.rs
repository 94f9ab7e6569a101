//! Custom Axum extractors.
//!
//! Authentication is an external collaborator: a fronting auth layer
//! verifies credentials and forwards the caller's identity in trusted
//! headers. This module only consumes that identity; it never checks
//! credentials itself.

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use rollcall_core::UserRole;
use std::str::FromStr;

/// Identity of the authenticated caller.
///
/// Extracted from the `X-User-Id`, `X-User-Role` and `X-User-Department`
/// headers populated by the fronting auth layer.
///
/// # Example
///
/// ```ignore
/// async fn handler(user: AuthenticatedUser) -> String {
///     format!("user {} ({})", user.id, user.role.as_str())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User id.
    pub id: i64,
    /// Role, used by role-gate predicates.
    pub role: UserRole,
    /// Department of the caller.
    pub department: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        let id = header("X-User-Id")
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| AppError::unauthorized("Missing or invalid X-User-Id header"))?;

        let role = header("X-User-Role")
            .and_then(|v| UserRole::from_str(&v).ok())
            .ok_or_else(|| AppError::unauthorized("Missing or invalid X-User-Role header"))?;

        let department = header("X-User-Department").unwrap_or_default();

        Ok(Self {
            id,
            role,
            department,
        })
    }
}
