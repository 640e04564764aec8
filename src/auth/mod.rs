//! Caller identity and the transition authorization check.
//!
//! The upstream session provider authenticates requests and injects the
//! caller's identity as `x-user-id` / `x-user-role` headers; this module
//! only consumes that boundary. Authorization is re-verified on every
//! request, never cached across calls.
//!
//! The capture-driven `paid` write needs no caller check: it runs inside
//! the coordinator, which is a trusted internal caller by construction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::Booking;
use crate::domain::booking_id::UserId;
use crate::error::GatewayError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role claim.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role claim of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A service professional.
    Pro,
    /// A customer.
    Customer,
}

impl Role {
    /// Parses a role claim string. Returns `None` for unknown roles.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pro" => Some(Self::Pro),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }
}

/// Authenticated caller identity, extracted per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's role claim.
    pub role: Role,
}

impl CallerIdentity {
    /// Succeeds only if the caller is a pro and is the pro assigned to
    /// `booking`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] on role or ownership mismatch.
    pub fn ensure_assigned_pro(&self, booking: &Booking) -> Result<(), GatewayError> {
        if self.role == Role::Pro && self.user_id == booking.pro_id {
            Ok(())
        } else {
            Err(GatewayError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<uuid::Uuid>().ok())
            .map(UserId::from_uuid)
            .ok_or(GatewayError::Unauthenticated)?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or(GatewayError::Unauthenticated)?;

        Ok(Self { user_id, role })
    }
}
