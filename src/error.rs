//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::BookingStatus;
use crate::domain::booking_id::BookingId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "transition conflict: booking is in state accepted",
///     "details": { "currentStatus": "accepted", "allowedNextStatus": "ON_THE_WAY" }
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details (e.g. current vs. allowed status on
    /// conflicts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1099 | Validation      | 400 Bad Request            |
/// | 1100–1199 | Authentication  | 401 / 403                  |
/// | 2000–2099 | Not Found       | 404 Not Found              |
/// | 2100–2199 | State Conflict  | 409 Conflict               |
/// | 3000–3099 | Server          | 500 Internal Server Error  |
/// | 3100–3199 | Upstream        | 502 Bad Gateway            |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request body or parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller-facing action name was not recognized.
    #[error("unknown transition action: {0}")]
    UnknownAction(String),

    /// No authenticated caller identity was present on the request.
    #[error("no authenticated caller")]
    Unauthenticated,

    /// The caller is authenticated but not allowed to act on this booking.
    #[error("caller is not the assigned pro for this booking")]
    Forbidden,

    /// Booking with the given ID was not found.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The requested transition is not valid from the booking's current
    /// stored state, or the conditional write lost a concurrent race.
    #[error("transition conflict: booking is in state {current}")]
    Conflict {
        /// The booking's actual current status at write time.
        current: BookingStatus,
        /// The single action the caller may request next, if any.
        allowed: Option<&'static str>,
    },

    /// Payment processor or notification backend unavailable.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownAction(_) => 1002,
            Self::Unauthenticated => 1101,
            Self::Forbidden => 1102,
            Self::BookingNotFound(_) => 2001,
            Self::Conflict { .. } => 2101,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::UpstreamFailure(_) => 3101,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnknownAction(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BookingNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns structured details for variants that carry them.
    ///
    /// Conflicts report the booking's actual current status and the single
    /// allowed next action so the caller can recover without guessing.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Conflict { current, allowed } => Some(serde_json::json!({
                "currentStatus": current.as_db_str(),
                "allowedNextStatus": allowed,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
