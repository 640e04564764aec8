//! Booking transition DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Booking;

/// Request body for `PATCH /bookings/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Caller-facing action name: `ACCEPTED`, `ON_THE_WAY`, `IN_PROGRESS`
    /// or `COMPLETED`.
    pub next_status: String,
}

/// One audit-trail entry in the booking projection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusHistoryEntryDto {
    /// Status the booking entered.
    pub status: String,
    /// When the transition occurred.
    pub at: DateTime<Utc>,
}

/// Booking projection returned on successful transitions.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingProjection {
    /// Booking identifier.
    pub id: uuid::Uuid,
    /// Current status string (e.g. `"en_route"`).
    pub status: String,
    /// Append-only status audit trail, oldest first.
    pub status_history: Vec<StatusHistoryEntryDto>,
    /// When the pro accepted, if ever.
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the pro started travelling, if ever.
    pub en_route_at: Option<DateTime<Utc>>,
    /// When the service started, if ever.
    pub started_at: Option<DateTime<Utc>>,
    /// When the work was completed, if ever.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the payment was captured, if ever.
    pub paid_at: Option<DateTime<Utc>>,
    /// Timestamp of the most recent transition.
    pub status_updated_at: Option<DateTime<Utc>>,
    /// Caller of the most recent transition; `null` for capture writes.
    pub status_updated_by: Option<uuid::Uuid>,
}

impl From<Booking> for BookingProjection {
    fn from(booking: Booking) -> Self {
        Self {
            id: *booking.id.as_uuid(),
            status: booking.status.as_db_str().to_string(),
            status_history: booking
                .status_history
                .iter()
                .map(|entry| StatusHistoryEntryDto {
                    status: entry.status.as_db_str().to_string(),
                    at: entry.at,
                })
                .collect(),
            accepted_at: booking.accepted_at,
            en_route_at: booking.en_route_at,
            started_at: booking.started_at,
            completed_at: booking.completed_at,
            paid_at: booking.paid_at,
            status_updated_at: booking.status_updated_at,
            status_updated_by: booking.status_updated_by.map(uuid::Uuid::from),
        }
    }
}
