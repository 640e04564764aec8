//! Database row models and their conversions to domain types.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::booking::{Booking, StatusHistoryEntry};
use crate::domain::booking_id::{BookingId, UserId};
use crate::domain::status::{BookingStatus, PaymentStatus};
use crate::error::GatewayError;

/// A booking row from the `bookings` table.
///
/// `status` and `payment_status` are stored as strings and parsed into
/// their enums on conversion; `status_history` is a JSONB array appended
/// with `||` on every transition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning customer.
    pub customer_id: Uuid,
    /// Assigned pro.
    pub pro_id: Uuid,
    /// Current status string.
    pub status: String,
    /// Append-only audit trail.
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    /// Set when the pro accepted.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Set when the pro started travelling.
    pub en_route_at: Option<DateTime<Utc>>,
    /// Set when the service started.
    pub started_at: Option<DateTime<Utc>>,
    /// Set when the work completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set when the payment was captured.
    pub paid_at: Option<DateTime<Utc>>,
    /// Externally authorized charge reference.
    pub payment_intent_id: Option<String>,
    /// `"UNPAID"` or `"PAID"`.
    pub payment_status: String,
    /// Metadata of the most recent transition.
    pub status_updated_at: Option<DateTime<Utc>>,
    /// Caller of the most recent transition; NULL for capture writes.
    pub status_updated_by: Option<Uuid>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = GatewayError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::from_db_str(&row.status).ok_or_else(|| {
            GatewayError::Internal(format!("unrecognized status in row {}: {}", row.id, row.status))
        })?;
        let payment_status = PaymentStatus::from_db_str(&row.payment_status).ok_or_else(|| {
            GatewayError::Internal(format!(
                "unrecognized payment status in row {}: {}",
                row.id, row.payment_status
            ))
        })?;

        Ok(Self {
            id: BookingId::from_uuid(row.id),
            customer_id: UserId::from_uuid(row.customer_id),
            pro_id: UserId::from_uuid(row.pro_id),
            status,
            status_history: row.status_history.0,
            accepted_at: row.accepted_at,
            en_route_at: row.en_route_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            paid_at: row.paid_at,
            payment_intent_id: row.payment_intent_id,
            payment_status,
            status_updated_at: row.status_updated_at,
            status_updated_by: row.status_updated_by.map(UserId::from_uuid),
            created_at: row.created_at,
        })
    }
}

/// A notification record to insert, one per notified party.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Notification kind discriminator (e.g. `"booking_status"`).
    pub kind: String,
    /// Short title shown to the user.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Booking the notification concerns.
    pub booking_id: BookingId,
    /// In-app deep link target.
    pub deep_link: String,
}
