//! PostgreSQL implementation of the store gateway.
//!
//! The conditional update is a single `UPDATE … WHERE id = $1 AND status =
//! ANY($2)` so the expected-state precondition is enforced by the database
//! atomically with the write.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::booking::{Booking, StatusHistoryEntry, TransitionPatch};
use crate::domain::booking_id::BookingId;
use crate::domain::status::BookingStatus;
use crate::error::GatewayError;

use super::models::{BookingRow, NewNotification};
use super::store::{BookingStore, ConditionalUpdate, NotificationStore};

/// Column list shared by every booking query.
const BOOKING_COLUMNS: &str = "id, customer_id, pro_id, status, status_history, \
     accepted_at, en_route_at, started_at, completed_at, paid_at, \
     payment_intent_id, payment_status, status_updated_at, status_updated_by, created_at";

/// PostgreSQL-backed store gateway using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new store gateway with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Denormalized timestamp column stamped when a booking enters `status`.
const fn timestamp_column(status: BookingStatus) -> Option<&'static str> {
    match status {
        BookingStatus::Accepted => Some("accepted_at"),
        BookingStatus::EnRoute => Some("en_route_at"),
        BookingStatus::InProgress => Some("started_at"),
        BookingStatus::CompletedPendingPayment => Some("completed_at"),
        BookingStatus::Paid => Some("paid_at"),
        BookingStatus::Requested | BookingStatus::Cancelled | BookingStatus::Declined => None,
    }
}

/// Status strings the precondition accepts for `expected`.
///
/// Legacy rows may still carry `"pending"` for the initial state; the guard
/// must match them or old bookings could never be accepted.
const fn expected_aliases(expected: BookingStatus) -> &'static [&'static str] {
    match expected {
        BookingStatus::Requested => &["requested", "pending"],
        BookingStatus::Accepted => &["accepted"],
        BookingStatus::EnRoute => &["en_route"],
        BookingStatus::InProgress => &["in_progress"],
        BookingStatus::CompletedPendingPayment => &["completed_pending_payment"],
        BookingStatus::Paid => &["paid"],
        BookingStatus::Cancelled => &["cancelled"],
        BookingStatus::Declined => &["declined"],
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn load(&self, id: BookingId) -> Result<Option<Booking>, GatewayError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        row.map(Booking::try_from).transpose()
    }

    async fn conditional_update(
        &self,
        id: BookingId,
        expected: BookingStatus,
        patch: TransitionPatch,
    ) -> Result<ConditionalUpdate, GatewayError> {
        let entry = StatusHistoryEntry {
            status: patch.status,
            at: patch.at,
        };
        let entry_json = serde_json::to_value(entry)
            .map_err(|e| GatewayError::Internal(format!("history entry encoding: {e}")))?;

        // The per-state timestamp shares $5 with status_updated_at: one
        // transition, one instant.
        let stamp = match timestamp_column(patch.status) {
            Some(col) => format!(", {col} = $5"),
            None => String::new(),
        };
        let sql = format!(
            "UPDATE bookings SET \
                 status = $3, \
                 status_history = status_history || $4::jsonb, \
                 status_updated_at = $5, \
                 status_updated_by = $6, \
                 payment_status = COALESCE($7, payment_status)\
                 {stamp} \
             WHERE id = $1 AND status = ANY($2) \
             RETURNING {BOOKING_COLUMNS}"
        );

        let aliases: Vec<&str> = expected_aliases(expected).to_vec();
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id.as_uuid())
            .bind(aliases)
            .bind(patch.status.as_db_str())
            .bind(entry_json)
            .bind(patch.at)
            .bind(patch.by.map(uuid::Uuid::from))
            .bind(patch.payment_status.map(|p| p.as_db_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        match row {
            Some(row) => Ok(ConditionalUpdate::Updated(Booking::try_from(row)?)),
            None => Ok(ConditionalUpdate::NoMatch),
        }
    }
}

#[async_trait]
impl NotificationStore for PostgresBookingStore {
    async fn insert_notification(&self, record: &NewNotification) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO notifications (user_id, kind, title, body, booking_id, deep_link) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.user_id.as_uuid())
        .bind(&record.kind)
        .bind(&record.title)
        .bind(&record.body)
        .bind(record.booking_id.as_uuid())
        .bind(&record.deep_link)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(())
    }
}
