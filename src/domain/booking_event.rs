//! Domain events published after successful booking mutations.

use chrono::{DateTime, Utc};

use super::booking_id::{BookingId, UserId};
use super::status::BookingStatus;

/// An event describing a committed booking mutation.
///
/// Published on the [`super::EventBus`] after the conditional write has
/// succeeded, never before. The notification dispatcher is the primary
/// subscriber; other backend flows may subscribe for lifecycle awareness.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingEvent {
    /// The booking entered a new operational state.
    StatusChanged {
        /// Booking that transitioned.
        booking_id: BookingId,
        /// Customer party, for notification targeting.
        customer_id: UserId,
        /// Pro party, for notification targeting.
        pro_id: UserId,
        /// The state the booking entered.
        status: BookingStatus,
        /// Transition instant.
        timestamp: DateTime<Utc>,
    },
    /// The authorized charge was captured and the booking marked paid.
    PaymentCaptured {
        /// Booking whose charge was captured.
        booking_id: BookingId,
        /// Customer party.
        customer_id: UserId,
        /// Pro party.
        pro_id: UserId,
        /// Capture instant.
        timestamp: DateTime<Utc>,
    },
}

impl BookingEvent {
    /// Returns the booking this event concerns.
    #[must_use]
    pub const fn booking_id(&self) -> BookingId {
        match self {
            Self::StatusChanged { booking_id, .. } | Self::PaymentCaptured { booking_id, .. } => {
                *booking_id
            }
        }
    }

    /// Returns the event type discriminator string, for logs.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::PaymentCaptured { .. } => "payment_captured",
        }
    }
}
