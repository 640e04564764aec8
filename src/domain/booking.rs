//! The booking entity and the patch applied by a state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking_id::{BookingId, UserId};
use super::status::{BookingStatus, PaymentStatus};

/// One entry of the append-only status audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// Status the booking entered.
    pub status: BookingStatus,
    /// When the transition occurred.
    pub at: DateTime<Utc>,
}

/// A customer–pro service engagement and its lifecycle state.
///
/// Created out of scope in [`BookingStatus::Requested`], mutated exclusively
/// through the transition orchestrator, never deleted.
///
/// Invariants:
/// - `status` equals the status of the last `status_history` entry.
/// - Each per-transition timestamp is set iff the booking has passed through
///   that state, and is never cleared.
/// - `payment_status == Paid` implies `status == Paid` and `paid_at` set.
/// - `pro_id` never changes once the booking has left `requested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Opaque unique identifier.
    pub id: BookingId,
    /// Owning customer. Immutable after creation.
    pub customer_id: UserId,
    /// Assigned pro. Immutable after creation.
    pub pro_id: UserId,
    /// Current operational state.
    pub status: BookingStatus,
    /// Append-only audit trail, monotonically non-decreasing in time.
    pub status_history: Vec<StatusHistoryEntry>,
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
    /// Externally authorized charge, created before this subsystem runs.
    pub payment_intent_id: Option<String>,
    /// Capture state of the authorized charge.
    pub payment_status: PaymentStatus,
    /// Timestamp of the most recent transition.
    pub status_updated_at: Option<DateTime<Utc>>,
    /// Caller that triggered the most recent transition; `None` for
    /// system-driven writes (payment capture).
    pub status_updated_by: Option<UserId>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a fresh booking in `requested` with a single history entry,
    /// as the out-of-scope creation flow would.
    #[must_use]
    pub fn new_requested(
        id: BookingId,
        customer_id: UserId,
        pro_id: UserId,
        payment_intent_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            pro_id,
            status: BookingStatus::Requested,
            status_history: vec![StatusHistoryEntry {
                status: BookingStatus::Requested,
                at: created_at,
            }],
            accepted_at: None,
            en_route_at: None,
            started_at: None,
            completed_at: None,
            paid_at: None,
            payment_intent_id,
            payment_status: PaymentStatus::Unpaid,
            status_updated_at: None,
            status_updated_by: None,
            created_at,
        }
    }

    /// Returns the last history entry, if any.
    #[must_use]
    pub fn last_history_entry(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.last()
    }

    /// Applies a transition patch in memory: appends the history entry,
    /// advances `status`, stamps the per-state timestamp and the
    /// `status_updated_*` metadata.
    ///
    /// Mirrors exactly what the store's conditional `UPDATE` does to the
    /// row. The caller is responsible for having validated the transition.
    pub fn apply(&mut self, patch: &TransitionPatch) {
        self.status = patch.status;
        self.status_history.push(StatusHistoryEntry {
            status: patch.status,
            at: patch.at,
        });
        match patch.status {
            BookingStatus::Accepted => self.accepted_at = Some(patch.at),
            BookingStatus::EnRoute => self.en_route_at = Some(patch.at),
            BookingStatus::InProgress => self.started_at = Some(patch.at),
            BookingStatus::CompletedPendingPayment => self.completed_at = Some(patch.at),
            BookingStatus::Paid => self.paid_at = Some(patch.at),
            BookingStatus::Requested | BookingStatus::Cancelled | BookingStatus::Declined => {}
        }
        self.status_updated_at = Some(patch.at);
        self.status_updated_by = patch.by;
        if let Some(payment_status) = patch.payment_status {
            self.payment_status = payment_status;
        }
    }
}

/// The single-row change a transition performs.
///
/// Carried to the store gateway together with the expected current state so
/// the precondition rides with the write itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPatch {
    /// Target status.
    pub status: BookingStatus,
    /// Transition instant: history entry, per-state timestamp and
    /// `status_updated_at` all use this one value.
    pub at: DateTime<Utc>,
    /// Caller that triggered the transition; `None` for the capture write.
    pub by: Option<UserId>,
    /// New payment status, set only by the capture coordinator.
    pub payment_status: Option<PaymentStatus>,
}

impl TransitionPatch {
    /// Patch for a caller-triggered transition into `target`.
    #[must_use]
    pub const fn transition(target: BookingStatus, at: DateTime<Utc>, by: UserId) -> Self {
        Self {
            status: target,
            at,
            by: Some(by),
            payment_status: None,
        }
    }

    /// Patch for the capture-driven `completed_pending_payment → paid`
    /// write: flips the payment status alongside the state.
    #[must_use]
    pub const fn capture_settled(at: DateTime<Utc>) -> Self {
        Self {
            status: BookingStatus::Paid,
            at,
            by: None,
            payment_status: Some(PaymentStatus::Paid),
        }
    }
}
