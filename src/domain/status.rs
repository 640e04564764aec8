//! The booking state graph: states, transition edges, and action mapping.
//!
//! The operational lifecycle is a strict linear chain:
//!
//! ```text
//! requested → accepted → en_route → in_progress → completed_pending_payment → paid
//! ```
//!
//! `cancelled` and `declined` are absorbing states reached through the
//! out-of-scope cancellation flow; they participate in history but have no
//! forward edge here. Everything in this module is pure and I/O-free.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational state of a booking.
///
/// The single source of truth for "where is this booking". Stored in the
/// `status` column and as the discriminator of every history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created by the booking-creation flow; waiting for the pro to accept.
    Requested,
    /// The assigned pro accepted the booking.
    Accepted,
    /// The pro is on the way to the customer.
    EnRoute,
    /// The service is being performed.
    InProgress,
    /// Work finished; payment capture pending.
    CompletedPendingPayment,
    /// Payment captured. Terminal.
    Paid,
    /// Cancelled by either party. Terminal, reached out of scope.
    Cancelled,
    /// Declined by the pro. Terminal, reached out of scope.
    Declined,
}

impl BookingStatus {
    /// Returns the canonical database string for this status.
    #[must_use]
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::EnRoute => "en_route",
            Self::InProgress => "in_progress",
            Self::CompletedPendingPayment => "completed_pending_payment",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Declined => "declined",
        }
    }

    /// Parses a stored status string.
    ///
    /// `"pending"` is accepted as a legacy synonym of `requested` for old
    /// rows; it is never produced on write. Returns `None` for unrecognized
    /// strings.
    #[must_use]
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "requested" | "pending" => Some(Self::Requested),
            "accepted" => Some(Self::Accepted),
            "en_route" => Some(Self::EnRoute),
            "in_progress" => Some(Self::InProgress),
            "completed_pending_payment" => Some(Self::CompletedPendingPayment),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    /// Returns the single permitted successor state, or `None` for terminal
    /// states (`paid`, `cancelled`, `declined`).
    #[must_use]
    pub const fn next_allowed(&self) -> Option<Self> {
        match self {
            Self::Requested => Some(Self::Accepted),
            Self::Accepted => Some(Self::EnRoute),
            Self::EnRoute => Some(Self::InProgress),
            Self::InProgress => Some(Self::CompletedPendingPayment),
            Self::CompletedPendingPayment => Some(Self::Paid),
            Self::Paid | Self::Cancelled | Self::Declined => None,
        }
    }

    /// Returns `true` iff `proposed` is the single allowed successor of
    /// `self`.
    #[must_use]
    pub fn is_valid_transition(&self, proposed: Self) -> bool {
        self.next_allowed() == Some(proposed)
    }

    /// Returns `true` for states with no forward edge.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.next_allowed().is_none()
    }

    /// Caller-facing label for the single allowed next step from this state.
    ///
    /// Uses the action name where a caller action exists (`"ON_THE_WAY"`),
    /// and the status string for the capture-driven `paid` edge. `None` for
    /// terminal states. Used in conflict responses.
    #[must_use]
    pub fn allowed_next_label(&self) -> Option<&'static str> {
        let next = self.next_allowed()?;
        Some(match TransitionAction::for_target(next) {
            Some(action) => action.as_str(),
            None => next.as_db_str(),
        })
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Whether the booking's authorized charge has been captured.
///
/// Updated only by the payment capture coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// Charge authorized but not captured.
    Unpaid,
    /// Charge captured.
    Paid,
}

impl PaymentStatus {
    /// Returns the canonical database string (`"UNPAID"` / `"PAID"`).
    #[must_use]
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
        }
    }

    /// Parses a stored payment status string.
    #[must_use]
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(Self::Unpaid),
            "PAID" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// Caller-facing transition action names, as sent in the request body.
///
/// Total mapping between the wire vocabulary and target states. `paid` has
/// no action: it is reached only through the capture coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    /// `ACCEPTED` → [`BookingStatus::Accepted`].
    Accepted,
    /// `ON_THE_WAY` → [`BookingStatus::EnRoute`].
    OnTheWay,
    /// `IN_PROGRESS` → [`BookingStatus::InProgress`].
    InProgress,
    /// `COMPLETED` → [`BookingStatus::CompletedPendingPayment`].
    Completed,
}

impl TransitionAction {
    /// Parses a caller-facing action name. Returns `None` for anything
    /// outside the fixed vocabulary.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACCEPTED" => Some(Self::Accepted),
            "ON_THE_WAY" => Some(Self::OnTheWay),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns the wire name of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::OnTheWay => "ON_THE_WAY",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Returns the internal state this action requests.
    #[must_use]
    pub const fn target(&self) -> BookingStatus {
        match self {
            Self::Accepted => BookingStatus::Accepted,
            Self::OnTheWay => BookingStatus::EnRoute,
            Self::InProgress => BookingStatus::InProgress,
            Self::Completed => BookingStatus::CompletedPendingPayment,
        }
    }

    /// Reverse lookup: the action that targets `status`, if one exists.
    #[must_use]
    pub const fn for_target(status: BookingStatus) -> Option<Self> {
        match status {
            BookingStatus::Accepted => Some(Self::Accepted),
            BookingStatus::EnRoute => Some(Self::OnTheWay),
            BookingStatus::InProgress => Some(Self::InProgress),
            BookingStatus::CompletedPendingPayment => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
