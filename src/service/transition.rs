//! Transition orchestrator: the one write path for booking state.
//!
//! Validates the request against the state graph, delegates the guarded
//! write to the store gateway, and on the terminal business transition
//! hands off to the capture coordinator. Publishes an event per committed
//! mutation; everything user-facing (notifications) hangs off the bus, not
//! off this path.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::CallerIdentity;
use crate::domain::booking::{Booking, TransitionPatch};
use crate::domain::booking_id::BookingId;
use crate::domain::status::{BookingStatus, TransitionAction};
use crate::domain::{BookingEvent, EventBus};
use crate::error::GatewayError;
use crate::persistence::store::{BookingStore, ConditionalUpdate};

use super::capture::{CaptureCoordinator, CaptureOutcome};

/// Coordinator for all booking state transitions.
///
/// Stateless: owns the store gateway for persistence, the capture
/// coordinator for the payment leg, and the event bus for post-commit
/// fan-out. Guarantees at most one valid transition per request; a losing
/// concurrent writer is told [`GatewayError::Conflict`] and must re-fetch,
/// never silently retried.
#[derive(Debug)]
pub struct TransitionService {
    store: Arc<dyn BookingStore>,
    capture: Arc<CaptureCoordinator>,
    event_bus: EventBus,
}

impl TransitionService {
    /// Creates a new transition service.
    #[must_use]
    pub fn new(
        store: Arc<dyn BookingStore>,
        capture: Arc<CaptureCoordinator>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            capture,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the capture coordinator, for the
    /// reconciliation entry point.
    #[must_use]
    pub fn capture_coordinator(&self) -> &Arc<CaptureCoordinator> {
        &self.capture
    }

    /// Advances a booking by one state, as requested by `action`.
    ///
    /// Returns the booking after the transition; when the transition was
    /// into `completed_pending_payment` and the capture settled inline,
    /// the returned booking is already `paid`. A capture failure does not
    /// fail this operation.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::BookingNotFound`] if no such booking exists.
    /// - [`GatewayError::Forbidden`] if the caller is not the assigned pro.
    /// - [`GatewayError::Conflict`] if the requested state is not the
    ///   single allowed successor of the stored state, or the conditional
    ///   write lost a concurrent race. The error reports the actual
    ///   current state and the allowed next action.
    /// - [`GatewayError::Persistence`] on store failure; the conditional
    ///   write is atomic, so a failed operation has no partial effect.
    pub async fn advance(
        &self,
        booking_id: BookingId,
        action: TransitionAction,
        caller: &CallerIdentity,
    ) -> Result<Booking, GatewayError> {
        let booking = self
            .store
            .load(booking_id)
            .await?
            .ok_or(GatewayError::BookingNotFound(booking_id))?;

        caller.ensure_assigned_pro(&booking)?;

        let target = action.target();
        if !booking.status.is_valid_transition(target) {
            return Err(GatewayError::Conflict {
                current: booking.status,
                allowed: booking.status.allowed_next_label(),
            });
        }

        let patch = TransitionPatch::transition(target, Utc::now(), caller.user_id);
        let updated = match self
            .store
            .conditional_update(booking_id, booking.status, patch)
            .await?
        {
            ConditionalUpdate::Updated(updated) => updated,
            ConditionalUpdate::NoMatch => {
                // Lost the race between load and write. Report the true
                // current state so the caller can recover without guessing.
                let fresh = self
                    .store
                    .load(booking_id)
                    .await?
                    .ok_or(GatewayError::BookingNotFound(booking_id))?;
                return Err(GatewayError::Conflict {
                    current: fresh.status,
                    allowed: fresh.status.allowed_next_label(),
                });
            }
        };

        tracing::info!(
            booking_id = %booking_id,
            status = %updated.status,
            caller = %caller.user_id,
            "booking transitioned"
        );

        let _ = self.event_bus.publish(BookingEvent::StatusChanged {
            booking_id: updated.id,
            customer_id: updated.customer_id,
            pro_id: updated.pro_id,
            status: updated.status,
            timestamp: updated.status_updated_at.unwrap_or_else(Utc::now),
        });

        if updated.status == BookingStatus::CompletedPendingPayment {
            return Ok(match self.capture.settle(&updated).await {
                CaptureOutcome::Settled(paid) => paid,
                CaptureOutcome::Deferred => updated,
            });
        }

        Ok(updated)
    }
}
