//! Payment capture coordinator.
//!
//! Invoked after the `completed_pending_payment` write has committed, never
//! before. Capture and the follow-up `paid` write are two separately
//! guarded steps with an external call in between; the window where the
//! charge is captured but the row not yet `paid` is accepted and repaired
//! by the out-of-scope reconciliation job via [`CaptureCoordinator::retry_capture`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use crate::domain::booking::{Booking, TransitionPatch};
use crate::domain::booking_id::BookingId;
use crate::domain::status::{BookingStatus, PaymentStatus};
use crate::domain::{BookingEvent, EventBus};
use crate::error::GatewayError;
use crate::payments::PaymentProcessor;
use crate::persistence::store::{BookingStore, ConditionalUpdate};

/// Result of a capture attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// The charge is captured and the booking is `paid`. Carries the fresh
    /// row.
    Settled(Booking),
    /// Capture did not complete; the booking stays in
    /// `completed_pending_payment` with `payment_status = UNPAID`, ready
    /// for a later retry.
    Deferred,
}

/// Coordinates the external capture call and the second conditional write.
///
/// Duplicate concurrent captures for one booking are structurally
/// prevented: this coordinator only runs after a successful
/// `completed_pending_payment` write, and the conditional guard lets that
/// write succeed at most once.
#[derive(Debug)]
pub struct CaptureCoordinator {
    store: Arc<dyn BookingStore>,
    processor: Arc<dyn PaymentProcessor>,
    event_bus: EventBus,
    capture_timeout: Duration,
}

impl CaptureCoordinator {
    /// Creates a new coordinator.
    #[must_use]
    pub fn new(
        store: Arc<dyn BookingStore>,
        processor: Arc<dyn PaymentProcessor>,
        event_bus: EventBus,
        capture_timeout: Duration,
    ) -> Self {
        Self {
            store,
            processor,
            event_bus,
            capture_timeout,
        }
    }

    /// Captures the booking's authorized charge and, on success, performs
    /// the `completed_pending_payment → paid` conditional write.
    ///
    /// Never fails the caller: every capture problem (processor rejection,
    /// transport failure, timeout) is logged and reported as
    /// [`CaptureOutcome::Deferred`], leaving a clean retry point.
    pub async fn settle(&self, booking: &Booking) -> CaptureOutcome {
        let Some(intent_id) = booking.payment_intent_id.as_deref() else {
            tracing::warn!(
                booking_id = %booking.id,
                "no payment intent on booking; capture deferred"
            );
            return CaptureOutcome::Deferred;
        };

        match timeout(self.capture_timeout, self.processor.capture(intent_id)).await {
            Err(_elapsed) => {
                // Timeout tells us nothing about the processor-side result;
                // do not assume success or failure, just leave it retryable.
                tracing::warn!(
                    booking_id = %booking.id,
                    timeout_secs = self.capture_timeout.as_secs(),
                    "payment capture timed out; booking left retryable"
                );
                CaptureOutcome::Deferred
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    booking_id = %booking.id,
                    error = %e,
                    "payment capture failed; booking left retryable"
                );
                CaptureOutcome::Deferred
            }
            Ok(Ok(())) => self.mark_paid(booking).await,
        }
    }

    /// Idempotent retry entry for the reconciliation job.
    ///
    /// Already-`paid` bookings return [`CaptureOutcome::Settled`] without
    /// touching the processor.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BookingNotFound`] for unknown ids and
    /// [`GatewayError::Conflict`] when the booking is not awaiting capture.
    pub async fn retry_capture(&self, booking_id: BookingId) -> Result<CaptureOutcome, GatewayError> {
        let booking = self
            .store
            .load(booking_id)
            .await?
            .ok_or(GatewayError::BookingNotFound(booking_id))?;

        if booking.payment_status == PaymentStatus::Paid {
            return Ok(CaptureOutcome::Settled(booking));
        }
        if booking.status != BookingStatus::CompletedPendingPayment {
            return Err(GatewayError::Conflict {
                current: booking.status,
                allowed: booking.status.allowed_next_label(),
            });
        }
        Ok(self.settle(&booking).await)
    }

    /// The second conditional write, after a successful processor capture.
    async fn mark_paid(&self, booking: &Booking) -> CaptureOutcome {
        let patch = TransitionPatch::capture_settled(Utc::now());
        match self
            .store
            .conditional_update(booking.id, BookingStatus::CompletedPendingPayment, patch)
            .await
        {
            Ok(ConditionalUpdate::Updated(paid)) => {
                tracing::info!(booking_id = %paid.id, "payment captured; booking paid");
                let _ = self.event_bus.publish(BookingEvent::PaymentCaptured {
                    booking_id: paid.id,
                    customer_id: paid.customer_id,
                    pro_id: paid.pro_id,
                    timestamp: paid.paid_at.unwrap_or_else(Utc::now),
                });
                CaptureOutcome::Settled(paid)
            }
            Ok(ConditionalUpdate::NoMatch) => {
                // The charge is captured but the row moved; reconciliation
                // owns the repair.
                tracing::error!(
                    booking_id = %booking.id,
                    "capture succeeded but paid write found no matching row"
                );
                CaptureOutcome::Deferred
            }
            Err(e) => {
                tracing::error!(
                    booking_id = %booking.id,
                    error = %e,
                    "capture succeeded but paid write failed"
                );
                CaptureOutcome::Deferred
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::booking_id::UserId;
    use crate::test_support::{
        CaptureMode, InMemoryBookingStore, ScriptedProcessor, booking_at,
    };

    struct Fixture {
        store: Arc<InMemoryBookingStore>,
        processor: Arc<ScriptedProcessor>,
        bus: EventBus,
        coordinator: CaptureCoordinator,
    }

    fn fixture(mode: CaptureMode) -> Fixture {
        let store = Arc::new(InMemoryBookingStore::new());
        let processor = Arc::new(ScriptedProcessor::new(mode));
        let bus = EventBus::new(16);
        let coordinator = CaptureCoordinator::new(
            Arc::clone(&store) as Arc<dyn BookingStore>,
            Arc::clone(&processor) as Arc<dyn PaymentProcessor>,
            bus.clone(),
            Duration::from_secs(1),
        );
        Fixture {
            store,
            processor,
            bus,
            coordinator,
        }
    }

    #[tokio::test]
    async fn settle_marks_booking_paid_and_publishes_event() {
        let fx = fixture(CaptureMode::Succeed);
        let mut rx = fx.bus.subscribe();
        let booking = booking_at(
            BookingStatus::CompletedPendingPayment,
            UserId::new(),
            UserId::new(),
        );
        fx.store.insert(booking.clone()).await;

        let outcome = fx.coordinator.settle(&booking).await;
        let CaptureOutcome::Settled(paid) = outcome else {
            panic!("expected settled outcome");
        };
        assert_eq!(paid.status, BookingStatus::Paid);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(
            paid.last_history_entry().map(|e| e.status),
            Some(BookingStatus::Paid)
        );

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected payment event");
        };
        assert_eq!(event.event_type_str(), "payment_captured");
    }

    #[tokio::test]
    async fn rejected_capture_leaves_booking_retryable() {
        let fx = fixture(CaptureMode::Reject);
        let booking = booking_at(
            BookingStatus::CompletedPendingPayment,
            UserId::new(),
            UserId::new(),
        );
        fx.store.insert(booking.clone()).await;

        let outcome = fx.coordinator.settle(&booking).await;
        assert_eq!(outcome, CaptureOutcome::Deferred);

        let Some(stored) = fx.store.get(booking.id).await else {
            panic!("booking vanished");
        };
        assert_eq!(stored.status, BookingStatus::CompletedPendingPayment);
        assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
        assert!(stored.paid_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn capture_timeout_is_treated_as_failure() {
        let fx = fixture(CaptureMode::Hang);
        let booking = booking_at(
            BookingStatus::CompletedPendingPayment,
            UserId::new(),
            UserId::new(),
        );
        fx.store.insert(booking.clone()).await;

        let outcome = fx.coordinator.settle(&booking).await;
        assert_eq!(outcome, CaptureOutcome::Deferred);
        assert_eq!(fx.processor.calls(), 1);

        let Some(stored) = fx.store.get(booking.id).await else {
            panic!("booking vanished");
        };
        assert_eq!(stored.status, BookingStatus::CompletedPendingPayment);
        assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn missing_payment_intent_defers_without_calling_processor() {
        let fx = fixture(CaptureMode::Succeed);
        let mut booking = booking_at(
            BookingStatus::CompletedPendingPayment,
            UserId::new(),
            UserId::new(),
        );
        booking.payment_intent_id = None;
        fx.store.insert(booking.clone()).await;

        let outcome = fx.coordinator.settle(&booking).await;
        assert_eq!(outcome, CaptureOutcome::Deferred);
        assert_eq!(fx.processor.calls(), 0);
    }

    #[tokio::test]
    async fn retry_capture_is_idempotent_for_paid_bookings() {
        let fx = fixture(CaptureMode::Succeed);
        let booking = booking_at(BookingStatus::Paid, UserId::new(), UserId::new());
        fx.store.insert(booking.clone()).await;

        let outcome = fx.coordinator.retry_capture(booking.id).await;
        let Ok(CaptureOutcome::Settled(_)) = outcome else {
            panic!("expected settled outcome");
        };
        // No second capture against the processor.
        assert_eq!(fx.processor.calls(), 0);
    }

    #[tokio::test]
    async fn retry_capture_rejects_bookings_not_awaiting_capture() {
        let fx = fixture(CaptureMode::Succeed);
        let booking = booking_at(BookingStatus::Accepted, UserId::new(), UserId::new());
        fx.store.insert(booking.clone()).await;

        let result = fx.coordinator.retry_capture(booking.id).await;
        assert!(matches!(result, Err(GatewayError::Conflict { .. })));
        assert_eq!(fx.processor.calls(), 0);
    }

    #[tokio::test]
    async fn retry_capture_succeeds_after_an_earlier_failure() {
        let fx = fixture(CaptureMode::Reject);
        let booking = booking_at(
            BookingStatus::CompletedPendingPayment,
            UserId::new(),
            UserId::new(),
        );
        fx.store.insert(booking.clone()).await;

        let first = fx.coordinator.settle(&booking).await;
        assert_eq!(first, CaptureOutcome::Deferred);

        fx.processor.set_mode(CaptureMode::Succeed).await;
        let second = fx.coordinator.retry_capture(booking.id).await;
        let Ok(CaptureOutcome::Settled(paid)) = second else {
            panic!("expected settled outcome on retry");
        };
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(fx.processor.calls(), 2);
    }

    #[tokio::test]
    async fn retry_capture_unknown_booking_is_not_found() {
        let fx = fixture(CaptureMode::Succeed);
        let result = fx.coordinator.retry_capture(BookingId::new()).await;
        assert!(matches!(result, Err(GatewayError::BookingNotFound(_))));
    }
}
