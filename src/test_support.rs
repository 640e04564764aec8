//! In-memory fakes for the store and processor seams, shared by unit tests.
//!
//! [`InMemoryBookingStore`] honors the same conditional-update contract as
//! the PostgreSQL gateway: the expected-state guard is checked under the
//! same lock that applies the patch, so racing writers observe
//! at-most-one-winner semantics just like the database enforces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::booking::{Booking, TransitionPatch};
use crate::domain::booking_id::{BookingId, UserId};
use crate::domain::status::BookingStatus;
use crate::error::GatewayError;
use crate::payments::PaymentProcessor;
use crate::persistence::models::NewNotification;
use crate::persistence::store::{BookingStore, ConditionalUpdate, NotificationStore};

/// In-memory booking store with the conditional-write guard held under one
/// lock.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a booking.
    pub async fn insert(&self, booking: Booking) {
        self.bookings.lock().await.insert(booking.id, booking);
    }

    /// Returns a snapshot of the booking, for assertions.
    pub async fn get(&self, id: BookingId) -> Option<Booking> {
        self.bookings.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn load(&self, id: BookingId) -> Result<Option<Booking>, GatewayError> {
        Ok(self.bookings.lock().await.get(&id).cloned())
    }

    async fn conditional_update(
        &self,
        id: BookingId,
        expected: BookingStatus,
        patch: TransitionPatch,
    ) -> Result<ConditionalUpdate, GatewayError> {
        let mut map = self.bookings.lock().await;
        match map.get_mut(&id) {
            Some(booking) if booking.status == expected => {
                booking.apply(&patch);
                Ok(ConditionalUpdate::Updated(booking.clone()))
            }
            _ => Ok(ConditionalUpdate::NoMatch),
        }
    }
}

/// Notification store that records inserts and can fail on demand.
#[derive(Debug, Default)]
pub struct RecordingNotificationStore {
    records: Mutex<Vec<NewNotification>>,
    fail_budget: AtomicUsize,
}

impl RecordingNotificationStore {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` inserts fail with a persistence error.
    pub fn fail_next(&self, n: usize) {
        self.fail_budget.store(n, Ordering::SeqCst);
    }

    /// Returns the records inserted so far.
    pub async fn records(&self) -> Vec<NewNotification> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl NotificationStore for RecordingNotificationStore {
    async fn insert_notification(&self, record: &NewNotification) -> Result<(), GatewayError> {
        let should_fail = self
            .fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(GatewayError::Persistence(
                "notification backend unavailable".to_string(),
            ));
        }
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Scripted capture behavior for the processor fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Capture succeeds.
    Succeed,
    /// Processor rejects the capture.
    Reject,
    /// Processor never answers; only a coordinator timeout ends the call.
    Hang,
}

/// Payment processor fake that counts calls and follows a script.
#[derive(Debug)]
pub struct ScriptedProcessor {
    mode: Mutex<CaptureMode>,
    calls: AtomicUsize,
}

impl ScriptedProcessor {
    /// Creates a processor with the given initial behavior.
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
        }
    }

    /// Changes the scripted behavior.
    pub async fn set_mode(&self, mode: CaptureMode) {
        *self.mode.lock().await = mode;
    }

    /// Number of capture calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for ScriptedProcessor {
    async fn capture(&self, _payment_intent_id: &str) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().await;
        match mode {
            CaptureMode::Succeed => Ok(()),
            CaptureMode::Reject => Err(GatewayError::UpstreamFailure(
                "charge_already_captured".to_string(),
            )),
            CaptureMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::UpstreamFailure("hung".to_string()))
            }
        }
    }
}

/// Builds a booking advanced along the chain until it reaches `status`.
pub fn booking_at(status: BookingStatus, customer_id: UserId, pro_id: UserId) -> Booking {
    let mut booking = Booking::new_requested(
        BookingId::new(),
        customer_id,
        pro_id,
        Some("pi_test".to_string()),
        Utc::now(),
    );
    while booking.status != status {
        let Some(next) = booking.status.next_allowed() else {
            break;
        };
        if next == BookingStatus::Paid {
            booking.apply(&TransitionPatch::capture_settled(Utc::now()));
        } else {
            booking.apply(&TransitionPatch::transition(next, Utc::now(), pro_id));
        }
    }
    booking
}
