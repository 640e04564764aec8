//! Notification dispatcher: best-effort, off the request path.
//!
//! The orchestrator only publishes [`BookingEvent`]s; a background worker
//! subscribes to the bus and turns events into notification records. Insert
//! failures are logged and swallowed, so notification trouble can never
//! fail or delay a transition.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::{BookingEvent, BookingStatus, EventBus};
use crate::persistence::models::NewNotification;
use crate::persistence::store::NotificationStore;

/// Notification kind for lifecycle transitions.
const KIND_STATUS: &str = "booking_status";
/// Notification kind for payment settlement.
const KIND_PAYMENT: &str = "payment";

/// Fixed customer-facing message for a target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationMessage {
    /// Short title.
    pub title: &'static str,
    /// Message body.
    pub body: &'static str,
}

/// Message the customer receives when a booking enters `status`.
///
/// States without a mapped message produce no notification.
#[must_use]
pub const fn message_for(status: BookingStatus) -> Option<NotificationMessage> {
    match status {
        BookingStatus::Accepted => Some(NotificationMessage {
            title: "Booking accepted",
            body: "Your pro has accepted the booking.",
        }),
        BookingStatus::EnRoute => Some(NotificationMessage {
            title: "Pro is on the way",
            body: "Your pro is heading to you now.",
        }),
        BookingStatus::InProgress => Some(NotificationMessage {
            title: "Service started",
            body: "Your pro has started the job.",
        }),
        BookingStatus::CompletedPendingPayment => Some(NotificationMessage {
            title: "Service completed",
            body: "Your pro has finished the job. Payment is being processed.",
        }),
        BookingStatus::Requested
        | BookingStatus::Paid
        | BookingStatus::Cancelled
        | BookingStatus::Declined => None,
    }
}

/// Maps one event to the notification records it produces: the customer on
/// every mapped transition, both parties on payment capture.
#[must_use]
pub fn records_for(event: &BookingEvent) -> Vec<NewNotification> {
    match event {
        BookingEvent::StatusChanged {
            booking_id,
            customer_id,
            status,
            ..
        } => {
            let Some(message) = message_for(*status) else {
                return Vec::new();
            };
            vec![NewNotification {
                user_id: *customer_id,
                kind: KIND_STATUS.to_string(),
                title: message.title.to_string(),
                body: message.body.to_string(),
                booking_id: *booking_id,
                deep_link: deep_link(*booking_id),
            }]
        }
        BookingEvent::PaymentCaptured {
            booking_id,
            customer_id,
            pro_id,
            ..
        } => vec![
            NewNotification {
                user_id: *customer_id,
                kind: KIND_PAYMENT.to_string(),
                title: "Payment complete".to_string(),
                body: "Your payment has been processed. Thanks for booking!".to_string(),
                booking_id: *booking_id,
                deep_link: deep_link(*booking_id),
            },
            NewNotification {
                user_id: *pro_id,
                kind: KIND_PAYMENT.to_string(),
                title: "Payment received".to_string(),
                body: "The customer's payment has been captured for your job.".to_string(),
                booking_id: *booking_id,
                deep_link: deep_link(*booking_id),
            },
        ],
    }
}

fn deep_link(booking_id: crate::domain::BookingId) -> String {
    format!("app://bookings/{booking_id}")
}

/// Spawns the dispatcher worker.
///
/// The worker drains the bus until every sender is dropped, inserting
/// records as events arrive. A lagging worker loses the oldest events
/// rather than backpressuring publishers.
pub fn spawn_dispatcher(
    bus: &EventBus,
    store: Arc<dyn NotificationStore>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    for record in records_for(&event) {
                        if let Err(e) = store.insert_notification(&record).await {
                            tracing::warn!(
                                booking_id = %record.booking_id,
                                user_id = %record.user_id,
                                error = %e,
                                "notification insert failed; dropping record"
                            );
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "notification dispatcher lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("notification dispatcher stopped");
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::booking_id::{BookingId, UserId};
    use crate::test_support::RecordingNotificationStore;
    use chrono::Utc;

    fn status_event(status: BookingStatus) -> BookingEvent {
        BookingEvent::StatusChanged {
            booking_id: BookingId::new(),
            customer_id: UserId::new(),
            pro_id: UserId::new(),
            status,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn en_route_message_matches_catalog() {
        let Some(message) = message_for(BookingStatus::EnRoute) else {
            panic!("en_route must have a message");
        };
        assert_eq!(message.title, "Pro is on the way");
    }

    #[test]
    fn unmapped_states_produce_no_records() {
        assert!(records_for(&status_event(BookingStatus::Requested)).is_empty());
        assert!(records_for(&status_event(BookingStatus::Cancelled)).is_empty());
        // `paid` is announced through the PaymentCaptured event instead.
        assert!(records_for(&status_event(BookingStatus::Paid)).is_empty());
    }

    #[test]
    fn status_change_notifies_the_customer_only() {
        let event = status_event(BookingStatus::Accepted);
        let records = records_for(&event);
        assert_eq!(records.len(), 1);
        let BookingEvent::StatusChanged { customer_id, booking_id, .. } = event else {
            panic!("wrong variant");
        };
        let Some(record) = records.first() else {
            panic!("missing record");
        };
        assert_eq!(record.user_id, customer_id);
        assert_eq!(record.kind, "booking_status");
        assert_eq!(record.deep_link, format!("app://bookings/{booking_id}"));
    }

    #[test]
    fn payment_capture_notifies_both_parties() {
        let customer_id = UserId::new();
        let pro_id = UserId::new();
        let event = BookingEvent::PaymentCaptured {
            booking_id: BookingId::new(),
            customer_id,
            pro_id,
            timestamp: Utc::now(),
        };
        let records = records_for(&event);
        assert_eq!(records.len(), 2);
        let recipients: Vec<UserId> = records.iter().map(|r| r.user_id).collect();
        assert!(recipients.contains(&customer_id));
        assert!(recipients.contains(&pro_id));
        assert!(records.iter().all(|r| r.kind == "payment"));
    }

    #[tokio::test]
    async fn dispatcher_inserts_records_for_published_events() {
        let bus = EventBus::new(16);
        let store = Arc::new(RecordingNotificationStore::new());
        let handle = spawn_dispatcher(&bus, Arc::clone(&store) as Arc<dyn NotificationStore>);

        bus.publish(status_event(BookingStatus::Accepted));
        bus.publish(status_event(BookingStatus::EnRoute));
        drop(bus); // close the channel so the worker drains and stops

        let Ok(()) = handle.await else {
            panic!("dispatcher panicked");
        };
        assert_eq!(store.records().await.len(), 2);
    }

    #[tokio::test]
    async fn dispatcher_swallows_insert_failures_and_keeps_draining() {
        let bus = EventBus::new(16);
        let store = Arc::new(RecordingNotificationStore::new());
        store.fail_next(1);
        let handle = spawn_dispatcher(&bus, Arc::clone(&store) as Arc<dyn NotificationStore>);

        bus.publish(status_event(BookingStatus::Accepted)); // this insert fails
        bus.publish(status_event(BookingStatus::EnRoute)); // this one lands
        drop(bus);

        let Ok(()) = handle.await else {
            panic!("dispatcher panicked");
        };
        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert!(records.iter().any(|r| r.title == "Pro is on the way"));
    }
}
