//! Domain layer: booking entity, state graph, and event system.
//!
//! This module contains the server-side domain model including booking
//! identity, the booking entity with its audit history, the pure state
//! graph governing transitions, and the event bus for broadcasting
//! committed state changes.

pub mod booking;
pub mod booking_event;
pub mod booking_id;
pub mod event_bus;
pub mod status;

pub use booking::{Booking, StatusHistoryEntry, TransitionPatch};
pub use booking_event::BookingEvent;
pub use booking_id::{BookingId, UserId};
pub use event_bus::EventBus;
pub use status::{BookingStatus, PaymentStatus, TransitionAction};
