//! Persistence layer: booking rows and notification records.
//!
//! [`store::BookingStore`] is the only seam that reads or writes booking
//! rows; its conditional update carries the optimistic-concurrency guard.
//! The concrete implementation uses `sqlx::PgPool` for async PostgreSQL
//! access.

pub mod models;
pub mod postgres;
pub mod store;

pub use models::NewNotification;
pub use postgres::PostgresBookingStore;
pub use store::{BookingStore, ConditionalUpdate, NotificationStore};
