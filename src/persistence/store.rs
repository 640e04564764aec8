//! Store gateway traits: the only seams through which booking rows and
//! notification records are read or written.

use async_trait::async_trait;

use crate::domain::{Booking, BookingId, BookingStatus, TransitionPatch};
use crate::error::GatewayError;
use crate::persistence::models::NewNotification;

/// Outcome of a conditional (optimistic) booking update.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalUpdate {
    /// The precondition held; the row was updated. Carries the fresh row.
    Updated(Booking),
    /// No row matched `id` + expected status at write time: either the
    /// booking does not exist or its state changed under the caller.
    NoMatch,
}

/// Read/write access to booking rows.
///
/// `conditional_update` is the sole concurrency-control mechanism: the
/// expected-state precondition must be enforced by the store atomically
/// with the update, never by application-level read-then-write.
#[async_trait]
pub trait BookingStore: Send + Sync + std::fmt::Debug {
    /// Loads a booking by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn load(&self, id: BookingId) -> Result<Option<Booking>, GatewayError>;

    /// Applies `patch` iff the row's status still equals `expected` at
    /// write time.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure. A lost race
    /// is not an error: it is reported as [`ConditionalUpdate::NoMatch`].
    async fn conditional_update(
        &self,
        id: BookingId,
        expected: BookingStatus,
        patch: TransitionPatch,
    ) -> Result<ConditionalUpdate, GatewayError>;
}

/// Creator of user-facing notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Inserts one notification record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure. Callers on
    /// the dispatch path log and swallow this.
    async fn insert_notification(&self, record: &NewNotification) -> Result<(), GatewayError>;
}
