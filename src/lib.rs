//! # booking-gateway
//!
//! REST gateway for the local-services booking lifecycle.
//!
//! This crate advances a booking through a fixed linear chain of
//! operational states (`requested → accepted → en_route → in_progress →
//! completed_pending_payment → paid`), enforces that only the assigned pro
//! can trigger each transition, keeps an append-only audit history, and on
//! the terminal business transition coordinates a payment capture against
//! an external processor plus best-effort notifications to both parties.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── TransitionService (service/)
//!     ├── CaptureCoordinator (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── State Graph (domain/status)
//!     ├── Notification Dispatcher (notify/)
//!     │
//!     └── PostgreSQL store gateway (persistence/)
//! ```
//!
//! Concurrency control is a single conditional write: `UPDATE … WHERE
//! status = expected`. Two racing transitions for one booking may both
//! read the same state, but at most one write succeeds; the loser gets a
//! `409` describing the true current state.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod payments;
pub mod persistence;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
