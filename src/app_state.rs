//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::TransitionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Transition service for all booking lifecycle logic.
    pub transition_service: Arc<TransitionService>,
}
