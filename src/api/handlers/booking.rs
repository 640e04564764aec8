//! Booking lifecycle handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::patch;
use axum::{Json, Router};

use crate::api::dto::{BookingProjection, UpdateStatusRequest};
use crate::app_state::AppState;
use crate::auth::CallerIdentity;
use crate::domain::booking_id::BookingId;
use crate::domain::status::TransitionAction;
use crate::error::{ErrorResponse, GatewayError};

/// `PATCH /bookings/{id}/status` — Advance a booking to its next state.
///
/// The caller must be the pro assigned to the booking. The requested
/// action must name the single allowed successor of the booking's current
/// stored state; anything else is a `409` reporting the actual state and
/// the allowed next action.
///
/// # Errors
///
/// Returns [`GatewayError`] as described in the response table.
#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    summary = "Advance a booking's lifecycle state",
    description = "Applies the single allowed forward transition to a booking. On the terminal business transition the authorized charge is captured and both parties are notified.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Booking transitioned", body = BookingProjection),
        (status = 400, description = "Invalid body or unrecognized action", body = ErrorResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
        (status = 403, description = "Caller is not the assigned pro", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Transition not valid from the current state", body = ErrorResponse),
        (status = 500, description = "Internal failure", body = ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    caller: CallerIdentity,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let action = TransitionAction::parse(&req.next_status)
        .ok_or_else(|| GatewayError::UnknownAction(req.next_status.clone()))?;

    let booking = state
        .transition_service
        .advance(BookingId::from_uuid(id), action, &caller)
        .await?;

    Ok(Json(BookingProjection::from(booking)))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/bookings/{id}/status", patch(update_status))
}
