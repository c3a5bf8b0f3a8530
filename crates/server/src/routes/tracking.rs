//! Tracking log route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::TrackingRepository;
use crate::db::tracking::{NewTrackingEvent, TrackingEvent};
use crate::error::AppError;
use crate::middleware::auth::RequireManager;
use crate::routes::InsertResult;
use crate::state::AppState;

/// Build the tracking router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tracking", post(append))
        .route("/tracking/{order_id}", get(history))
}

/// Tracking event request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub message: String,
}

/// Append a tracking event. The order id is recorded as-is; the log does
/// not check it refers to a known order.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn append(
    RequireManager(_principal): RequireManager,
    State(state): State<AppState>,
    Json(body): Json<TrackingRequest>,
) -> Result<Json<InsertResult<Uuid>>, AppError> {
    let id = TrackingRepository::new(state.pool())
        .append(&NewTrackingEvent {
            order_id: body.order_id,
            status: body.status,
            location: body.location,
            message: body.message,
        })
        .await?;

    Ok(Json(InsertResult::new(id)))
}

/// Public event history for an order, newest first; `[]` when no events
/// exist, never an error.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn history(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<TrackingEvent>>, AppError> {
    let events = TrackingRepository::new(state.pool())
        .history(&order_id)
        .await?;

    Ok(Json(events))
}
