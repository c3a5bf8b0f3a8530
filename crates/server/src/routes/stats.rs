//! Dashboard statistics route handler.

use axum::{Json, Router, extract::State, routing::get};

use crate::db::stats::{StatsSummary, compute_stats};
use crate::error::AppError;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

/// Build the stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin-stats", get(admin_stats))
}

/// Aggregate dashboard metrics.
///
/// # Errors
///
/// Returns `AppError::Database` if any aggregate query fails.
pub async fn admin_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<StatsSummary>, AppError> {
    let summary = compute_stats(state.pool()).await?;
    Ok(Json(summary))
}
