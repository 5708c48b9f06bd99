//! Handler for link statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the durable state of a short link.
///
/// # Endpoint
///
/// `GET /stats/{code}`
///
/// Reads the store directly, so click counts include every committed
/// write-back. Inactive and expired links are reported as well.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let record = state.link_service.get_stats(&code).await?;

    Ok(Json(StatsResponse {
        success: true,
        stats: record.into(),
    }))
}
