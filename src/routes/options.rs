use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use super::{ApiError, AppState};
use crate::pipeline::DashboardOptions;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/options", get(handler))
}

/// Species list, available years and date bounds for the filter controls.
async fn handler(State(state): State<AppState>) -> Result<Json<DashboardOptions>, ApiError> {
    // ---
    let detections = state.load_detections().await?;
    let options = DashboardOptions::from_detections(&detections);
    info!(
        "GET /api/options - {} species across {} years",
        options.species.len(),
        options.years.len()
    );
    Ok(Json(options))
}
