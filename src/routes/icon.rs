use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::{ApiError, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/icon.png", get(handler))
}

/// Marker icon loaded at startup; 404 when the asset was missing.
async fn handler(State(state): State<AppState>) -> Response {
    // ---
    match state.icon {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => ApiError {
            status: StatusCode::NOT_FOUND,
            kind: "asset",
            message: "marker icon not loaded".to_string(),
        }
        .into_response(),
    }
}
