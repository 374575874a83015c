//! HTTP gateway: merges the sub-routers and owns the shared [`AppState`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;

use crate::error::Error;
use crate::models::{Detection, RawTable};
use crate::pipeline;
use crate::snapshot::SnapshotCache;
use crate::source::DetectionSource;

mod detections;
mod health;
mod icon;
mod options;

// ---

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    // ---
    source: Result<Arc<dyn DetectionSource>, String>,
    cache: Arc<SnapshotCache<RawTable>>,
    ttl: Duration,
    icon: Option<Bytes>,
}

impl AppState {
    // ---
    pub fn new(source: Arc<dyn DetectionSource>, ttl: Duration) -> Self {
        Self {
            source: Ok(source),
            cache: Arc::new(SnapshotCache::new()),
            ttl,
            icon: None,
        }
    }

    /// State for a service started without a usable data source. Data routes
    /// answer with `message` until the process is restarted.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            source: Err(message.into()),
            cache: Arc::new(SnapshotCache::new()),
            ttl: Duration::ZERO,
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: Option<Bytes>) -> Self {
        self.icon = icon;
        self
    }

    /// Current snapshot, normalized.
    async fn load_detections(&self) -> Result<Vec<Detection>, ApiError> {
        // ---
        let source = self.source.as_ref().map_err(|msg| ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            kind: "configuration",
            message: msg.clone(),
        })?;

        let snapshot = self
            .cache
            .get_or_refresh(Instant::now(), self.ttl, || source.fetch_all())
            .await?;

        Ok(pipeline::normalize(&snapshot)?)
    }
}

/// JSON error body: `{"error": kind, "message": ...}`.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        // ---
        let status = match &err {
            Error::MissingCredential { .. } | Error::InvalidDatabaseUrl(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Source(_) => StatusCode::BAD_GATEWAY,
            Error::Schema { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidFilter(_) => StatusCode::BAD_REQUEST,
        };
        tracing::error!("{}", err);
        ApiError {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(detections::router())
        .merge(options::router())
        .merge(icon::router())
        .merge(health::router())
        .with_state(state)
}
