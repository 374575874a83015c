use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiError, AppState};
use crate::error::Error;
use crate::models::{ClusterSummary, Detection};
use crate::pipeline::{self, DashboardOptions, TimeWindow};

// ---

const NO_DATA_MESSAGE: &str = "No data to display for selected filters.";

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/detections", get(handler))
}

/// Query parameters for one dashboard selection.
///
/// Everything is optional; gaps are filled from the dataset the same way the
/// dashboard's controls pre-select their first entry.
#[derive(Debug, Default, Deserialize)]
pub struct DetectionsQuery {
    species: Option<String>,
    /// `range` (default), `year` or `all`.
    filter: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    year: Option<i32>,
}

/// One map marker.
#[derive(Debug, Serialize)]
struct Marker {
    latitude: f64,
    longitude: f64,
    count: usize,
    latest_timestamp: NaiveDateTime,
    /// `latest_timestamp` at minute precision.
    latest: String,
    popup: String,
}

impl From<ClusterSummary> for Marker {
    fn from(c: ClusterSummary) -> Self {
        // ---
        let latest = c.latest_timestamp.format("%Y-%m-%d %H:%M").to_string();
        Marker {
            latitude: c.latitude,
            longitude: c.longitude,
            count: c.count,
            latest_timestamp: c.latest_timestamp,
            popup: format!("Count: {}\nLatest: {}", c.count, latest),
            latest,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum DetectionsResponse {
    Ok {
        species: String,
        time_label: String,
        center: Option<(f64, f64)>,
        icon_url: Option<&'static str>,
        markers: Vec<Marker>,
        rows: Vec<Detection>,
    },
    NoData {
        species: Option<String>,
        time_label: String,
        message: &'static str,
    },
}

async fn handler(
    query: Result<Query<DetectionsQuery>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Json<DetectionsResponse>, ApiError> {
    // ---
    let Query(params) = query.map_err(|e| Error::InvalidFilter(e.body_text()))?;
    info!("GET /api/detections - {:?}", params);

    let detections = state.load_detections().await?;
    let options = DashboardOptions::from_detections(&detections);
    let window = resolve_window(&params, &options)?;

    let Some(species) = params.species.or_else(|| options.species.first().cloned()) else {
        debug!("GET /api/detections - dataset has no species");
        return Ok(Json(DetectionsResponse::NoData {
            species: None,
            time_label: window.label(),
            message: NO_DATA_MESSAGE,
        }));
    };

    let view = pipeline::build_view(detections, &species, &window);
    if view.is_empty() {
        info!("No detections for '{}' ({})", species, view.time_label);
        return Ok(Json(DetectionsResponse::NoData {
            species: Some(view.species),
            time_label: view.time_label,
            message: NO_DATA_MESSAGE,
        }));
    }

    info!(
        "Returning {} rows in {} clusters for '{}' ({})",
        view.rows.len(),
        view.clusters.len(),
        view.species,
        view.time_label
    );

    Ok(Json(DetectionsResponse::Ok {
        species: view.species,
        time_label: view.time_label,
        center: view.center,
        icon_url: state.icon.as_ref().map(|_| "/icon.png"),
        markers: view.clusters.into_iter().map(Marker::from).collect(),
        rows: view.rows,
    }))
}

/// Turn the request's filter parameters into a [`TimeWindow`].
fn resolve_window(params: &DetectionsQuery, options: &DashboardOptions) -> Result<TimeWindow, Error> {
    // ---
    match params.filter.as_deref().unwrap_or("range") {
        "range" => {
            let from = params.from.or(options.min_date);
            let to = params.to.or(options.max_date);
            Ok(match (from, to) {
                (Some(from), Some(to)) => TimeWindow::DateRange { from, to },
                _ => TimeWindow::AllTime,
            })
        }
        "year" => Ok(params
            .year
            .or_else(|| options.years.first().copied())
            .map_or(TimeWindow::AllTime, TimeWindow::Year)),
        "all" => Ok(TimeWindow::AllTime),
        other => Err(Error::InvalidFilter(format!(
            "unknown filter '{}', expected range, year or all",
            other
        ))),
    }
}
