//! Data models shared by the source, the pipeline and the routes.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

// ---

/// One raw row from the data source, keyed by source column name.
pub type RawRow = Map<String, Value>;

/// Full snapshot of the detections relation as the source reports it.
///
/// `columns` is populated even when the relation holds no rows, so schema
/// validation does not depend on the data being non-empty.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    // ---
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    // ---
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Canonical detection record produced by normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    // ---
    pub species: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: NaiveDateTime,
}

/// Map marker summary for all detections sharing a rounded coordinate.
///
/// `latitude`/`longitude` are the rounded cluster key, not any member's raw
/// coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    // ---
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    pub latest_timestamp: NaiveDateTime,
}
