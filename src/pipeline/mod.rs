//! Detection pipeline gateway.
//!
//! Raw rows flow through [`normalize`], then the species and time-window
//! selectors, then [`aggregate`]. Everything here is pure and recomputed on
//! every request; nothing is cached between selections.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{ClusterSummary, Detection};

mod aggregate;
mod normalize;
mod species;
mod window;

pub use aggregate::{aggregate, round_coordinate, ClusterKey, CLUSTER_DECIMALS};
pub use normalize::{normalize, parse_timestamp, validate_schema, CanonicalField, SOURCE_FIELDS};
pub use species::select_species;
pub use window::{select_window, TimeWindow};

// ---

/// Values that seed the dashboard's filter controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOptions {
    // ---
    /// Distinct species, sorted.
    pub species: Vec<String>,
    /// Distinct calendar years, ascending.
    pub years: Vec<i32>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl DashboardOptions {
    // ---
    pub fn from_detections(detections: &[Detection]) -> Self {
        // ---
        let species: BTreeSet<&str> = detections.iter().map(|d| d.species.as_str()).collect();
        let years: BTreeSet<i32> = detections.iter().map(|d| d.timestamp.year()).collect();

        DashboardOptions {
            species: species.into_iter().map(String::from).collect(),
            years: years.into_iter().collect(),
            min_date: detections.iter().map(|d| d.timestamp.date()).min(),
            max_date: detections.iter().map(|d| d.timestamp.date()).max(),
        }
    }
}

/// Everything one render pass needs for a (species, window) selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    // ---
    pub species: String,
    pub time_label: String,
    /// Matching detections, ascending by timestamp.
    pub rows: Vec<Detection>,
    pub clusters: Vec<ClusterSummary>,
    /// Raw coordinate of the earliest matching detection.
    pub center: Option<(f64, f64)>,
}

impl DashboardView {
    // ---
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Apply both selectors, sort the table rows and aggregate the clusters.
pub fn build_view(detections: Vec<Detection>, species: &str, window: &TimeWindow) -> DashboardView {
    // ---
    let mut rows = select_species(select_window(detections, window), species);
    rows.sort_by_key(|d| d.timestamp);

    let clusters = aggregate(&rows);
    let center = rows.first().map(|d| (d.latitude, d.longitude));

    DashboardView {
        species: species.to_string(),
        time_label: window.label(),
        rows,
        clusters,
        center,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::RawTable;
    use serde_json::json;

    fn raw(rows: Vec<serde_json::Value>) -> RawTable {
        // ---
        RawTable {
            columns: SOURCE_FIELDS.iter().map(|(c, _)| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn osprey_dataset() -> Vec<Detection> {
        // ---
        normalize(&raw(vec![
            json!({"Com_Name": "Osprey", "Lat": 40.12345, "Lon": -74.00001, "Date": "2024-03-05", "Time": "09:00:00"}),
            json!({"Com_Name": "Osprey", "Lat": 40.12341, "Lon": -74.00004, "Date": "2024-03-02", "Time": "18:30:00"}),
            json!({"Com_Name": "Osprey", "Lat": 40.12302, "Lon": -74.00020, "Date": "2024-03-01", "Time": "06:15:00"}),
            json!({"Com_Name": "Mallard", "Lat": 41.5, "Lon": -73.2, "Date": "2023-07-14", "Time": "12:00:00"}),
        ]))
        .unwrap()
    }

    #[test]
    fn test_osprey_range_end_to_end() {
        // ---
        let window = TimeWindow::DateRange {
            from: date("2024-03-01"),
            to: date("2024-03-02"),
        };

        let view = build_view(osprey_dataset(), "Osprey", &window);

        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.time_label, "2024-03-01 to 2024-03-02");
        assert_eq!(view.clusters.len(), 1);
        assert_eq!(view.clusters[0].count, 2);
        assert_eq!(
            view.clusters[0].latest_timestamp.to_string(),
            "2024-03-02 18:30:00"
        );
    }

    #[test]
    fn test_rows_sorted_and_center_is_earliest() {
        // ---
        let view = build_view(osprey_dataset(), "Osprey", &TimeWindow::AllTime);

        let stamps: Vec<String> = view.rows.iter().map(|d| d.timestamp.to_string()).collect();
        assert_eq!(
            stamps,
            vec![
                "2024-03-01 06:15:00",
                "2024-03-02 18:30:00",
                "2024-03-05 09:00:00"
            ]
        );
        assert_eq!(view.center, Some((40.12302, -74.00020)));
    }

    #[test]
    fn test_species_without_rows_in_window_is_empty() {
        // ---
        let view = build_view(osprey_dataset(), "Mallard", &TimeWindow::Year(2024));

        assert!(view.is_empty());
        assert!(view.clusters.is_empty());
        assert_eq!(view.center, None);
        assert_eq!(view.time_label, "Year 2024");
    }

    #[test]
    fn test_options_from_dataset() {
        // ---
        let options = DashboardOptions::from_detections(&osprey_dataset());

        assert_eq!(options.species, vec!["Mallard", "Osprey"]);
        assert_eq!(options.years, vec![2023, 2024]);
        assert_eq!(options.min_date, Some(date("2023-07-14")));
        assert_eq!(options.max_date, Some(date("2024-03-05")));
    }

    #[test]
    fn test_options_for_empty_dataset() {
        // ---
        let options = DashboardOptions::from_detections(&[]);
        assert!(options.species.is_empty());
        assert!(options.years.is_empty());
        assert_eq!(options.min_date, None);
    }
}
