//! Time-window selection over normalized detections.

use chrono::{Datelike, NaiveDate};

use crate::models::Detection;

// ---

/// User-selected restriction on detection timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    // ---
    /// Inclusive on both ends; compares the calendar date only.
    DateRange { from: NaiveDate, to: NaiveDate },
    /// Calendar year of the full timestamp.
    Year(i32),
    AllTime,
}

impl TimeWindow {
    // ---
    pub fn contains(&self, detection: &Detection) -> bool {
        // ---
        match self {
            TimeWindow::DateRange { from, to } => {
                let date = detection.timestamp.date();
                *from <= date && date <= *to
            }
            TimeWindow::Year(year) => detection.timestamp.year() == *year,
            TimeWindow::AllTime => true,
        }
    }

    /// Human-readable caption for the selection.
    pub fn label(&self) -> String {
        // ---
        match self {
            TimeWindow::DateRange { from, to } => format!("{} to {}", from, to),
            TimeWindow::Year(year) => format!("Year {}", year),
            TimeWindow::AllTime => "All Time".to_string(),
        }
    }
}

/// Keep the detections inside `window`, preserving order.
///
/// An inverted date range is not rejected; it simply matches nothing.
pub fn select_window(detections: Vec<Detection>, window: &TimeWindow) -> Vec<Detection> {
    // ---
    if *window == TimeWindow::AllTime {
        return detections;
    }
    detections
        .into_iter()
        .filter(|d| window.contains(d))
        .collect()
}
