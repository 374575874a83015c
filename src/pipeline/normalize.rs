//! Record normalization: raw source rows into canonical [`Detection`]s.

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Detection, RawRow, RawTable};

// ---

/// Canonical field a source column feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    // ---
    Species,
    Latitude,
    Longitude,
    Date,
    Time,
}

/// Source column name → canonical field. Every entry is required.
pub const SOURCE_FIELDS: [(&str, CanonicalField); 5] = [
    ("Com_Name", CanonicalField::Species),
    ("Lat", CanonicalField::Latitude),
    ("Lon", CanonicalField::Longitude),
    ("Date", CanonicalField::Date),
    ("Time", CanonicalField::Time),
];

/// Accepted layouts for `"{date} {time}"`, tried in order.
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Check the table carries every mapped source column.
pub fn validate_schema(table: &RawTable) -> Result<()> {
    // ---
    let missing: Vec<String> = SOURCE_FIELDS
        .iter()
        .filter(|(name, _)| !table.has_column(name))
        .map(|(name, _)| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema { missing })
    }
}

/// Map every usable row to a [`Detection`].
///
/// Fails with [`Error::Schema`] when a source column is absent altogether.
/// Rows with a missing species, non-numeric coordinates or an unparseable
/// date/time are dropped silently.
pub fn normalize(table: &RawTable) -> Result<Vec<Detection>> {
    // ---
    validate_schema(table)?;

    let detections: Vec<Detection> = table.rows.iter().filter_map(normalize_row).collect();

    let dropped = table.rows.len() - detections.len();
    if dropped > 0 {
        debug!(
            "Normalized {} of {} rows ({} dropped)",
            detections.len(),
            table.rows.len(),
            dropped
        );
    }
    Ok(detections)
}

fn normalize_row(row: &RawRow) -> Option<Detection> {
    // ---
    let mut species = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut date = None;
    let mut time = None;

    for (name, field) in SOURCE_FIELDS {
        let value = row.get(name)?;
        match field {
            CanonicalField::Species => species = text(value),
            CanonicalField::Latitude => latitude = value.as_f64(),
            CanonicalField::Longitude => longitude = value.as_f64(),
            CanonicalField::Date => date = text(value),
            CanonicalField::Time => time = text(value),
        }
    }

    Some(Detection {
        species: species?.to_string(),
        latitude: latitude?,
        longitude: longitude?,
        timestamp: parse_timestamp(date?, time?)?,
    })
}

fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// Parse a date and a time-of-day as one combined timestamp.
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    // ---
    let combined = format!("{} {}", date.trim(), time.trim());
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&combined, fmt).ok())
}
