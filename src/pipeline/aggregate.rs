//! Location aggregation: collapse detections into rounded-coordinate clusters.
//!
//! Records whose coordinates round to the same key merge into one cluster and
//! the cluster is reported at the rounded key. The precision loss is the
//! deduplication policy, not an accident.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::models::{ClusterSummary, Detection};

// ---

/// Decimal places kept for the cluster key (~100 m at 3).
pub const CLUSTER_DECIMALS: i32 = 3;

/// Rounded coordinate in integer units of `10^-CLUSTER_DECIMALS` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterKey {
    // ---
    lat_units: i64,
    lon_units: i64,
}

impl ClusterKey {
    // ---
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_units: round_units(latitude),
            lon_units: round_units(longitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.lat_units as f64 / scale()
    }

    pub fn longitude(&self) -> f64 {
        self.lon_units as f64 / scale()
    }
}

fn scale() -> f64 {
    10f64.powi(CLUSTER_DECIMALS)
}

/// Round on the exact binary value, ties to even, like Python's `round()`.
///
/// Scaling first is not equivalent: `40.1235 * 1000.0` lands exactly on
/// `40123.5` although `40.1235` itself is slightly below the half.
fn round_units(value: f64) -> i64 {
    // ---
    let digits: String = format!("{:.*}", CLUSTER_DECIMALS as usize, value)
        .chars()
        .filter(|c| *c != '.')
        .collect();
    digits
        .parse()
        .unwrap_or_else(|_| (value * scale()).round_ties_even() as i64)
}

/// Round a coordinate to the cluster precision.
pub fn round_coordinate(value: f64) -> f64 {
    round_units(value) as f64 / scale()
}

/// Group detections by [`ClusterKey`], ascending by key.
pub fn aggregate(detections: &[Detection]) -> Vec<ClusterSummary> {
    // ---
    let mut groups: BTreeMap<ClusterKey, (usize, NaiveDateTime)> = BTreeMap::new();

    for d in detections {
        let key = ClusterKey::from_coordinates(d.latitude, d.longitude);
        groups
            .entry(key)
            .and_modify(|(count, latest)| {
                *count += 1;
                if d.timestamp > *latest {
                    *latest = d.timestamp;
                }
            })
            .or_insert((1, d.timestamp));
    }

    groups
        .into_iter()
        .map(|(key, (count, latest_timestamp))| ClusterSummary {
            latitude: key.latitude(),
            longitude: key.longitude(),
            count,
            latest_timestamp,
        })
        .collect()
}
