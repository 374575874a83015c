//! Species selection.

use crate::models::Detection;

/// Keep detections whose species equals `species` exactly (case-sensitive).
pub fn select_species(detections: Vec<Detection>, species: &str) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.species == species)
        .collect()
}
