//! Serialization utilities for snapshots and population files.

use crate::store::PopulationRecord;
use crate::world::Snapshot;

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(data)
}

/// Deserialize a population list, e.g. `[{"kind":"flyer","row":3,"col":7}]`.
pub fn population_from_json_string(data: &str) -> Result<Vec<PopulationRecord>, serde_json::Error> {
    serde_json::from_str(data)
}

/// Deserialize a terrain matrix given as nested row arrays.
pub fn terrain_rows_from_json_string(data: &str) -> Result<Vec<Vec<f64>>, serde_json::Error> {
    serde_json::from_str(data)
}
