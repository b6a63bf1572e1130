//! Errors raised while building a simulation from external data.
//!
//! Everything here is reported before the first tick. Per-tick conditions
//! (no legal move, no food in sight, unknown band codes) are not errors.

use thiserror::Error;

/// Failure to construct a simulation world.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The terrain matrix has no cells.
    #[error("terrain matrix is empty")]
    EmptyTerrain,

    /// A terrain row has a different width than the first row.
    #[error("terrain row {row} has {found} columns, expected {expected}")]
    RaggedTerrain {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A terrain cell is NaN or infinite.
    #[error("terrain cell ({row}, {col}) is not a finite band code")]
    NonFiniteBand { row: usize, col: usize },

    /// A population record places an agent outside the grid.
    #[error("{kind} record at ({row}, {col}) lies outside the terrain grid")]
    OutOfBounds {
        kind: &'static str,
        row: i32,
        col: i32,
    },

    /// More than one grower was supplied.
    #[error("population holds {0} growers, at most one may exist")]
    TooManyGrowers(usize),

    /// Configuration JSON could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
