//! Terrain grid - band values, classification, and passability.
//!
//! The terrain is a row-major matrix of floating band codes. Each code places a
//! cell in a band (tunnel, ground, trunk, sky, ...) and each agent kind has a
//! passability profile over those codes. Agents rewrite the grid as they go:
//! burrowers dig tunnels, the grower leaves a trail, rain floods tunnels.

use crate::components::Position;
use crate::error::SimError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Canonical band codes written by the simulation.
pub mod codes {
    pub const BORDER: f64 = 0.0;
    pub const TUNNEL: f64 = 0.1;
    pub const GROUND: f64 = 0.2;
    pub const FOSSIL: f64 = 0.21;
    pub const ROCK: f64 = 0.35;
    pub const SUN: f64 = 0.5;
    pub const TRAIL: f64 = 0.7;
    pub const FLOWER: f64 = 0.745;
    pub const GRASS: f64 = 0.755;
    pub const SKY: f64 = 0.83;
}

/// Tolerance used when matching exact marker codes.
pub const BAND_EPSILON: f64 = 1e-6;

#[inline]
fn near(value: f64, code: f64) -> bool {
    (value - code).abs() < BAND_EPSILON
}

/// Semantic classification of a band code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Border or cloud, [0.00, 0.01].
    Border,
    /// Dug tunnel, (0.01, 0.10].
    Tunnel,
    /// Undisturbed ground below 0.22.
    Ground,
    /// Fossil site marker, exactly 0.21.
    Fossil,
    /// Tree trunk or branch, [0.24, 0.27].
    Trunk,
    /// Rock, exactly 0.35.
    Rock,
    /// Sun marker, exactly 0.5. Decorative.
    Sun,
    /// Bush or leaves, [0.62, 0.75).
    Bush,
    /// Grower trail marker, exactly 0.7.
    Trail,
    /// Flower site, exactly 0.745.
    Flower,
    /// Grass, exactly 0.755.
    Grass,
    /// Any other open-air code above 0.35.
    OpenAir,
    /// Sky, 0.83 and above.
    Sky,
}

impl Band {
    /// Classify a band code. Returns `None` for codes outside the known table.
    pub fn classify(value: f64) -> Option<Band> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        // Exact markers first; several sit inside wider ranges.
        if near(value, codes::TRAIL) {
            return Some(Band::Trail);
        }
        if near(value, codes::FLOWER) {
            return Some(Band::Flower);
        }
        if near(value, codes::GRASS) {
            return Some(Band::Grass);
        }
        if near(value, codes::FOSSIL) {
            return Some(Band::Fossil);
        }
        if near(value, codes::ROCK) {
            return Some(Band::Rock);
        }
        if near(value, codes::SUN) {
            return Some(Band::Sun);
        }

        let band = if value <= 0.01 {
            Band::Border
        } else if value <= codes::TUNNEL + BAND_EPSILON {
            Band::Tunnel
        } else if value < 0.22 {
            Band::Ground
        } else if (0.24..=0.27).contains(&value) {
            Band::Trunk
        } else if value >= codes::SKY - BAND_EPSILON {
            Band::Sky
        } else if (0.62..0.75).contains(&value) {
            Band::Bush
        } else if value > codes::ROCK {
            Band::OpenAir
        } else {
            return None;
        };
        Some(band)
    }
}

/// Per-kind predicate over band codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassabilityProfile {
    /// Ground, tunnel, and fossil sites: (0, 0.22).
    Burrower,
    /// Open air: above 0.35.
    Flyer,
    /// Grass, rock, and trunk: [0.24, 0.79).
    GroundPredator,
    /// Trunk and grass, never sky: below 0.8.
    MaturationUnit,
    /// Ground and tunnel, never fossil sites or its own trail: (0, 0.21).
    Grower,
}

impl PassabilityProfile {
    /// Whether the profile admits this band code.
    pub fn admits(&self, value: f64) -> bool {
        match self {
            PassabilityProfile::Burrower => value > 0.0 && value < 0.22,
            PassabilityProfile::Flyer => value > codes::ROCK + BAND_EPSILON,
            PassabilityProfile::GroundPredator => value >= 0.24 - BAND_EPSILON && value < 0.79,
            PassabilityProfile::MaturationUnit => value < 0.8,
            PassabilityProfile::Grower => value > 0.0 && value < codes::FOSSIL - BAND_EPSILON,
        }
    }
}

/// Grid of band codes, stored row-major.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Band codes (row-major order).
    pub cells: Vec<f64>,
}

impl TerrainGrid {
    /// Create a grid filled with a single band code.
    pub fn new(rows: usize, cols: usize, fill: f64) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    /// Build a grid from row vectors, as delivered by a terrain loader.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SimError> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.is_empty() || cols == 0 {
            return Err(SimError::EmptyTerrain);
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != cols {
                return Err(SimError::RaggedTerrain {
                    row,
                    expected: cols,
                    found: values.len(),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(SimError::NonFiniteBand { row, col });
            }
            cells.extend_from_slice(values);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    fn cell_index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.row as usize * self.cols + pos.col as usize)
        } else {
            None
        }
    }

    /// Whether a position lies inside the grid.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.rows && (pos.col as usize) < self.cols
    }

    /// Band code at a position, `None` outside the grid.
    pub fn get(&self, pos: Position) -> Option<f64> {
        self.cell_index(pos).map(|i| self.cells[i])
    }

    /// Band of the cell at a position. `None` outside the grid or for unknown codes.
    pub fn classify(&self, pos: Position) -> Option<Band> {
        self.get(pos).and_then(Band::classify)
    }

    /// Whether an agent with this profile may occupy the position.
    /// Out-of-bounds cells and unknown codes are never passable.
    pub fn is_passable(&self, pos: Position, profile: PassabilityProfile) -> bool {
        match self.get(pos) {
            Some(value) => Band::classify(value).is_some() && profile.admits(value),
            None => false,
        }
    }

    /// Overwrite the code at a position. Returns false outside the grid.
    pub fn set_band(&mut self, pos: Position, value: f64) -> bool {
        match self.cell_index(pos) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    fn position_of(&self, index: usize) -> Position {
        Position::new((index / self.cols) as i32, (index % self.cols) as i32)
    }

    /// All cells of a band, in row-major order.
    #[cfg(not(feature = "parallel"))]
    pub fn cells_with_band(&self, band: Band) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| Band::classify(**v) == Some(band))
            .map(|(i, _)| self.position_of(i))
            .collect()
    }

    /// All cells of a band, in row-major order.
    #[cfg(feature = "parallel")]
    pub fn cells_with_band(&self, band: Band) -> Vec<Position> {
        self.cells
            .par_iter()
            .enumerate()
            .filter(|(_, v)| Band::classify(**v) == Some(band))
            .map(|(i, _)| self.position_of(i))
            .collect()
    }

    /// Cells holding codes outside the known band table, in row-major order.
    pub fn unknown_cells(&self) -> Vec<(Position, f64)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| Band::classify(**v).is_none())
            .map(|(i, v)| (self.position_of(i), *v))
            .collect()
    }

    /// Rewrite every cell of one band with a new code. Returns the rewritten cells.
    pub fn replace_band(&mut self, from: Band, to: f64) -> Vec<Position> {
        let changed = self.cells_with_band(from);
        for &pos in &changed {
            self.set_band(pos, to);
        }
        changed
    }

    /// Flood the topmost row that still holds tunnel cells, turning all of
    /// that row's tunnels back into ground. Returns the flooded cells.
    pub fn flood_first_tunnel_row(&mut self) -> Vec<Position> {
        let tunnels = self.cells_with_band(Band::Tunnel);
        let Some(first_row) = tunnels.first().map(|p| p.row) else {
            return Vec::new();
        };

        let flooded: Vec<Position> = tunnels.into_iter().take_while(|p| p.row == first_row).collect();
        for &pos in &flooded {
            self.set_band(pos, codes::GROUND);
        }
        flooded
    }
}

/// Snapshot of terrain for serialization to a renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Flattened band codes (row-major).
    pub cells: Vec<f64>,
}

impl TerrainSnapshot {
    pub fn from_grid(grid: &TerrainGrid) -> Self {
        Self {
            rows: grid.rows,
            cols: grid.cols,
            cells: grid.cells.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_markers() {
        assert_eq!(Band::classify(0.0), Some(Band::Border));
        assert_eq!(Band::classify(0.1), Some(Band::Tunnel));
        assert_eq!(Band::classify(0.2), Some(Band::Ground));
        assert_eq!(Band::classify(0.21), Some(Band::Fossil));
        assert_eq!(Band::classify(0.25), Some(Band::Trunk));
        assert_eq!(Band::classify(0.35), Some(Band::Rock));
        assert_eq!(Band::classify(0.5), Some(Band::Sun));
        assert_eq!(Band::classify(0.65), Some(Band::Bush));
        assert_eq!(Band::classify(0.7), Some(Band::Trail));
        assert_eq!(Band::classify(0.745), Some(Band::Flower));
        assert_eq!(Band::classify(0.755), Some(Band::Grass));
        assert_eq!(Band::classify(0.83), Some(Band::Sky));
        assert_eq!(Band::classify(1.5), Some(Band::Sky));
        assert_eq!(Band::classify(0.4), Some(Band::OpenAir));
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(Band::classify(0.23), None);
        assert_eq!(Band::classify(0.3), None);
        assert_eq!(Band::classify(-0.5), None);
        assert_eq!(Band::classify(f64::NAN), None);
    }

    #[test]
    fn test_profiles() {
        assert!(PassabilityProfile::Burrower.admits(codes::TUNNEL));
        assert!(PassabilityProfile::Burrower.admits(codes::FOSSIL));
        assert!(!PassabilityProfile::Burrower.admits(codes::TRAIL));
        assert!(!PassabilityProfile::Grower.admits(codes::FOSSIL));
        assert!(PassabilityProfile::Grower.admits(codes::GROUND));
        assert!(!PassabilityProfile::Flyer.admits(codes::ROCK));
        assert!(PassabilityProfile::Flyer.admits(codes::SKY));
        assert!(PassabilityProfile::GroundPredator.admits(codes::GRASS));
        assert!(!PassabilityProfile::GroundPredator.admits(codes::SKY));
        assert!(PassabilityProfile::MaturationUnit.admits(0.25));
        assert!(!PassabilityProfile::MaturationUnit.admits(codes::SKY));
    }

    #[test]
    fn test_out_of_bounds_impassable() {
        let grid = TerrainGrid::new(3, 3, codes::GROUND);
        assert!(!grid.is_passable(Position::new(-1, 0), PassabilityProfile::Burrower));
        assert!(!grid.is_passable(Position::new(0, 3), PassabilityProfile::Burrower));
        assert!(grid.is_passable(Position::new(1, 1), PassabilityProfile::Burrower));
    }

    #[test]
    fn test_unknown_band_impassable() {
        let mut grid = TerrainGrid::new(2, 2, codes::SKY);
        grid.set_band(Position::new(0, 0), 0.3);
        assert!(!grid.is_passable(Position::new(0, 0), PassabilityProfile::MaturationUnit));
        assert_eq!(grid.unknown_cells().len(), 1);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = TerrainGrid::from_rows(vec![vec![0.2, 0.2], vec![0.2]]).unwrap_err();
        assert!(matches!(err, SimError::RaggedTerrain { row: 1, expected: 2, found: 1 }));
        assert!(matches!(TerrainGrid::from_rows(vec![]), Err(SimError::EmptyTerrain)));
    }

    #[test]
    fn test_cells_with_band_row_major() {
        let mut grid = TerrainGrid::new(3, 3, codes::GROUND);
        grid.set_band(Position::new(2, 0), codes::FOSSIL);
        grid.set_band(Position::new(0, 2), codes::FOSSIL);
        assert_eq!(
            grid.cells_with_band(Band::Fossil),
            vec![Position::new(0, 2), Position::new(2, 0)]
        );
    }

    #[test]
    fn test_flood_first_tunnel_row() {
        let mut grid = TerrainGrid::new(4, 4, codes::GROUND);
        grid.set_band(Position::new(1, 0), codes::TUNNEL);
        grid.set_band(Position::new(1, 3), codes::TUNNEL);
        grid.set_band(Position::new(3, 2), codes::TUNNEL);

        let flooded = grid.flood_first_tunnel_row();
        assert_eq!(flooded, vec![Position::new(1, 0), Position::new(1, 3)]);
        assert_eq!(grid.classify(Position::new(1, 0)), Some(Band::Ground));
        assert_eq!(grid.classify(Position::new(3, 2)), Some(Band::Tunnel));

        let flooded = grid.flood_first_tunnel_row();
        assert_eq!(flooded, vec![Position::new(3, 2)]);
        assert!(grid.flood_first_tunnel_row().is_empty());
    }
}
