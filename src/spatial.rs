//! Cell index of ground predators for predation checks.
//!
//! Provides O(1) lookup of the predator that covers a cell, rather than a
//! scan of every predator for every flyer.

use crate::components::{AgentId, Position};
use std::collections::HashMap;

/// How a predator covers a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reach {
    /// The predator stands on the cell.
    Direct,
    /// The cell is directly above the predator.
    Tongue,
}

/// Entry in a covered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachEntry {
    pub predator: AgentId,
    pub reach: Reach,
}

/// Map from cell to the predators covering it.
#[derive(Debug, Default)]
pub struct PredatorIndex {
    cells: HashMap<Position, Vec<ReachEntry>>,
}

impl PredatorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from predator positions.
    pub fn build<'a>(predators: impl IntoIterator<Item = (&'a AgentId, &'a Position)>) -> Self {
        let mut index = Self::new();
        for (id, pos) in predators {
            index.insert(*id, *pos);
        }
        index
    }

    /// Register a predator at `pos`, covering its own cell and the one above.
    pub fn insert(&mut self, predator: AgentId, pos: Position) {
        self.cells.entry(pos).or_default().push(ReachEntry {
            predator,
            reach: Reach::Direct,
        });
        self.cells.entry(pos.reach_cell()).or_default().push(ReachEntry {
            predator,
            reach: Reach::Tongue,
        });
    }

    /// The predator that catches a flyer at `pos`, if any. A predator standing
    /// on the cell wins over one reaching up into it; among equals the lowest
    /// id wins.
    pub fn catcher_at(&self, pos: Position) -> Option<AgentId> {
        self.cells
            .get(&pos)?
            .iter()
            .min_by_key(|entry| (entry.reach, entry.predator))
            .map(|entry| entry.predator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_and_tongue_cells() {
        let mut index = PredatorIndex::new();
        index.insert(AgentId(4), Position::new(10, 10));

        assert_eq!(index.catcher_at(Position::new(10, 10)), Some(AgentId(4)));
        assert_eq!(index.catcher_at(Position::new(9, 10)), Some(AgentId(4)));
        assert_eq!(index.catcher_at(Position::new(11, 10)), None);
        assert_eq!(index.catcher_at(Position::new(10, 11)), None);
    }

    #[test]
    fn test_direct_beats_tongue() {
        let mut index = PredatorIndex::new();
        // Predator 1 reaches up into (5, 5); predator 7 stands on it.
        index.insert(AgentId(1), Position::new(6, 5));
        index.insert(AgentId(7), Position::new(5, 5));
        assert_eq!(index.catcher_at(Position::new(5, 5)), Some(AgentId(7)));
    }

    #[test]
    fn test_lowest_id_among_equals() {
        let index = PredatorIndex::build([
            (&AgentId(9), &Position::new(2, 2)),
            (&AgentId(3), &Position::new(2, 2)),
        ]);
        assert_eq!(index.catcher_at(Position::new(2, 2)), Some(AgentId(3)));
    }
}
