//! Movement resolution - neighbourhoods, legality filtering, and step choice.
//!
//! Every agent moves at most one cell per step. A step is either goal-directed
//! (towards a food target) or a uniform pick among the legal offsets of the
//! agent's neighbourhood. With no legal offset the agent stays where it is.

use crate::components::*;
use crate::rng::SimRng;
use crate::systems::roster_order;
use crate::terrain::{PassabilityProfile, TerrainGrid};
use bevy_ecs::prelude::*;

/// Up, left, right, down.
pub const VON_NEUMANN: [Offset; 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// All eight surrounding cells.
pub const MOORE: [Offset; 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Left and right only, for larvae on a branch.
pub const LATERAL: [Offset; 2] = [(0, -1), (0, 1)];

/// Downward drift of a flyer caught in rain, including staying put.
pub const RAIN_DRIFT: [Offset; 4] = [(1, 1), (1, 0), (0, 0), (1, -1)];

/// Von Neumann plus staying put, for the grower.
pub const GROWER_MOVES: [Offset; 5] = [(-1, 0), (0, -1), (0, 0), (0, 1), (1, 0)];

/// Offsets from `offsets` whose destination the profile admits.
pub fn legal_offsets(
    terrain: &TerrainGrid,
    from: Position,
    offsets: &[Offset],
    profile: PassabilityProfile,
) -> Vec<Offset> {
    offsets
        .iter()
        .copied()
        .filter(|&offset| terrain.is_passable(from.offset(offset), profile))
        .collect()
}

/// Uniform pick among legal offsets; stationary when none is legal.
pub fn random_step(
    terrain: &TerrainGrid,
    rng: &mut SimRng,
    from: Position,
    offsets: &[Offset],
    profile: PassabilityProfile,
) -> Position {
    let legal = legal_offsets(terrain, from, offsets, profile);
    match rng.choose(&legal) {
        Some(offset) => from.offset(offset),
        None => from,
    }
}

/// Single-axis unit step towards `to`, along the axis with the larger gap.
/// Ties go to the column axis. `None` when already there.
pub fn axis_step_toward(from: Position, to: Position) -> Option<Offset> {
    let dr = to.row - from.row;
    let dc = to.col - from.col;
    if dr == 0 && dc == 0 {
        None
    } else if dr.abs() > dc.abs() {
        Some((dr.signum(), 0))
    } else {
        Some((0, dc.signum()))
    }
}

/// Diagonal-capable unit step towards `to`. Not legality-filtered.
pub fn diagonal_step_toward(from: Position, to: Position) -> Position {
    from.offset(((to.row - from.row).signum(), (to.col - from.col).signum()))
}

/// Burrower step: head for the target along one axis if that cell is
/// diggable, otherwise wander the von Neumann neighbourhood.
pub fn burrower_step(
    terrain: &TerrainGrid,
    rng: &mut SimRng,
    from: Position,
    target: Option<Position>,
) -> Position {
    if let Some(target) = target {
        let Some(offset) = axis_step_toward(from, target) else {
            return from;
        };
        let next = from.offset(offset);
        if terrain.is_passable(next, PassabilityProfile::Burrower) {
            return next;
        }
    }
    random_step(terrain, rng, from, &VON_NEUMANN, PassabilityProfile::Burrower)
}

/// System that moves ground predators one random Moore step.
pub fn ground_predator_system(
    terrain: Res<TerrainGrid>,
    mut rng: ResMut<SimRng>,
    mut predators: Query<(Entity, &AgentId, &mut Position), With<GroundPredator>>,
) {
    let order = roster_order(predators.iter().map(|(entity, id, _)| (entity, *id)));
    for entity in order {
        let Ok((_, _, mut pos)) = predators.get_mut(entity) else {
            continue;
        };
        let next = random_step(&terrain, &mut rng, *pos, &MOORE, PassabilityProfile::GroundPredator);
        debug_assert!(terrain.contains(next), "ground predator left the grid at {next:?}");
        *pos = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::codes;

    #[test]
    fn test_axis_step_prefers_larger_gap() {
        let from = Position::new(5, 5);
        assert_eq!(axis_step_toward(from, Position::new(9, 6)), Some((1, 0)));
        assert_eq!(axis_step_toward(from, Position::new(4, 1)), Some((0, -1)));
        assert_eq!(axis_step_toward(from, Position::new(7, 7)), Some((0, 1)));
        assert_eq!(axis_step_toward(from, from), None);
    }

    #[test]
    fn test_diagonal_step() {
        let from = Position::new(5, 5);
        assert_eq!(diagonal_step_toward(from, Position::new(1, 9)), Position::new(4, 6));
        assert_eq!(diagonal_step_toward(from, Position::new(5, 0)), Position::new(5, 4));
    }

    #[test]
    fn test_random_step_stays_when_boxed_in() {
        let mut terrain = TerrainGrid::new(3, 3, codes::ROCK);
        terrain.set_band(Position::new(1, 1), codes::TUNNEL);
        let mut rng = SimRng::from_seed(3);
        let next = random_step(&terrain, &mut rng, Position::new(1, 1), &VON_NEUMANN, PassabilityProfile::Burrower);
        assert_eq!(next, Position::new(1, 1));
    }

    #[test]
    fn test_random_step_only_legal() {
        let mut terrain = TerrainGrid::new(3, 3, codes::ROCK);
        terrain.set_band(Position::new(1, 1), codes::TUNNEL);
        terrain.set_band(Position::new(1, 2), codes::GROUND);
        let mut rng = SimRng::from_seed(11);
        for _ in 0..10 {
            let next = random_step(&terrain, &mut rng, Position::new(1, 1), &VON_NEUMANN, PassabilityProfile::Burrower);
            assert_eq!(next, Position::new(1, 2));
        }
    }

    #[test]
    fn test_burrower_step_falls_back_when_blocked() {
        let mut terrain = TerrainGrid::new(3, 3, codes::ROCK);
        terrain.set_band(Position::new(1, 1), codes::TUNNEL);
        terrain.set_band(Position::new(2, 1), codes::GROUND);
        let mut rng = SimRng::from_seed(5);
        // Target to the right is behind rock; the only legal cell is below.
        let next = burrower_step(&terrain, &mut rng, Position::new(1, 1), Some(Position::new(1, 2)));
        assert_eq!(next, Position::new(2, 1));
    }

    #[test]
    fn test_ground_predator_stays_on_its_bands() {
        let mut world = World::new();
        let mut terrain = TerrainGrid::new(5, 5, codes::SKY);
        for col in 0..5 {
            terrain.set_band(Position::new(3, col), codes::GRASS);
        }
        world.insert_resource(terrain);
        world.insert_resource(SimRng::from_seed(2));
        let entity = world
            .spawn((AgentId(0), Position::new(3, 2), GroundPredator::default()))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(ground_predator_system);
        for _ in 0..20 {
            schedule.run(&mut world);
            assert_eq!(world.get::<Position>(entity).unwrap().row, 3);
        }
    }
}
