//! Food resync - flower and fossil entities mirror the terrain.
//!
//! Food is derived from the band map rather than persisted on its own: every
//! tick the flower and fossil entities are reconciled against the cells of
//! their band. Entities whose cell still carries the band keep their id;
//! stale ones are despawned and uncovered cells get fresh entities.

use crate::components::*;
use crate::store::IdAllocator;
use crate::terrain::{Band, TerrainGrid};
use bevy_ecs::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// Marker component of a food kind and the band it lives on.
pub trait FoodMarker: Component + Default {
    const BAND: Band;
    const KIND: ResourceKind;
}

impl FoodMarker for Flower {
    const BAND: Band = Band::Flower;
    const KIND: ResourceKind = ResourceKind::Flower;
}

impl FoodMarker for Fossil {
    const BAND: Band = Band::Fossil;
    const KIND: ResourceKind = ResourceKind::Fossil;
}

/// Reconcile one food kind. Returns (spawned, despawned).
fn resync_food<M: FoodMarker>(
    commands: &mut Commands,
    terrain: &TerrainGrid,
    ids: &mut IdAllocator,
    existing: impl Iterator<Item = (Entity, ResourceId, Position)>,
) -> (usize, usize) {
    let mut uncovered: BTreeSet<Position> = terrain.cells_with_band(M::BAND).into_iter().collect();

    let mut existing: Vec<_> = existing.collect();
    existing.sort_unstable_by_key(|(_, id, _)| *id);

    let mut despawned = 0;
    for (entity, _, pos) in existing {
        if !uncovered.remove(&pos) {
            commands.entity(entity).despawn();
            despawned += 1;
        }
    }

    let spawned = uncovered.len();
    for pos in uncovered {
        commands.spawn((ids.resource(), pos, M::default()));
    }
    (spawned, despawned)
}

/// System that rebuilds flower and fossil entities from the terrain.
pub fn resource_resync_system(
    mut commands: Commands,
    terrain: Res<TerrainGrid>,
    mut ids: ResMut<IdAllocator>,
    flowers: Query<(Entity, &ResourceId, &Position), With<Flower>>,
    fossils: Query<(Entity, &ResourceId, &Position), With<Fossil>>,
) {
    // Terrain is the source of truth for both food kinds
    let flower_items = flowers.iter().map(|(entity, id, pos)| (entity, *id, *pos));
    let (spawned, despawned) = resync_food::<Flower>(&mut commands, &terrain, &mut ids, flower_items);
    if spawned + despawned > 0 {
        debug!(kind = ?Flower::KIND, spawned, despawned, "food resynced");
    }

    let fossil_items = fossils.iter().map(|(entity, id, pos)| (entity, *id, *pos));
    let (spawned, despawned) = resync_food::<Fossil>(&mut commands, &terrain, &mut ids, fossil_items);
    if spawned + despawned > 0 {
        debug!(kind = ?Fossil::KIND, spawned, despawned, "food resynced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::codes;

    fn resync_world(terrain: TerrainGrid) -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(terrain);
        world.insert_resource(IdAllocator::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(resource_resync_system);
        (world, schedule)
    }

    fn fossil_cells(world: &mut World) -> Vec<(ResourceId, Position)> {
        let mut query = world.query_filtered::<(&ResourceId, &Position), With<Fossil>>();
        let mut cells: Vec<_> = query.iter(world).map(|(id, pos)| (*id, *pos)).collect();
        cells.sort_unstable();
        cells
    }

    #[test]
    fn test_spawns_food_for_band_cells() {
        let mut terrain = TerrainGrid::new(3, 3, codes::GROUND);
        terrain.set_band(Position::new(0, 2), codes::FOSSIL);
        terrain.set_band(Position::new(2, 0), codes::FOSSIL);
        terrain.set_band(Position::new(1, 1), codes::FLOWER);
        let (mut world, mut schedule) = resync_world(terrain);
        schedule.run(&mut world);

        assert_eq!(
            fossil_cells(&mut world),
            vec![(ResourceId(1), Position::new(0, 2)), (ResourceId(2), Position::new(2, 0))]
        );
        let mut flowers = world.query_filtered::<&Position, With<Flower>>();
        assert_eq!(flowers.iter(&world).copied().collect::<Vec<_>>(), vec![Position::new(1, 1)]);
    }

    #[test]
    fn test_keeps_ids_and_drops_stale() {
        let mut terrain = TerrainGrid::new(3, 3, codes::GROUND);
        terrain.set_band(Position::new(0, 0), codes::FOSSIL);
        terrain.set_band(Position::new(0, 1), codes::FOSSIL);
        let (mut world, mut schedule) = resync_world(terrain);
        schedule.run(&mut world);

        world.resource_mut::<TerrainGrid>().set_band(Position::new(0, 0), codes::TUNNEL);
        world.resource_mut::<TerrainGrid>().set_band(Position::new(2, 2), codes::FOSSIL);
        schedule.run(&mut world);

        assert_eq!(
            fossil_cells(&mut world),
            vec![(ResourceId(1), Position::new(0, 1)), (ResourceId(2), Position::new(2, 2))]
        );
    }

    #[test]
    fn test_duplicate_entities_collapse() {
        let mut terrain = TerrainGrid::new(2, 2, codes::GROUND);
        terrain.set_band(Position::new(1, 1), codes::FOSSIL);
        let (mut world, mut schedule) = resync_world(terrain);
        world.spawn((ResourceId(7), Position::new(1, 1), Fossil));
        world.spawn((ResourceId(3), Position::new(1, 1), Fossil));
        schedule.run(&mut world);

        assert_eq!(fossil_cells(&mut world), vec![(ResourceId(3), Position::new(1, 1))]);
    }
}
