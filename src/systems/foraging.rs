//! Foraging - hunger-driven movement of burrowers and flyers.
//!
//! A hungry agent heads for the nearest food on the current menu. Burrowers
//! dig as they go and eat fossils on contact; flyers sip from flowers, which
//! stay in place.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::{EventLog, SimEvent};
use crate::rng::SimRng;
use crate::spatial::PredatorIndex;
use crate::systems::clock::SimTick;
use crate::systems::movement::{burrower_step, diagonal_step_toward, random_step, MOORE, RAIN_DRIFT};
use crate::systems::predation::resolve_predation;
use crate::systems::roster_order;
use crate::systems::weather::RainState;
use crate::terrain::{codes, PassabilityProfile, TerrainGrid};
use bevy_ecs::prelude::*;
use tracing::debug;

/// Index of the nearest candidate by Euclidean distance. Ties go to the
/// earliest candidate.
pub fn nearest_target(from: Position, candidates: &[Position]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let distance = from.distance_to(candidate);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Food visible to foragers this tick, in row-major order.
struct Menu {
    entries: Vec<(Position, ResourceId, Entity)>,
}

impl Menu {
    fn collect<'a>(items: impl Iterator<Item = (Entity, &'a ResourceId, &'a Position)>) -> Self {
        let mut entries: Vec<_> = items.map(|(entity, id, pos)| (*pos, *id, entity)).collect();
        entries.sort_unstable_by_key(|(pos, id, _)| (*pos, *id));
        Self { entries }
    }

    fn positions(&self) -> Vec<Position> {
        self.entries.iter().map(|(pos, _, _)| *pos).collect()
    }

    fn nearest(&self, from: Position) -> Option<Position> {
        nearest_target(from, &self.positions()).map(|i| self.entries[i].0)
    }

    fn find(&self, pos: Position) -> Option<usize> {
        self.entries.iter().position(|(p, _, _)| *p == pos)
    }

    fn take(&mut self, index: usize) -> (Position, ResourceId, Entity) {
        self.entries.remove(index)
    }
}

/// System that runs the burrower pass: hunger, movement, digging, and
/// fossil consumption. Moves twice while it rains.
#[allow(clippy::too_many_arguments)]
pub fn burrower_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    tick: Res<SimTick>,
    rain: Res<RainState>,
    mut terrain: ResMut<TerrainGrid>,
    mut rng: ResMut<SimRng>,
    mut log: ResMut<EventLog>,
    mut burrowers: Query<(Entity, &AgentId, &mut Position, &mut Burrower), Without<Fossil>>,
    fossils: Query<(Entity, &ResourceId, &Position), With<Fossil>>,
) {
    // Fossils eaten this tick drop off the menu at once
    let mut menu = Menu::collect(fossils.iter());
    // Rain doubles burrower speed
    let steps = if rain.active { 2 } else { 1 };

    let order = roster_order(burrowers.iter().map(|(entity, id, _, _)| (entity, *id)));
    for entity in order {
        let Ok((_, id, mut pos, mut burrower)) = burrowers.get_mut(entity) else {
            continue;
        };
        burrower.hunger.advance(config.burrower_satiation);

        for _ in 0..steps {
            // Seek food only when hungry, otherwise wander
            let target = if burrower.hunger.hungry { menu.nearest(*pos) } else { None };
            let next = burrower_step(&terrain, &mut rng, *pos, target);
            debug_assert!(terrain.contains(next), "burrower {id:?} left the grid at {next:?}");
            *pos = next;

            if let Some(index) = menu.find(next) {
                let (_, resource, fossil) = menu.take(index);
                commands.entity(fossil).despawn();
                burrower.hunger.feed();
                debug!(id = id.0, row = next.row, col = next.col, "burrower ate a fossil");
                log.push(SimEvent::Fed {
                    tick: tick.0,
                    kind: AgentKind::Burrower,
                    id: *id,
                    food: ResourceKind::Fossil,
                    resource,
                });
            }

            // Dig
            terrain.set_band(next, codes::TUNNEL);
        }
    }
}

/// System that runs the flyer pass: hunger, movement, nectar, and the
/// predation check against last tick's predator positions.
#[allow(clippy::too_many_arguments)]
pub fn flyer_system(
    config: Res<SimConfig>,
    tick: Res<SimTick>,
    rain: Res<RainState>,
    terrain: Res<TerrainGrid>,
    mut rng: ResMut<SimRng>,
    mut log: ResMut<EventLog>,
    mut flyers: Query<(Entity, &AgentId, &mut Position, &mut Flyer), Without<GroundPredator>>,
    flowers: Query<(Entity, &ResourceId, &Position), (With<Flower>, Without<Flyer>)>,
    predators: Query<(&AgentId, &Position), (With<GroundPredator>, Without<Flyer>)>,
) {
    let menu = Menu::collect(flowers.iter());
    // Predators have not moved yet this tick
    let index = PredatorIndex::build(predators.iter());

    let order = roster_order(flyers.iter().map(|(entity, id, _, _)| (entity, *id)));
    for entity in order {
        let Ok((_, id, mut pos, mut flyer)) = flyers.get_mut(entity) else {
            continue;
        };
        if !flyer.is_alive() {
            continue;
        }

        // Rain grounds foraging: hunger is held off and flyers only drift
        if rain.active {
            flyer.hunger.hungry = false;
            *pos = random_step(&terrain, &mut rng, *pos, &RAIN_DRIFT, PassabilityProfile::Flyer);
        } else {
            flyer.hunger.advance(config.flyer_satiation);
            let target = if flyer.hunger.hungry { menu.nearest(*pos) } else { None };
            match target {
                Some(target) => {
                    *pos = diagonal_step_toward(*pos, target);
                    // Flowers are not consumed
                    if *pos == target {
                        if let Some(i) = menu.find(target) {
                            flyer.hunger.feed();
                            debug!(id = id.0, row = target.row, col = target.col, "flyer fed on a flower");
                            log.push(SimEvent::Fed {
                                tick: tick.0,
                                kind: AgentKind::Flyer,
                                id: *id,
                                food: ResourceKind::Flower,
                                resource: menu.entries[i].1,
                            });
                        }
                    }
                }
                None => {
                    *pos = random_step(&terrain, &mut rng, *pos, &MOORE, PassabilityProfile::Flyer);
                }
            }
        }
        debug_assert!(terrain.contains(*pos), "flyer {id:?} left the grid at {pos:?}");

        resolve_predation(&index, *id, *pos, &mut flyer, tick.0, &mut log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IdAllocator;

    fn world_with(terrain: TerrainGrid, raining: bool) -> World {
        let mut world = World::new();
        world.insert_resource(terrain);
        world.insert_resource(SimConfig::default());
        world.insert_resource(SimTick(0));
        world.insert_resource(RainState {
            active: raining,
            flooded: Vec::new(),
        });
        world.insert_resource(SimRng::from_seed(1));
        world.insert_resource(EventLog::default());
        world.insert_resource(IdAllocator::default());
        world
    }

    #[test]
    fn test_nearest_target_first_minimum_wins() {
        let from = Position::new(5, 5);
        let candidates = [Position::new(5, 8), Position::new(3, 5), Position::new(7, 5)];
        assert_eq!(nearest_target(from, &candidates), Some(1));
        assert_eq!(nearest_target(from, &[]), None);
    }

    #[test]
    fn test_hungry_burrower_eats_adjacent_fossil() {
        let mut terrain = TerrainGrid::new(3, 4, codes::ROCK);
        terrain.set_band(Position::new(1, 1), codes::TUNNEL);
        terrain.set_band(Position::new(1, 2), codes::FOSSIL);
        let mut world = world_with(terrain, false);
        let fossil = world.spawn((ResourceId(0), Position::new(1, 2), Fossil)).id();
        let burrower = world
            .spawn(BurrowerBundle::new(AgentId(0), Position::new(1, 1), true))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(burrower_system);
        schedule.run(&mut world);

        assert_eq!(*world.get::<Position>(burrower).unwrap(), Position::new(1, 2));
        assert_eq!(world.get::<Burrower>(burrower).unwrap().hunger, Hunger { hungry: false, timer: 0 });
        assert!(world.get::<Fossil>(fossil).is_none());
        assert_eq!(world.resource::<TerrainGrid>().get(Position::new(1, 2)), Some(codes::TUNNEL));
        assert_eq!(world.resource::<EventLog>().len(), 1);
    }

    #[test]
    fn test_burrower_moves_twice_in_rain() {
        let mut terrain = TerrainGrid::new(3, 6, codes::ROCK);
        for col in 1..5 {
            terrain.set_band(Position::new(1, col), codes::GROUND);
        }
        terrain.set_band(Position::new(1, 4), codes::FOSSIL);
        let mut world = world_with(terrain, true);
        world.spawn((ResourceId(0), Position::new(1, 4), Fossil));
        let burrower = world
            .spawn(BurrowerBundle::new(AgentId(0), Position::new(1, 1), true))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(burrower_system);
        schedule.run(&mut world);

        assert_eq!(*world.get::<Position>(burrower).unwrap(), Position::new(1, 3));
        let terrain = world.resource::<TerrainGrid>();
        assert_eq!(terrain.get(Position::new(1, 2)), Some(codes::TUNNEL));
        assert_eq!(terrain.get(Position::new(1, 3)), Some(codes::TUNNEL));
    }

    #[test]
    fn test_burrower_eats_after_second_rain_step() {
        let mut terrain = TerrainGrid::new(3, 5, codes::ROCK);
        terrain.set_band(Position::new(1, 1), codes::GROUND);
        terrain.set_band(Position::new(1, 2), codes::GROUND);
        terrain.set_band(Position::new(1, 3), codes::FOSSIL);
        let mut world = world_with(terrain, true);
        let fossil = world.spawn((ResourceId(0), Position::new(1, 3), Fossil)).id();
        let burrower = world
            .spawn(BurrowerBundle::new(AgentId(0), Position::new(1, 1), true))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(burrower_system);
        schedule.run(&mut world);

        assert_eq!(*world.get::<Position>(burrower).unwrap(), Position::new(1, 3));
        assert_eq!(world.get::<Burrower>(burrower).unwrap().hunger, Hunger { hungry: false, timer: 0 });
        assert!(world.get::<Fossil>(fossil).is_none());
        assert_eq!(world.resource::<TerrainGrid>().get(Position::new(1, 3)), Some(codes::TUNNEL));
        assert_eq!(world.resource::<EventLog>().len(), 1);
    }

    #[test]
    fn test_flyer_reaches_flower_diagonally() {
        let terrain = TerrainGrid::new(6, 6, codes::SKY);
        let mut world = world_with(terrain, false);
        world.spawn((ResourceId(0), Position::new(2, 2), Flower));
        let flyer = world
            .spawn(FlyerBundle::new(AgentId(0), Position::new(4, 4), FlyerGroup::Even, true))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(flyer_system);
        schedule.run(&mut world);
        assert_eq!(*world.get::<Position>(flyer).unwrap(), Position::new(3, 3));
        schedule.run(&mut world);
        assert_eq!(*world.get::<Position>(flyer).unwrap(), Position::new(2, 2));
        assert!(!world.get::<Flyer>(flyer).unwrap().hunger.hungry);
    }

    #[test]
    fn test_rain_suppresses_flyer_hunger() {
        let terrain = TerrainGrid::new(6, 6, codes::SKY);
        let mut world = world_with(terrain, true);
        let flyer = world
            .spawn(FlyerBundle::new(AgentId(0), Position::new(1, 3), FlyerGroup::Odd, true))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(flyer_system);
        schedule.run(&mut world);

        let pos = *world.get::<Position>(flyer).unwrap();
        assert!(pos.row >= 1);
        assert!(!world.get::<Flyer>(flyer).unwrap().hunger.hungry);
    }
}
