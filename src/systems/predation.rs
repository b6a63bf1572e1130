//! Predation - flyers caught by ground predators.

use crate::components::*;
use crate::events::{EventLog, SimEvent};
use crate::spatial::PredatorIndex;
use bevy_ecs::prelude::*;
use tracing::info;

/// Mark the flyer dead if a predator stands on its cell or reaches up into
/// it. Returns the killer.
pub fn resolve_predation(
    index: &PredatorIndex,
    id: AgentId,
    pos: Position,
    flyer: &mut Flyer,
    tick: u64,
    log: &mut EventLog,
) -> Option<AgentId> {
    let killer = index.catcher_at(pos)?;
    flyer.status = FlyerStatus::Dead { killer: Some(killer) };
    info!(flyer = id.0, killer = killer.0, row = pos.row, col = pos.col, "flyer eaten");
    log.push(SimEvent::FlyerEaten {
        tick,
        flyer: id,
        killer,
        position: pos,
    });
    Some(killer)
}

/// System that removes dead flyers from the roster.
pub fn cull_dead_flyers_system(mut commands: Commands, flyers: Query<(Entity, &Flyer)>) {
    // Eaten flyers leave at the next sync point
    for (entity, flyer) in flyers.iter() {
        if !flyer.is_alive() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flyer_on_predator_dies() {
        let index = PredatorIndex::build([(&AgentId(3), &Position::new(8, 8))]);
        let mut flyer = Flyer {
            group: FlyerGroup::Even,
            status: FlyerStatus::Alive,
            hunger: Hunger::default(),
        };
        let mut log = EventLog::default();

        assert_eq!(resolve_predation(&index, AgentId(1), Position::new(8, 8), &mut flyer, 4, &mut log), Some(AgentId(3)));
        assert_eq!(flyer.status, FlyerStatus::Dead { killer: Some(AgentId(3)) });
        assert_eq!(
            log.events(),
            &[SimEvent::FlyerEaten {
                tick: 4,
                flyer: AgentId(1),
                killer: AgentId(3),
                position: Position::new(8, 8),
            }]
        );
    }

    #[test]
    fn test_flyer_beside_predator_lives() {
        let index = PredatorIndex::build([(&AgentId(3), &Position::new(8, 8))]);
        let mut flyer = Flyer {
            group: FlyerGroup::Odd,
            status: FlyerStatus::Alive,
            hunger: Hunger::default(),
        };
        let mut log = EventLog::default();
        assert_eq!(resolve_predation(&index, AgentId(1), Position::new(8, 9), &mut flyer, 0, &mut log), None);
        assert!(flyer.is_alive());
        assert!(log.is_empty());
    }

    #[test]
    fn test_cull_removes_only_dead() {
        let mut world = World::new();
        let alive = world
            .spawn(FlyerBundle::new(AgentId(0), Position::new(0, 0), FlyerGroup::Even, false))
            .id();
        let mut bundle = FlyerBundle::new(AgentId(1), Position::new(0, 1), FlyerGroup::Odd, false);
        bundle.flyer.status = FlyerStatus::Dead { killer: Some(AgentId(9)) };
        let dead = world.spawn(bundle).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(cull_dead_flyers_system);
        schedule.run(&mut world);

        assert!(world.get::<Flyer>(alive).is_some());
        assert!(world.get::<Flyer>(dead).is_none());
    }
}
