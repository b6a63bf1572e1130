//! ECS systems for the Eden simulation.
//!
//! Systems contain the ecosystem rules that operate on components.
//!
//! ## Tick Order
//!
//! One tick runs every system below exactly once, chained in this order.
//! The order is causal: flyers check predation against predator positions
//! from the previous tick, because predators only move after them.
//!
//! 1. `burrower_system` - hunger, move or forage, dig, eat fossils
//! 2. `flyer_system` - hunger, move or forage, predation check
//! 3. `maturation_system` - spawn, crawl, sleep, emerge
//! 4. `cull_dead_flyers_system` - drop eaten flyers from the roster
//! 5. `ground_predator_system` - wander
//! 6. `grower_system` - crawl, grow trail, fossilize and rebirth
//! 7. `resource_resync_system` - rebuild flower/fossil entities from terrain
//! 8. `weather_system` - rain window and tunnel flooding
//!
//! Every system walks its agents in ascending `AgentId` order so that a
//! seeded run replays identically regardless of ECS storage order.

pub mod clock;
pub mod foraging;
pub mod lifecycle;
pub mod movement;
pub mod predation;
pub mod resources;
pub mod serialization;
pub mod weather;

pub use clock::*;
pub use foraging::*;
pub use lifecycle::*;
pub use movement::*;
pub use predation::*;
pub use resources::*;
pub use serialization::*;
pub use weather::*;

use crate::components::AgentId;
use bevy_ecs::prelude::Entity;

/// Entities sorted by agent id.
pub(crate) fn roster_order(agents: impl Iterator<Item = (Entity, AgentId)>) -> Vec<Entity> {
    let mut order: Vec<(AgentId, Entity)> = agents.map(|(entity, id)| (id, entity)).collect();
    order.sort_unstable_by_key(|(id, _)| *id);
    order.into_iter().map(|(_, entity)| entity).collect()
}
