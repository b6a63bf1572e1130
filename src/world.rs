//! Snapshot types.
//!
//! The `Snapshot` struct is the serializable, read-only view of one tick that
//! a renderer or log sink consumes. Every roster is sorted by id.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::SimEvent;
use crate::systems::lifecycle::MaturationTally;
use crate::systems::serialization::snapshot_to_json_string;
use crate::systems::weather::RainState;
use crate::terrain::{TerrainGrid, TerrainSnapshot};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a burrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurrowerSnapshot {
    pub id: u32,
    pub row: i32,
    pub col: i32,
    pub hungry: bool,
    pub timer: u32,
}

/// Snapshot of a flyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyerSnapshot {
    pub id: u32,
    pub row: i32,
    pub col: i32,
    pub group: FlyerGroup,
    pub alive: bool,
    pub killer: Option<u32>,
    pub hungry: bool,
    pub timer: u32,
    /// Frame selector for the flap animation.
    pub wings_open: bool,
}

/// Snapshot of a maturation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LarvaSnapshot {
    pub id: u32,
    pub row: i32,
    pub col: i32,
    pub phase_counter: u32,
    pub phase: MaturationPhase,
}

/// Snapshot of a ground predator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorSnapshot {
    pub id: u32,
    pub row: i32,
    pub col: i32,
    pub hungry: bool,
    /// Frame selector for the walk animation.
    pub stride_left: bool,
}

/// Snapshot of a grower and its trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowerSnapshot {
    pub id: u32,
    pub row: i32,
    pub col: i32,
    pub age: usize,
    pub trail: Vec<Position>,
}

/// Snapshot of a flower or fossil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSnapshot {
    pub id: u32,
    pub row: i32,
    pub col: i32,
}

/// Per-kind population counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub burrowers: usize,
    pub flyers: usize,
    pub larvae: usize,
    pub predators: usize,
    pub growers: usize,
    pub flowers: usize,
    pub fossils: usize,
    /// Maturation units created since startup.
    pub larvae_spawned: u32,
}

/// Complete simulation state after one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks completed.
    pub tick: u64,
    pub rain_active: bool,
    pub terrain: TerrainSnapshot,
    pub burrowers: Vec<BurrowerSnapshot>,
    pub flyers: Vec<FlyerSnapshot>,
    pub larvae: Vec<LarvaSnapshot>,
    pub predators: Vec<PredatorSnapshot>,
    pub growers: Vec<GrowerSnapshot>,
    pub flowers: Vec<FoodSnapshot>,
    pub fossils: Vec<FoodSnapshot>,
    /// Every cell flooded so far.
    pub flooded: Vec<Position>,
    pub counts: PopulationCounts,
    /// Events emitted during the tick.
    pub events: Vec<SimEvent>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, events: Vec<SimEvent>) -> Self {
        let (crawl_until, emerge_at) = world
            .get_resource::<SimConfig>()
            .map(|c| (c.larva_crawl_until, c.larva_emerge_at))
            .unwrap_or((10, 16));

        let mut burrowers: Vec<_> = world
            .query::<(&AgentId, &Position, &Burrower)>()
            .iter(world)
            .map(|(id, pos, b)| BurrowerSnapshot {
                id: id.0,
                row: pos.row,
                col: pos.col,
                hungry: b.hunger.hungry,
                timer: b.hunger.timer,
            })
            .collect();
        burrowers.sort_unstable_by_key(|s| s.id);

        let mut flyers: Vec<_> = world
            .query::<(&AgentId, &Position, &Flyer)>()
            .iter(world)
            .map(|(id, pos, f)| FlyerSnapshot {
                id: id.0,
                row: pos.row,
                col: pos.col,
                group: f.group,
                alive: f.is_alive(),
                killer: match f.status {
                    FlyerStatus::Dead { killer } => killer.map(|k| k.0),
                    FlyerStatus::Alive => None,
                },
                hungry: f.hunger.hungry,
                timer: f.hunger.timer,
                wings_open: f.group.wings_open(tick),
            })
            .collect();
        flyers.sort_unstable_by_key(|s| s.id);

        let mut larvae: Vec<_> = world
            .query::<(&AgentId, &Position, &MaturationUnit)>()
            .iter(world)
            .map(|(id, pos, unit)| LarvaSnapshot {
                id: id.0,
                row: pos.row,
                col: pos.col,
                phase_counter: unit.phase_counter,
                phase: unit.phase(crawl_until, emerge_at),
            })
            .collect();
        larvae.sort_unstable_by_key(|s| s.id);

        let mut predators: Vec<_> = world
            .query::<(&AgentId, &Position, &GroundPredator)>()
            .iter(world)
            .map(|(id, pos, p)| PredatorSnapshot {
                id: id.0,
                row: pos.row,
                col: pos.col,
                hungry: p.hungry,
                stride_left: (id.0 % 2 == 1) != (tick % 2 == 1),
            })
            .collect();
        predators.sort_unstable_by_key(|s| s.id);

        let mut growers: Vec<_> = world
            .query::<(&AgentId, &Position, &Grower)>()
            .iter(world)
            .map(|(id, pos, g)| GrowerSnapshot {
                id: id.0,
                row: pos.row,
                col: pos.col,
                age: g.age(),
                trail: g.trail.clone(),
            })
            .collect();
        growers.sort_unstable_by_key(|s| s.id);

        let flowers = food_snapshots(world.query_filtered::<(&ResourceId, &Position), With<Flower>>().iter(world));
        let fossils = food_snapshots(world.query_filtered::<(&ResourceId, &Position), With<Fossil>>().iter(world));

        let terrain = world
            .get_resource::<TerrainGrid>()
            .map(TerrainSnapshot::from_grid)
            .unwrap_or_default();
        let (rain_active, flooded) = world
            .get_resource::<RainState>()
            .map(|r| (r.active, r.flooded.clone()))
            .unwrap_or_default();
        let larvae_spawned = world.get_resource::<MaturationTally>().map(|t| t.0).unwrap_or(0);

        let counts = PopulationCounts {
            burrowers: burrowers.len(),
            flyers: flyers.iter().filter(|f| f.alive).count(),
            larvae: larvae.len(),
            predators: predators.len(),
            growers: growers.len(),
            flowers: flowers.len(),
            fossils: fossils.len(),
            larvae_spawned,
        };

        Self {
            tick,
            rain_active,
            terrain,
            burrowers,
            flyers,
            larvae,
            predators,
            growers,
            flowers,
            fossils,
            flooded,
            counts,
            events,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        snapshot_to_json_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn food_snapshots<'a>(items: impl Iterator<Item = (&'a ResourceId, &'a Position)>) -> Vec<FoodSnapshot> {
    let mut food: Vec<_> = items
        .map(|(id, pos)| FoodSnapshot {
            id: id.0,
            row: pos.row,
            col: pos.col,
        })
        .collect();
    food.sort_unstable_by_key(|f| f.id);
    food
}
