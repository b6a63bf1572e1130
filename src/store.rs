//! Entity store - identity allocation and initial population.
//!
//! Identities are monotonic and never reused, so a despawned flyer's id can
//! still be quoted in an event after it has left the world. Removal itself is
//! always deferred through `Commands`: a pass marks or despawns, and the world
//! only changes at the next sync point.

use crate::components::*;
use crate::error::SimError;
use crate::events::{EventLog, SimEvent};
use crate::terrain::{PassabilityProfile, TerrainGrid};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Monotonic id counters for agents and food.
#[derive(Resource, Debug, Default)]
pub struct IdAllocator {
    next_agent: u32,
    next_resource: u32,
}

impl IdAllocator {
    pub fn agent(&mut self) -> AgentId {
        let id = AgentId(self.next_agent);
        self.next_agent += 1;
        id
    }

    pub fn resource(&mut self) -> ResourceId {
        let id = ResourceId(self.next_resource);
        self.next_resource += 1;
        id
    }
}

/// One agent as delivered by the population loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopulationRecord {
    Burrower {
        row: i32,
        col: i32,
        #[serde(default)]
        hungry: bool,
    },
    Flyer {
        row: i32,
        col: i32,
        #[serde(default)]
        hungry: bool,
        #[serde(default = "default_alive")]
        alive: bool,
    },
    GroundPredator {
        row: i32,
        col: i32,
        #[serde(default)]
        hungry: bool,
    },
    Grower { row: i32, col: i32 },
}

fn default_alive() -> bool {
    true
}

impl PopulationRecord {
    pub fn kind(&self) -> AgentKind {
        match self {
            PopulationRecord::Burrower { .. } => AgentKind::Burrower,
            PopulationRecord::Flyer { .. } => AgentKind::Flyer,
            PopulationRecord::GroundPredator { .. } => AgentKind::GroundPredator,
            PopulationRecord::Grower { .. } => AgentKind::Grower,
        }
    }

    pub fn position(&self) -> Position {
        match *self {
            PopulationRecord::Burrower { row, col, .. }
            | PopulationRecord::Flyer { row, col, .. }
            | PopulationRecord::GroundPredator { row, col, .. }
            | PopulationRecord::Grower { row, col } => Position::new(row, col),
        }
    }

    fn profile(&self) -> PassabilityProfile {
        match self {
            PopulationRecord::Burrower { .. } => PassabilityProfile::Burrower,
            PopulationRecord::Flyer { .. } => PassabilityProfile::Flyer,
            PopulationRecord::GroundPredator { .. } => PassabilityProfile::GroundPredator,
            PopulationRecord::Grower { .. } => PassabilityProfile::Grower,
        }
    }
}

/// Reject records that cannot be placed. Records on a band their kind cannot
/// occupy are accepted with a warning; the agent simply stays put until a
/// legal move opens up.
pub fn validate_population(records: &[PopulationRecord], terrain: &TerrainGrid) -> Result<(), SimError> {
    let growers = records.iter().filter(|r| r.kind() == AgentKind::Grower).count();
    if growers > 1 {
        return Err(SimError::TooManyGrowers(growers));
    }

    for record in records {
        let pos = record.position();
        if !terrain.contains(pos) {
            return Err(SimError::OutOfBounds {
                kind: record.kind().label(),
                row: pos.row,
                col: pos.col,
            });
        }
        if !terrain.is_passable(pos, record.profile()) {
            warn!(kind = record.kind().label(), row = pos.row, col = pos.col, "agent placed on a band it cannot occupy");
        }
    }
    Ok(())
}

/// Spawn every record into the world, in record order, logging a tick-0
/// `Spawned` event for each. Returns the number of flyer records, the default
/// replenishment baseline.
pub fn spawn_population(world: &mut World, records: &[PopulationRecord]) -> usize {
    let mut flyers = 0;
    for record in records {
        let id = world.resource_mut::<IdAllocator>().agent();
        let position = record.position();
        match *record {
            PopulationRecord::Burrower { hungry, .. } => {
                world.spawn(BurrowerBundle::new(id, position, hungry));
            }
            PopulationRecord::Flyer { hungry, alive, .. } => {
                flyers += 1;
                let mut bundle = FlyerBundle::new(id, position, FlyerGroup::from_id(id), hungry);
                if !alive {
                    bundle.flyer.status = FlyerStatus::Dead { killer: None };
                }
                world.spawn(bundle);
            }
            PopulationRecord::GroundPredator { hungry, .. } => {
                world.spawn(GroundPredatorBundle {
                    id,
                    position,
                    predator: GroundPredator { hungry },
                });
            }
            PopulationRecord::Grower { .. } => {
                world.spawn(GrowerBundle::new(id, position));
            }
        }
        world.resource_mut::<EventLog>().push(SimEvent::Spawned {
            tick: 0,
            kind: record.kind(),
            id,
            position,
        });
    }
    flyers
}
