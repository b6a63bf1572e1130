//! Discrete events emitted by the simulation for an external log sink.
//!
//! Systems push `SimEvent`s into the `EventLog` resource; `SimWorld::step`
//! drains the log into the tick's snapshot. The core never formats text.

use crate::components::{AgentId, AgentKind, Position, ResourceId, ResourceKind};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Something noteworthy that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Spawned {
        tick: u64,
        kind: AgentKind,
        id: AgentId,
        position: Position,
    },
    Fed {
        tick: u64,
        kind: AgentKind,
        id: AgentId,
        food: ResourceKind,
        resource: ResourceId,
    },
    FlyerEaten {
        tick: u64,
        flyer: AgentId,
        killer: AgentId,
        position: Position,
    },
    /// A maturation unit stopped crawling and went dormant.
    Pupated { tick: u64, id: AgentId, position: Position },
    /// A maturation unit completed and a flyer took its place.
    Emerged {
        tick: u64,
        larva: AgentId,
        flyer: AgentId,
        position: Position,
    },
    GrowerDied {
        tick: u64,
        id: AgentId,
        age: usize,
        fossils: Vec<Position>,
    },
    RainStarted { tick: u64 },
    RainStopped { tick: u64 },
    Flooded { tick: u64, row: i32, cells: usize },
    UnknownBand { tick: u64, position: Position, value: f64 },
}

/// Tick-scoped buffer of events.
#[derive(Resource, Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::default();
        log.push(SimEvent::RainStarted { tick: 36 });
        assert_eq!(log.len(), 1);
        assert_eq!(log.drain(), vec![SimEvent::RainStarted { tick: 36 }]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&SimEvent::Flooded { tick: 40, row: 3, cells: 2 }).unwrap();
        assert!(json.contains("\"event\":\"flooded\""));
    }
}
