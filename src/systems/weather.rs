//! Weather - the rain window and tunnel flooding.

use crate::components::Position;
use crate::config::SimConfig;
use crate::events::{EventLog, SimEvent};
use crate::systems::clock::SimTick;
use crate::terrain::TerrainGrid;
use bevy_ecs::prelude::*;
use tracing::info;

/// Global rain flag plus every cell flooded so far.
#[derive(Resource, Debug, Clone, Default)]
pub struct RainState {
    pub active: bool,
    /// Flooded cells in flooding order. Never cleared.
    pub flooded: Vec<Position>,
}

/// Rain falls strictly inside the configured window.
pub fn is_raining(config: &SimConfig, elapsed: u64) -> bool {
    config.rain_after < elapsed && elapsed < config.rain_until
}

/// System that updates the rain flag and floods one tunnel row per rainy tick.
pub fn weather_system(
    config: Res<SimConfig>,
    tick: Res<SimTick>,
    mut rain: ResMut<RainState>,
    mut terrain: ResMut<TerrainGrid>,
    mut log: ResMut<EventLog>,
) {
    // Announce transitions only
    let raining = is_raining(&config, tick.0);
    if raining != rain.active {
        rain.active = raining;
        if raining {
            info!(tick = tick.0, "rain started");
            log.push(SimEvent::RainStarted { tick: tick.0 });
        } else {
            info!(tick = tick.0, "rain stopped");
            log.push(SimEvent::RainStopped { tick: tick.0 });
        }
    }
    if !raining {
        return;
    }

    // One tunnel row floods per rainy tick
    let flooded = terrain.flood_first_tunnel_row();
    if let Some(first) = flooded.first() {
        info!(row = first.row, cells = flooded.len(), "tunnel row flooded");
        log.push(SimEvent::Flooded {
            tick: tick.0,
            row: first.row,
            cells: flooded.len(),
        });
        rain.flooded.extend(flooded);
    }
}
