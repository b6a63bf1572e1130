//! Lifecycle - the maturation chain and grower senescence.
//!
//! ## Maturation chain
//!
//! When the live flyer population is below its baseline and no maturation
//! unit exists, one is created with phase counter 1. On every later tick the
//! unit acts on its current counter and then increments it:
//!
//! - counter below `larva_crawl_until`: larva, crawls left or right
//! - counter below `larva_emerge_at`: dormant, hangs still
//! - counter at `larva_emerge_at`: a flyer emerges and the unit is removed
//!
//! With the default thresholds a unit created on tick T emerges on T + 16.
//!
//! ## Senescence
//!
//! The grower appends its position to its trail once per tick, so the trail
//! length is its age. When the age reaches the lifespan the whole trail turns
//! to fossil and a new grower is placed in the spawn region.

use crate::components::*;
use crate::config::{LifespanMode, SimConfig, Span};
use crate::events::{EventLog, SimEvent};
use crate::rng::SimRng;
use crate::store::IdAllocator;
use crate::systems::clock::SimTick;
use crate::systems::movement::{legal_offsets, random_step, GROWER_MOVES, LATERAL};
use crate::systems::roster_order;
use crate::terrain::{codes, Band, PassabilityProfile, TerrainGrid};
use bevy_ecs::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Flyer population the maturation chain replenishes towards.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlyerBaseline(pub usize);

/// Number of maturation units ever created.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaturationTally(pub u32);

/// Grower lifespan in ticks.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowerLifespan {
    pub ticks: usize,
}

impl GrowerLifespan {
    /// Uniform draw from the configured lifespan range.
    pub fn draw(config: &SimConfig, rng: &mut SimRng) -> Self {
        let ticks = config.grower_lifespan.sample(&mut rng.0).max(1);
        Self { ticks: ticks as usize }
    }
}

/// System that runs the maturation chain.
#[allow(clippy::too_many_arguments)]
pub fn maturation_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    tick: Res<SimTick>,
    baseline: Res<FlyerBaseline>,
    terrain: Res<TerrainGrid>,
    mut tally: ResMut<MaturationTally>,
    mut rng: ResMut<SimRng>,
    mut ids: ResMut<IdAllocator>,
    mut log: ResMut<EventLog>,
    flyers: Query<&Flyer>,
    mut units: Query<(Entity, &AgentId, &mut Position, &mut MaturationUnit), Without<Flyer>>,
) {
    // No unit yet: start one if the flyers are short
    if units.is_empty() {
        let alive = flyers.iter().filter(|flyer| flyer.is_alive()).count();
        if alive < baseline.0 {
            let id = ids.agent();
            let jitter = Span::new(0, config.larva_spawn_jitter).sample(&mut rng.0);
            let position = config.larva_spawn.offset((0, jitter));
            commands.spawn(MaturationBundle {
                id,
                position,
                unit: MaturationUnit::default(),
            });
            tally.0 += 1;
            info!(id = id.0, row = position.row, col = position.col, alive, baseline = baseline.0, "maturation unit spawned");
            log.push(SimEvent::Spawned {
                tick: tick.0,
                kind: AgentKind::MaturationUnit,
                id,
                position,
            });
        }
        return;
    }

    let order = roster_order(units.iter().map(|(entity, id, _, _)| (entity, *id)));
    for entity in order {
        let Ok((_, id, mut pos, mut unit)) = units.get_mut(entity) else {
            continue;
        };
        // Act on the current counter, then advance it
        match unit.phase(config.larva_crawl_until, config.larva_emerge_at) {
            MaturationPhase::Larva => {
                *pos = random_step(&terrain, &mut rng, *pos, &LATERAL, PassabilityProfile::MaturationUnit);
                unit.phase_counter += 1;
                if unit.phase_counter == config.larva_crawl_until {
                    info!(id = id.0, row = pos.row, col = pos.col, "larva went dormant");
                    log.push(SimEvent::Pupated {
                        tick: tick.0,
                        id: *id,
                        position: *pos,
                    });
                }
            }
            MaturationPhase::Dormant => {
                unit.phase_counter += 1;
            }
            MaturationPhase::Emerging => {
                let flyer = ids.agent();
                let position = config.flyer_emerge_at;
                commands.spawn(FlyerBundle::new(flyer, position, FlyerGroup::Emerged, false));
                commands.entity(entity).despawn();
                info!(larva = id.0, flyer = flyer.0, row = position.row, col = position.col, "flyer emerged");
                log.push(SimEvent::Emerged {
                    tick: tick.0,
                    larva: *id,
                    flyer,
                    position,
                });
                log.push(SimEvent::Spawned {
                    tick: tick.0,
                    kind: AgentKind::Flyer,
                    id: flyer,
                    position,
                });
            }
        }
    }
}

/// Cell for a new grower: uniform among grower-passable cells of the spawn
/// region not in `occupied`, else uniform over the region. The region is
/// clamped to the grid; if nothing of it is left the whole grid is used.
pub fn grower_spawn_position(
    terrain: &TerrainGrid,
    config: &SimConfig,
    occupied: &BTreeSet<Position>,
    rng: &mut SimRng,
) -> Position {
    let last_row = terrain.rows as i32 - 1;
    let last_col = terrain.cols as i32 - 1;
    let mut rows = Span::new(config.grower_spawn_rows.min.max(0), config.grower_spawn_rows.max.min(last_row));
    let mut cols = Span::new(config.grower_spawn_cols.min.max(0), config.grower_spawn_cols.max.min(last_col));
    if rows.is_empty() || cols.is_empty() {
        rows = Span::new(0, last_row);
        cols = Span::new(0, last_col);
    }

    let passable: Vec<Position> = (rows.min..=rows.max)
        .flat_map(|row| (cols.min..=cols.max).map(move |col| Position::new(row, col)))
        .filter(|&pos| terrain.is_passable(pos, PassabilityProfile::Grower) && !occupied.contains(&pos))
        .collect();

    match rng.choose(&passable) {
        Some(pos) => pos,
        None => Position::new(rows.sample(&mut rng.0), cols.sample(&mut rng.0)),
    }
}

/// System that runs the grower pass: crawl, grow the trail, fossilize on
/// death, and place a new grower when none remains.
#[allow(clippy::too_many_arguments)]
pub fn grower_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    tick: Res<SimTick>,
    mut lifespan: ResMut<GrowerLifespan>,
    mut terrain: ResMut<TerrainGrid>,
    mut rng: ResMut<SimRng>,
    mut ids: ResMut<IdAllocator>,
    mut log: ResMut<EventLog>,
    mut growers: Query<(Entity, &AgentId, &mut Position, &mut Grower), Without<Burrower>>,
    burrowers: Query<&Position, (With<Burrower>, Without<Grower>)>,
) {
    let occupied: BTreeSet<Position> = burrowers.iter().copied().collect();
    let mut living = 0;
    let mut died = false;

    let order = roster_order(growers.iter().map(|(entity, id, _, _)| (entity, *id)));
    for entity in order {
        let Ok((_, id, mut pos, mut grower)) = growers.get_mut(entity) else {
            continue;
        };
        // Crawl, never onto a burrower.
        let mut moves = legal_offsets(&terrain, *pos, &GROWER_MOVES, PassabilityProfile::Grower);
        moves.retain(|&offset| !occupied.contains(&pos.offset(offset)));
        if let Some(offset) = rng.choose(&moves) {
            *pos = pos.offset(offset);
        }
        debug_assert!(terrain.contains(*pos), "grower {id:?} left the grid at {pos:?}");

        // A burrower may have dug into the grower's cell before it was
        // marked; the trail still grows but the band under the burrower stays.
        grower.trail.push(*pos);
        if !occupied.contains(&*pos) {
            terrain.set_band(*pos, codes::TRAIL);
        }
        debug!(id = id.0, row = pos.row, col = pos.col, age = grower.age(), "grower crawled");

        // Still growing
        if grower.age() < lifespan.ticks {
            living += 1;
            continue;
        }

        // Every trail cell turns to fossil except those under a burrower.
        let mut fossils = terrain.replace_band(Band::Trail, codes::FOSSIL);
        for &cell in &grower.trail {
            if !occupied.contains(&cell) && terrain.set_band(cell, codes::FOSSIL) {
                fossils.push(cell);
            }
        }
        fossils.sort_unstable();
        fossils.dedup();

        info!(id = id.0, age = grower.age(), fossils = fossils.len(), "grower fossilized");
        log.push(SimEvent::GrowerDied {
            tick: tick.0,
            id: *id,
            age: grower.age(),
            fossils,
        });
        commands.entity(entity).despawn();
        died = true;
    }

    if living > 0 {
        return;
    }

    // No grower left: place the next generation.
    if died && config.lifespan_mode == LifespanMode::RedrawPerGeneration {
        *lifespan = GrowerLifespan::draw(&config, &mut rng);
    }
    let id = ids.agent();
    let position = grower_spawn_position(&terrain, &config, &occupied, &mut rng);
    commands.spawn(GrowerBundle::new(id, position));
    info!(id = id.0, row = position.row, col = position.col, lifespan = lifespan.ticks, "grower spawned");
    log.push(SimEvent::Spawned {
        tick: tick.0,
        kind: AgentKind::Grower,
        id,
        position,
    });
}
