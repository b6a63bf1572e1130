//! Public API for the simulation.
//!
//! `SimWorld` is the simulation clock. It owns the ECS world holding the
//! whole simulation state and advances it one tick at a time; a caller may
//! stop between any two ticks.
//!
//! ## Tick
//!
//! Each `step` runs the chained schedule once (see `systems` for the order),
//! then drains the tick's events into a `Snapshot` for the renderer and the
//! log sink. Agents, food, and terrain are only touched by systems.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{EventLog, SimEvent};
use crate::rng::SimRng;
use crate::store::{spawn_population, validate_population, IdAllocator, PopulationRecord};
use crate::systems::*;
use crate::terrain::{codes, TerrainGrid, TerrainSnapshot};
use crate::world::{PopulationCounts, Snapshot};
use bevy_ecs::prelude::*;
use std::ops::ControlFlow;
use tracing::{info, warn};

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing the simulation from a terrain matrix and population list
/// - Stepping the simulation forward
/// - Extracting state snapshots
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
}

impl SimWorld {
    /// Build a simulation. Fails before the first tick on bad configuration,
    /// an empty grid, or unplaceable population records.
    pub fn new(terrain: TerrainGrid, population: &[PopulationRecord], config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        if terrain.rows == 0 || terrain.cols == 0 || terrain.cells.len() != terrain.rows * terrain.cols {
            return Err(SimError::EmptyTerrain);
        }
        validate_population(population, &terrain)?;

        let flyer_records = population
            .iter()
            .filter(|record| record.kind() == AgentKind::Flyer)
            .count();
        let baseline = config.flyer_baseline.unwrap_or(flyer_records);
        if baseline > 0 {
            check_maturation_sites(&config, &terrain)?;
        }

        let mut log = EventLog::default();
        for (position, value) in terrain.unknown_cells() {
            warn!(row = position.row, col = position.col, value, "unknown band code, treated as impassable");
            log.push(SimEvent::UnknownBand { tick: 0, position, value });
        }

        let mut rng = SimRng::from_seed(config.seed);
        let lifespan = GrowerLifespan::draw(&config, &mut rng);

        let mut world = World::new();
        world.insert_resource(SimTick(0));
        world.insert_resource(IdAllocator::default());
        world.insert_resource(log);
        world.insert_resource(RainState::default());
        world.insert_resource(rng);
        world.insert_resource(lifespan);
        world.insert_resource(FlyerBaseline(baseline));
        world.insert_resource(MaturationTally::default());
        world.insert_resource(config);
        world.insert_resource(terrain);

        spawn_population(&mut world, population);

        // Food entities exist before the first forager looks for them.
        let mut startup = Schedule::default();
        startup.add_systems(resource_resync_system);
        startup.run(&mut world);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                burrower_system,
                flyer_system,
                maturation_system,
                cull_dead_flyers_system,
                ground_predator_system,
                grower_system,
                resource_resync_system,
                weather_system,
            )
                .chain(),
        );

        let mut sim = Self { world, schedule, tick: 0 };
        let counts = sim.counts();
        info!(
            burrowers = counts.burrowers,
            flyers = counts.flyers,
            predators = counts.predators,
            growers = counts.growers,
            flowers = counts.flowers,
            fossils = counts.fossils,
            lifespan = lifespan.ticks,
            baseline,
            "simulation initialized"
        );
        Ok(sim)
    }

    /// Build a simulation from a raw row-major band matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>, population: &[PopulationRecord], config: SimConfig) -> Result<Self, SimError> {
        Self::new(TerrainGrid::from_rows(rows)?, population, config)
    }

    /// Create the stock garden scene with the given seed.
    pub fn new_default_garden(seed: u64) -> Result<Self, SimError> {
        let (terrain, population) = default_garden();
        let config = SimConfig {
            seed,
            ..Default::default()
        };
        Self::new(terrain, &population, config)
    }

    /// Advance one tick and return its snapshot.
    pub fn step(&mut self) -> Snapshot {
        self.schedule.run(&mut self.world);

        if let Some(mut tick_res) = self.world.get_resource_mut::<SimTick>() {
            tick_res.increment();
        }
        self.tick += 1;

        if cfg!(debug_assertions) {
            self.check_invariants();
        }

        let events = self
            .world
            .get_resource_mut::<EventLog>()
            .map(|mut log| log.drain())
            .unwrap_or_default();
        Snapshot::from_world(&mut self.world, self.tick, events)
    }

    /// Step until `max_ticks` have run or `observe` breaks. Returns the
    /// number of ticks run.
    pub fn run_while<F>(&mut self, max_ticks: u64, mut observe: F) -> u64
    where
        F: FnMut(&Snapshot) -> ControlFlow<()>,
    {
        for ran in 1..=max_ticks {
            let snapshot = self.step();
            if observe(&snapshot).is_break() {
                return ran;
            }
        }
        max_ticks
    }

    /// Run `ticks` ticks and return the final snapshot.
    pub fn run(&mut self, ticks: u64) -> Snapshot {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.step());
        }
        match last {
            Some(snapshot) => snapshot,
            None => self.snapshot(),
        }
    }

    /// Snapshot of the current state. Pending events are included but not
    /// drained.
    pub fn snapshot(&mut self) -> Snapshot {
        let events = self
            .world
            .get_resource::<EventLog>()
            .map(|log| log.events().to_vec())
            .unwrap_or_default();
        Snapshot::from_world(&mut self.world, self.tick, events)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Per-kind counts of the current state.
    pub fn counts(&mut self) -> PopulationCounts {
        self.snapshot().counts
    }

    /// Get a full terrain snapshot.
    pub fn terrain_snapshot(&self) -> TerrainSnapshot {
        TerrainSnapshot::from_grid(self.terrain())
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Whether rain is falling.
    pub fn is_raining(&self) -> bool {
        self.world.resource::<RainState>().active
    }

    /// Get terrain grid reference.
    pub fn terrain(&self) -> &TerrainGrid {
        self.world.resource::<TerrainGrid>()
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Assert the population invariants after a tick.
    fn check_invariants(&mut self) {
        let growers = self.world.query::<&Grower>().iter(&self.world).count();
        debug_assert!(growers <= 1, "{growers} growers alive");
        let units = self.world.query::<&MaturationUnit>().iter(&self.world).count();
        debug_assert!(units <= 1, "{units} maturation units alive");

        let (rows, cols) = {
            let terrain = self.world.resource::<TerrainGrid>();
            (terrain.rows as i32, terrain.cols as i32)
        };
        let mut agents = self.world.query::<(&AgentId, &Position)>();
        for (id, pos) in agents.iter(&self.world) {
            debug_assert!(
                (0..rows).contains(&pos.row) && (0..cols).contains(&pos.col),
                "agent {id:?} outside the grid at {pos:?}"
            );
        }
    }
}

/// Larva spawn cells and the emergence cell must lie on the grid.
fn check_maturation_sites(config: &SimConfig, terrain: &TerrainGrid) -> Result<(), SimError> {
    let first = config.larva_spawn;
    let last = config.larva_spawn.offset((0, config.larva_spawn_jitter));
    for (what, pos) in [("larva spawn", first), ("larva spawn", last), ("flyer emergence", config.flyer_emerge_at)] {
        if !terrain.contains(pos) {
            return Err(SimError::Configuration(format!(
                "{what} cell ({}, {}) lies outside the {}x{} grid",
                pos.row, pos.col, terrain.rows, terrain.cols
            )));
        }
    }
    Ok(())
}

/// The stock 60x120 garden: sky with a sun and a tree, a grass strip with
/// flowers and a boulder, and soil below with fossils and an old tunnel.
pub fn default_garden() -> (TerrainGrid, Vec<PopulationRecord>) {
    const ROWS: usize = 60;
    const COLS: usize = 120;
    const TRUNK: f64 = 0.25;
    const LEAVES: f64 = 0.65;

    let mut terrain = TerrainGrid::new(ROWS, COLS, codes::SKY);
    let mut paint = |rows: std::ops::RangeInclusive<i32>, cols: std::ops::RangeInclusive<i32>, value: f64| {
        for row in rows {
            for col in cols.clone() {
                terrain.set_band(Position::new(row, col), value);
            }
        }
    };

    paint(32..=58, 1..=118, codes::GROUND);
    paint(30..=31, 1..=118, codes::GRASS);
    paint(30..=30, 80..=84, codes::ROCK);
    paint(33..=33, 20..=30, codes::TUNNEL);
    paint(3..=5, 105..=110, codes::SUN);
    paint(6..=11, 40..=66, LEAVES);
    paint(12..=29, 48..=51, TRUNK);
    paint(14..=14, 44..=60, TRUNK);
    for col in [15, 30, 70, 90, 108] {
        paint(29..=29, col..=col, codes::FLOWER);
    }
    for (row, col) in [(40, 20), (45, 60), (50, 90), (38, 75), (55, 33)] {
        paint(row..=row, col..=col, codes::FOSSIL);
    }
    paint(0..=0, 0..=119, codes::BORDER);
    paint(59..=59, 0..=119, codes::BORDER);
    paint(0..=59, 0..=0, codes::BORDER);
    paint(0..=59, 119..=119, codes::BORDER);

    let mut population = Vec::new();
    for (row, col) in [(36, 12), (40, 45), (44, 70), (48, 95), (52, 25), (56, 60)] {
        population.push(PopulationRecord::Burrower { row, col, hungry: false });
    }
    for (row, col) in [(5, 10), (8, 30), (12, 75), (15, 95), (20, 20), (22, 60), (25, 100), (18, 112)] {
        population.push(PopulationRecord::Flyer {
            row,
            col,
            hungry: false,
            alive: true,
        });
    }
    for col in [20, 60, 95] {
        population.push(PopulationRecord::GroundPredator { row: 30, col, hungry: false });
    }
    population.push(PopulationRecord::Grower { row: 42, col: 40 });

    (terrain, population)
}
