//! Simulation configuration.
//!
//! All tunable constants of the ecosystem live in `SimConfig`. The defaults
//! reproduce the classic garden scene; tests shrink the spawn sites and
//! windows to fit small hand-built grids.

use crate::components::Position;
use crate::error::SimError;
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive integer span, e.g. a lifespan range or a spawn region axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: i32,
    pub max: i32,
}

impl Span {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Uniform draw from the span.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.min..=self.max)
    }
}

/// How the grower lifespan is drawn across generations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifespanMode {
    /// Draw once at startup and reuse it for every grower.
    #[default]
    Fixed,
    /// Draw a fresh lifespan for each new grower.
    RedrawPerGeneration,
}

/// Configuration for the ecosystem rules.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for every random choice in the simulation.
    pub seed: u64,
    /// Ticks a burrower stays fed before hunger returns.
    pub burrower_satiation: u32,
    /// Ticks a flyer stays fed before hunger returns.
    pub flyer_satiation: u32,
    /// Rain falls while `rain_after < elapsed < rain_until`.
    pub rain_after: u64,
    pub rain_until: u64,
    /// Base cell where a maturation unit appears.
    pub larva_spawn: Position,
    /// Column jitter added to `larva_spawn`, drawn from `0..=jitter`.
    pub larva_spawn_jitter: i32,
    /// Cell where an emerged flyer appears.
    pub flyer_emerge_at: Position,
    /// Phase counter value at which the larva stops crawling and goes dormant.
    pub larva_crawl_until: u32,
    /// Phase counter value at which the flyer emerges.
    pub larva_emerge_at: u32,
    /// Grower lifespan range in ticks.
    pub grower_lifespan: Span,
    pub lifespan_mode: LifespanMode,
    /// Region in which a new grower is placed.
    pub grower_spawn_rows: Span,
    pub grower_spawn_cols: Span,
    /// Flyer population the maturation chain replenishes towards.
    /// `None` uses the number of flyers present at startup.
    pub flyer_baseline: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            burrower_satiation: 20,
            flyer_satiation: 15,
            rain_after: 35,
            rain_until: 50,
            larva_spawn: Position::new(14, 50),
            larva_spawn_jitter: 4,
            flyer_emerge_at: Position::new(16, 52),
            larva_crawl_until: 10,
            larva_emerge_at: 16,
            grower_lifespan: Span::new(12, 30),
            lifespan_mode: LifespanMode::Fixed,
            grower_spawn_rows: Span::new(35, 50),
            grower_spawn_cols: Span::new(10, 100),
            flyer_baseline: None,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that ranges and windows are usable.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grower_lifespan.is_empty() || self.grower_lifespan.min < 1 {
            return Err(SimError::Configuration(format!(
                "grower lifespan {}..={} must be a non-empty range of positive ticks",
                self.grower_lifespan.min, self.grower_lifespan.max
            )));
        }
        if self.grower_spawn_rows.is_empty() || self.grower_spawn_cols.is_empty() {
            return Err(SimError::Configuration("grower spawn region is empty".into()));
        }
        if self.rain_until <= self.rain_after {
            return Err(SimError::Configuration(format!(
                "rain window ({}, {}) is empty",
                self.rain_after, self.rain_until
            )));
        }
        if self.larva_spawn_jitter < 0 {
            return Err(SimError::Configuration("larva spawn jitter must not be negative".into()));
        }
        if self.larva_crawl_until < 2 || self.larva_emerge_at <= self.larva_crawl_until {
            return Err(SimError::Configuration(format!(
                "larva phases out of order: crawl until {}, emerge at {}",
                self.larva_crawl_until, self.larva_emerge_at
            )));
        }
        Ok(())
    }
}
