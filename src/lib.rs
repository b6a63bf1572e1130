//! Eden - Simulation Core
//!
//! A deterministic, tick-driven ECS simulation of a small garden ecosystem:
//! burrowers dig for fossils, flyers chase flowers and dodge ground
//! predators, larvae replenish the flyers, and a grower leaves a fossil trail
//! behind it. Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod rng;
pub mod spatial;
pub mod store;
pub mod systems;
pub mod terrain;
pub mod world;

pub use api::{default_garden, SimWorld};
pub use components::*;
pub use config::{LifespanMode, SimConfig, Span};
pub use error::SimError;
pub use events::{EventLog, SimEvent};
pub use rng::SimRng;
pub use spatial::PredatorIndex;
pub use store::PopulationRecord;
pub use systems::*;
pub use terrain::{Band, PassabilityProfile, TerrainGrid, TerrainSnapshot};
pub use world::{PopulationCounts, Snapshot};
