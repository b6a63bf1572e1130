//! ECS components for the Eden ecosystem.
//!
//! Components are pure data attached to entities. Every agent carries an
//! `AgentId` and a `Position`; its kind-specific state lives in exactly one
//! of the kind components below. Food entities carry a `ResourceId`, a
//! `Position`, and a `Flower` or `Fossil` marker.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Neighbourhood offset as (row delta, column delta).
pub type Offset = (i32, i32);

/// Cell on the terrain grid.
#[derive(
    Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, (dr, dc): Offset) -> Position {
        Position::new(self.row + dr, self.col + dc)
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dr = f64::from(self.row - other.row);
        let dc = f64::from(self.col - other.col);
        (dr * dr + dc * dc).sqrt()
    }

    /// The cell directly above, where a ground predator's tongue reaches.
    pub fn reach_cell(&self) -> Position {
        Position::new(self.row - 1, self.col)
    }
}

// ============================================================================
// IDENTITY
// ============================================================================

/// Stable identity of an agent, assigned once at creation.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Stable identity of a flower or fossil.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// The five agent kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Burrower,
    Flyer,
    MaturationUnit,
    GroundPredator,
    Grower,
}

impl AgentKind {
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Burrower => "burrower",
            AgentKind::Flyer => "flyer",
            AgentKind::MaturationUnit => "maturation unit",
            AgentKind::GroundPredator => "ground predator",
            AgentKind::Grower => "grower",
        }
    }
}

/// Food kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Flower,
    Fossil,
}

// ============================================================================
// HUNGER
// ============================================================================

/// Satiation timer and hunger flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunger {
    pub hungry: bool,
    /// Ticks since the last meal.
    pub timer: u32,
}

impl Hunger {
    pub fn new(hungry: bool) -> Self {
        Self { hungry, timer: 0 }
    }

    /// Advance the timer one tick; hunger returns once it exceeds `satiation`.
    pub fn advance(&mut self, satiation: u32) {
        self.timer = self.timer.saturating_add(1);
        if self.timer > satiation {
            self.hungry = true;
        }
    }

    pub fn feed(&mut self) {
        self.hungry = false;
        self.timer = 0;
    }
}

// ============================================================================
// AGENT KINDS
// ============================================================================

/// Insect living in the soil. Digs tunnels and eats fossils.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Burrower {
    pub hunger: Hunger,
}

/// Animation group of a flyer; half the swarm flaps on odd ticks, half on even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlyerGroup {
    Even,
    Odd,
    /// Emerged from the maturation chain rather than present at startup.
    Emerged,
}

impl FlyerGroup {
    pub fn from_id(id: AgentId) -> Self {
        if id.0 % 2 == 0 {
            FlyerGroup::Even
        } else {
            FlyerGroup::Odd
        }
    }

    /// Whether the wings are drawn open on this tick.
    pub fn wings_open(&self, tick: u64) -> bool {
        match self {
            FlyerGroup::Even | FlyerGroup::Emerged => tick % 2 == 0,
            FlyerGroup::Odd => tick % 2 == 1,
        }
    }
}

/// Whether a flyer is still in play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlyerStatus {
    #[default]
    Alive,
    /// Out of play; `killer` is the ground predator that ate it, if any.
    Dead { killer: Option<AgentId> },
}

/// Pollinator. Flies through open air and feeds on flowers.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Flyer {
    pub group: FlyerGroup,
    pub status: FlyerStatus,
    pub hunger: Hunger,
}

impl Flyer {
    pub fn is_alive(&self) -> bool {
        self.status == FlyerStatus::Alive
    }
}

/// Stage of a maturation unit, derived from its phase counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaturationPhase {
    /// Crawls left and right along the host structure.
    Larva,
    /// Hangs still.
    Dormant,
    /// Completes and becomes a flyer.
    Emerging,
}

/// Larva-to-flyer carrier. At most one exists at a time.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaturationUnit {
    /// Starts at 1 on the creation tick, +1 per tick after.
    pub phase_counter: u32,
}

impl Default for MaturationUnit {
    fn default() -> Self {
        Self { phase_counter: 1 }
    }
}

impl MaturationUnit {
    pub fn phase(&self, crawl_until: u32, emerge_at: u32) -> MaturationPhase {
        if self.phase_counter >= emerge_at {
            MaturationPhase::Emerging
        } else if self.phase_counter >= crawl_until {
            MaturationPhase::Dormant
        } else {
            MaturationPhase::Larva
        }
    }
}

/// Terrestrial predator. Wanders grass, rock, and trunks.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GroundPredator {
    /// Tracked but does not drive behaviour.
    pub hungry: bool,
}

/// Soil dweller that grows a trail behind it and fossilizes on death.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grower {
    /// Every position held, one per tick lived.
    pub trail: Vec<Position>,
}

impl Grower {
    pub fn age(&self) -> usize {
        self.trail.len()
    }
}

// ============================================================================
// FOOD
// ============================================================================

/// Permanent nectar site.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Flower;

/// Edible fossil site. Removed once eaten.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Fossil;

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

#[derive(Bundle)]
pub struct BurrowerBundle {
    pub id: AgentId,
    pub position: Position,
    pub burrower: Burrower,
}

impl BurrowerBundle {
    pub fn new(id: AgentId, position: Position, hungry: bool) -> Self {
        Self {
            id,
            position,
            burrower: Burrower {
                hunger: Hunger::new(hungry),
            },
        }
    }
}

#[derive(Bundle)]
pub struct FlyerBundle {
    pub id: AgentId,
    pub position: Position,
    pub flyer: Flyer,
}

impl FlyerBundle {
    pub fn new(id: AgentId, position: Position, group: FlyerGroup, hungry: bool) -> Self {
        Self {
            id,
            position,
            flyer: Flyer {
                group,
                status: FlyerStatus::Alive,
                hunger: Hunger::new(hungry),
            },
        }
    }
}

#[derive(Bundle)]
pub struct MaturationBundle {
    pub id: AgentId,
    pub position: Position,
    pub unit: MaturationUnit,
}

#[derive(Bundle)]
pub struct GroundPredatorBundle {
    pub id: AgentId,
    pub position: Position,
    pub predator: GroundPredator,
}

#[derive(Bundle)]
pub struct GrowerBundle {
    pub id: AgentId,
    pub position: Position,
    pub grower: Grower,
}

impl GrowerBundle {
    pub fn new(id: AgentId, position: Position) -> Self {
        Self {
            id,
            position,
            grower: Grower::default(),
        }
    }
}
