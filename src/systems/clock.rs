//! Simulation tick counter.

use bevy_ecs::prelude::*;

/// Number of ticks completed before the one currently running.
/// Advanced by `SimWorld` after each schedule run; systems only read it.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}
