//! Core state types for the surface simulation.
//!
//! - `ForceWell` / `Direction` : persistent radial deformations
//! - `Wave`                    : transient ripples
//! - `SimulationState`         : everything undo/redo and save/load capture
//!
//! Positions live in grid space as `NVec2` (x across columns, y across rows).

use nalgebra::Vector2;

use super::forces::ForceWellRegistry;
use super::grid::GridModel;
use super::params::Parameters;

pub type NVec2 = Vector2<f64>;

/// Which way a well pushes the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// +1.0 for `Up`, -1.0 for `Down`
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// Only +1 and -1 name a direction
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Direction::Up),
            -1 => Some(Direction::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceWell {
    pub origin: NVec2, // grid-space centre
    pub gravity: f64, // signed strength
    pub gravity_range: f64, // radius of influence, > 0
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    pub origin: NVec2, // grid-space centre
    pub start_time: f64, // seconds on the caller's monotonic clock
    pub amplitude: f64,
}

/// Snapshot-able simulation state.
///
/// Cloning is a deep copy: the force buffer and well list are owned vectors,
/// so a stored clone can never alias live buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub params: Parameters,
    pub grid: GridModel,
    pub wells: ForceWellRegistry,
}

impl SimulationState {
    /// Recompute the accumulated force buffer from the registered wells
    pub fn rebake(&mut self) {
        self.wells.rebake(&mut self.grid, self.params.force_scale);
    }
}
