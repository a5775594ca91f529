//! Persisted simulation state.
//!
//! A saved surface is a JSON document with three parts:
//!
//! - `params`      – shape, well defaults, force scale and grid geometry
//! - `forceArray`  – the baked force buffer, three components per node with
//!                   the height force in the third
//! - `forcePoints` – the registered wells, positions stored as `[x, 0, y]`
//!
//! ```json
//! {
//!   "params": { "a": 0.2, "b": 0.3, "tension": 1.5, "gravity": 0.6,
//!               "gravityRange": 50.0, "forceScale": 8000.0,
//!               "rows": 200, "cols": 200, "spacing": 1.0, "particleSize": 0.5 },
//!   "forceArray": [0.0, 0.0, 0.0, ...],
//!   "forcePoints": [
//!     { "position": [0.0, 0.0, 0.0], "gravity": 0.6,
//!       "gravityRange": 50.0, "forceDirection": 1 }
//!   ]
//! }
//! ```
//!
//! Converting a document back into state validates everything up front, so
//! a bad document is rejected before any live state is touched.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::simulation::forces::ForceWellRegistry;
use crate::simulation::grid::{checked_node_count, GridModel};
use crate::simulation::params::{BaseShape, Parameters};
use crate::simulation::states::{Direction, ForceWell, NVec2, SimulationState};

/// Components stored per node in `forceArray`
const FORCE_COMPONENTS: usize = 3;
/// Component holding the height force
const HEIGHT_COMPONENT: usize = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParamsDocument {
    pub a: f64,
    pub b: f64,
    pub tension: f64,
    pub gravity: f64,
    pub gravity_range: f64,
    pub force_scale: f64,
    pub rows: u32,
    pub cols: u32,
    pub spacing: f64,
    pub particle_size: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForcePointDocument {
    pub position: [f64; 3],
    pub gravity: f64,
    pub gravity_range: f64,
    pub force_direction: i8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    pub params: ParamsDocument,
    pub force_array: Vec<f64>,
    pub force_points: Vec<ForcePointDocument>,
}

impl StateDocument {
    /// Capture `state` as a document
    pub fn from_state(state: &SimulationState) -> Self {
        let p = &state.params;
        let grid = &state.grid;

        let params = ParamsDocument {
            a: p.shape.a,
            b: p.shape.b,
            tension: p.shape.tension,
            gravity: p.gravity,
            gravity_range: p.gravity_range,
            force_scale: p.force_scale,
            // GridModel caps both axes at u32::MAX
            rows: grid.rows() as u32,
            cols: grid.cols() as u32,
            spacing: grid.spacing(),
            particle_size: p.particle_size,
        };

        let mut force_array = vec![0.0; FORCE_COMPONENTS * grid.node_count()];
        for (idx, f) in grid.forces().iter().enumerate() {
            force_array[idx * FORCE_COMPONENTS + HEIGHT_COMPONENT] = *f;
        }

        let force_points = state
            .wells
            .wells()
            .iter()
            .map(|w| ForcePointDocument {
                position: [w.origin.x, 0.0, w.origin.y],
                gravity: w.gravity,
                gravity_range: w.gravity_range,
                force_direction: w.direction.as_i8(),
            })
            .collect();

        Self {
            params,
            force_array,
            force_points,
        }
    }

    /// Validate the document and build the state it describes.
    /// The stored force buffer is adopted as-is; callers re-bake.
    pub fn into_state(self) -> Result<SimulationState> {
        let p = self.params;

        for (name, value) in [
            ("a", p.a),
            ("b", p.b),
            ("gravity", p.gravity),
            ("gravityRange", p.gravity_range),
            ("forceScale", p.force_scale),
            ("particleSize", p.particle_size),
        ] {
            if !value.is_finite() {
                return Err(SimError::malformed(format!("params.{name} is {value}")));
            }
        }
        if !(p.tension.is_finite() && p.tension > 0.0) {
            return Err(SimError::malformed(format!("params.tension is {}", p.tension)));
        }

        // Size everything against the stored buffer before allocating a grid
        let (rows, cols) = (p.rows as usize, p.cols as usize);
        let expected = checked_node_count(rows, cols)
            .map(|nodes| nodes * FORCE_COMPONENTS)
            .ok_or_else(|| SimError::malformed(format!("params: invalid grid dimension {rows}x{cols}")))?;
        if self.force_array.len() != expected {
            return Err(SimError::malformed(format!(
                "forceArray holds {} values, expected {expected} for a {rows}x{cols} grid",
                self.force_array.len()
            )));
        }
        let mut grid = GridModel::new(rows, cols, p.spacing)
            .map_err(|e| SimError::malformed(format!("params: {e}")))?;
        let forces = self
            .force_array
            .chunks_exact(FORCE_COMPONENTS)
            .map(|node| node[HEIGHT_COMPONENT])
            .collect();
        grid.replace_forces(forces)?;

        let mut wells = ForceWellRegistry::new();
        for (i, fp) in self.force_points.into_iter().enumerate() {
            wells = wells.with(well_from_point(i, fp)?);
        }

        Ok(SimulationState {
            params: Parameters {
                shape: BaseShape {
                    a: p.a,
                    b: p.b,
                    tension: p.tension,
                },
                gravity: p.gravity,
                gravity_range: p.gravity_range,
                force_scale: p.force_scale,
                particle_size: p.particle_size,
            },
            grid,
            wells,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn well_from_point(i: usize, fp: ForcePointDocument) -> Result<ForceWell> {
    let direction = Direction::from_i8(fp.force_direction).ok_or_else(|| {
        SimError::malformed(format!(
            "forcePoints[{i}].forceDirection must be 1 or -1, got {}",
            fp.force_direction
        ))
    })?;
    if !fp.gravity.is_finite() {
        return Err(SimError::malformed(format!("forcePoints[{i}].gravity is {}", fp.gravity)));
    }
    if !(fp.gravity_range.is_finite() && fp.gravity_range > 0.0) {
        return Err(SimError::malformed(format!(
            "forcePoints[{i}].gravityRange is {}",
            fp.gravity_range
        )));
    }
    let [x, _, y] = fp.position;
    if !(x.is_finite() && y.is_finite()) {
        return Err(SimError::malformed(format!("forcePoints[{i}].position is not finite")));
    }

    Ok(ForceWell {
        origin: NVec2::new(x, y),
        gravity: fp.gravity,
        gravity_range: fp.gravity_range,
        direction,
    })
}
