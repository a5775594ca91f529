//! Grid geometry, base saddle shape and the accumulated force buffer
//!
//! Nodes are indexed row-major: node `(i, j)` lives at `i * cols + j`.
//! Grid space is centred: column `cols/2` sits at `x = 0`, row `rows/2`
//! at `y = 0`, with real (not integer) halving.

use crate::error::{require_positive, Result, SimError};
use crate::simulation::params::BaseShape;
use crate::simulation::states::NVec2;

/// Hermite smoothstep on `[0, 1]`
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// `v / max`, or 0 on a degenerate (single row/column) axis
fn axis_ratio(v: f64, max: f64) -> f64 {
    if max > 0.0 {
        v / max
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridModel {
    rows: usize,
    cols: usize,
    spacing: f64,
    forces: Vec<f64>, // one accumulated force per node
}

impl GridModel {
    pub fn new(rows: usize, cols: usize, spacing: f64) -> Result<Self> {
        check_dimensions(rows, cols)?;
        let spacing = require_positive("spacing", spacing)?;
        Ok(Self {
            rows,
            cols,
            spacing,
            forces: vec![0.0; rows * cols],
        })
    }

    /// Reallocate for a new size. The force buffer comes back zero-filled;
    /// forces baked for the old size are gone.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        check_dimensions(rows, cols)?;
        self.rows = rows;
        self.cols = cols;
        self.forces = vec![0.0; rows * cols];
        Ok(())
    }

    /// Change node spacing. Node count is unchanged so forces are kept.
    pub fn set_spacing(&mut self, spacing: f64) -> Result<()> {
        self.spacing = require_positive("spacing", spacing)?;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    /// Grid-space coordinate of node `(i, j)`
    pub fn node_coord(&self, i: usize, j: usize) -> NVec2 {
        NVec2::new(
            (j as f64 - self.cols as f64 / 2.0) * self.spacing,
            (i as f64 - self.rows as f64 / 2.0) * self.spacing,
        )
    }

    /// Grid-space coordinate of the node at flat index `idx`
    pub fn node_coord_at(&self, idx: usize) -> NVec2 {
        self.node_coord(idx / self.cols, idx % self.cols)
    }

    /// Half extent along x, measured between outermost node centres
    pub fn max_x(&self) -> f64 {
        (self.cols as f64 - 1.0) * self.spacing / 2.0
    }

    /// Half extent along y
    pub fn max_y(&self) -> f64 {
        (self.rows as f64 - 1.0) * self.spacing / 2.0
    }

    /// Centre-to-corner distance
    pub fn max_distance(&self) -> f64 {
        self.max_x().hypot(self.max_y())
    }

    /// Wavelength of surface ripples, which is also their propagation speed.
    /// A 1x1 grid has no extent; fall back to the spacing there.
    pub fn wave_length(&self) -> f64 {
        let l = self.max_x().max(self.max_y());
        if l > 0.0 {
            l
        } else {
            self.spacing
        }
    }

    /// Full width of the grid along x
    pub fn width(&self) -> f64 {
        self.cols as f64 * self.spacing
    }

    /// Whether node `(i, j)` is in the quadrant where the saddle is mirrored
    pub fn is_mirrored(&self, i: usize, j: usize) -> bool {
        (i as f64) < self.rows as f64 / 2.0 && (j as f64) > self.cols as f64 / 2.0
    }

    /// Base height of node `(i, j)` for the given shape
    pub fn base_height(&self, i: usize, j: usize, shape: &BaseShape) -> f64 {
        let p = self.node_coord(i, j);
        self.surface_height(p.x, p.y, self.is_mirrored(i, j), shape)
    }

    /// Blended saddle height at grid-space `(x, y)`.
    ///
    /// The blend factor is zero along both axes, so the mirrored and plain
    /// saddles meet without a seam where the quadrants touch.
    pub fn surface_height(&self, x: f64, y: f64, mirrored: bool, shape: &BaseShape) -> f64 {
        let max_x = self.max_x();
        let rx = axis_ratio(x, max_x);
        let ry = axis_ratio(y, self.max_y());

        let blend = (smoothstep(rx.abs()) * smoothstep(ry.abs())).powf(shape.tension);
        let modifier = if mirrored { -1.0 } else { 1.0 };
        let saddle = (shape.a * rx * rx - shape.b * ry * ry) * max_x;

        (modifier * blend + (1.0 - blend)) * saddle
    }

    pub fn forces(&self) -> &[f64] {
        &self.forces
    }

    pub fn force_at(&self, i: usize, j: usize) -> f64 {
        self.forces[self.index(i, j)]
    }

    pub fn clear_forces(&mut self) {
        self.forces.iter_mut().for_each(|f| *f = 0.0);
    }

    /// Zero the force buffer and hand it to `fill` along with the geometry
    pub fn rebuild_forces<F>(&mut self, fill: F)
    where
        F: FnOnce(&GridModel, &mut [f64]),
    {
        let mut forces = std::mem::take(&mut self.forces);
        forces.iter_mut().for_each(|f| *f = 0.0);
        fill(self, &mut forces);
        self.forces = forces;
    }

    /// Adopt an externally supplied force buffer of exactly one value per node
    pub fn replace_forces(&mut self, forces: Vec<f64>) -> Result<()> {
        if forces.len() != self.node_count() {
            return Err(SimError::malformed(format!(
                "force buffer holds {} values, grid has {} nodes",
                forces.len(),
                self.node_count()
            )));
        }
        self.forces = forces;
        Ok(())
    }
}

/// Largest extent along either axis; documents store dimensions as `u32`
pub const MAX_AXIS: usize = u32::MAX as usize;

/// Number of nodes for a `rows x cols` grid, or `None` when either axis is
/// empty or too large, or the three-component document buffer would overflow
pub fn checked_node_count(rows: usize, cols: usize) -> Option<usize> {
    if rows == 0 || cols == 0 || rows > MAX_AXIS || cols > MAX_AXIS {
        return None;
    }
    let nodes = rows.checked_mul(cols)?;
    nodes.checked_mul(3)?;
    Some(nodes)
}

fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    match checked_node_count(rows, cols) {
        Some(_) => Ok(()),
        None => Err(SimError::InvalidDimension { rows, cols }),
    }
}
