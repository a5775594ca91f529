//! Force contributors for the surface
//!
//! Defines the [`ForceField`] trait, its radial gravity-well implementation
//! and the registry that re-bakes the accumulated force buffer

use tracing::debug;

use crate::error::{require_finite, require_positive, Result, SimError};
use crate::simulation::grid::GridModel;
use crate::simulation::states::ForceWell;

/// Trait for sources that deform the surface through the force buffer
/// Implementations add their contribution into `out[idx]` for each node
pub trait ForceField {
    fn accumulate(&self, grid: &GridModel, force_scale: f64, out: &mut [f64]);
}

impl ForceField for ForceWell {
    /// Two passes over the nodes inside the well's radius: the first sums the
    /// gaussian weights, the second spreads `force_scale` across them in
    /// proportion, tapered linearly to zero at the rim. The total pushed into
    /// the buffer therefore tracks `force_scale`, not the node count in range.
    fn accumulate(&self, grid: &GridModel, force_scale: f64, out: &mut [f64]) {
        let range = self.gravity_range;
        let range2 = range * range;

        // (node index, weight, distance) for every node in range
        let mut in_range = Vec::new();
        let mut total_weight = 0.0;

        for i in 0..grid.rows() {
            for j in 0..grid.cols() {
                let d = grid.node_coord(i, j) - self.origin;
                let d2 = d.norm_squared();
                if d2 < range2 {
                    let weight = (-d2 / (2.0 * range2)).exp() * self.gravity;
                    total_weight += weight;
                    in_range.push((grid.index(i, j), weight, d2.sqrt()));
                }
            }
        }

        // Nothing in range, or zero gravity
        if total_weight == 0.0 {
            return;
        }

        let sign = self.direction.sign();
        for (idx, weight, distance) in in_range {
            let normalized = (weight / total_weight) * force_scale;
            out[idx] += sign * normalized * (1.0 - distance / range);
        }
    }
}

/// Ordered collection of persistent gravity wells.
/// Indices are stable: wells are only appended, edited in place, or replaced
/// wholesale when a snapshot or document is restored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceWellRegistry {
    wells: Vec<ForceWell>,
}

impl ForceWellRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { wells: Vec::new() }
    }

    /// Add a well without baking it
    pub fn with(mut self, well: ForceWell) -> Self {
        self.wells.push(well);
        self
    }

    pub fn wells(&self) -> &[ForceWell] {
        &self.wells
    }

    pub fn get(&self, index: usize) -> Option<&ForceWell> {
        self.wells.get(index)
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Append a well and re-bake. Returns the new well's index.
    pub fn add_well(&mut self, well: ForceWell, grid: &mut GridModel, force_scale: f64) -> usize {
        self.wells.push(well);
        self.rebake(grid, force_scale);
        self.wells.len() - 1
    }

    /// Change strength and radius of an existing well, then re-bake.
    /// Invalid values are rejected before anything changes.
    pub fn edit_well(
        &mut self,
        index: usize,
        gravity: f64,
        gravity_range: f64,
        grid: &mut GridModel,
        force_scale: f64,
    ) -> Result<()> {
        require_finite("gravity", gravity)?;
        require_positive("gravity_range", gravity_range)?;
        let len = self.wells.len();
        let well = self
            .wells
            .get_mut(index)
            .ok_or(SimError::IndexOutOfRange { index, len })?;
        well.gravity = gravity;
        well.gravity_range = gravity_range;
        self.rebake(grid, force_scale);
        Ok(())
    }

    /// Recompute the whole force buffer from zero.
    /// O(wells * nodes); meant for discrete edits, not per frame.
    pub fn rebake(&self, grid: &mut GridModel, force_scale: f64) {
        grid.rebuild_forces(|geometry, out| {
            for well in &self.wells {
                well.accumulate(geometry, force_scale, out);
            }
        });
        debug!(wells = self.wells.len(), force_scale, "rebaked force buffer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::{Direction, NVec2};

    fn well_at(x: f64, y: f64, range: f64, direction: Direction) -> ForceWell {
        ForceWell {
            origin: NVec2::new(x, y),
            gravity: 1.0,
            gravity_range: range,
            direction,
        }
    }

    #[test]
    fn total_force_tracks_force_scale_not_range() {
        // Far from the rim the taper is close to 1, so compare sums loosely
        let mut grid = GridModel::new(40, 40, 1.0).unwrap();
        let small = ForceWellRegistry::new().with(well_at(0.0, 0.0, 4.0, Direction::Up));
        let large = ForceWellRegistry::new().with(well_at(0.0, 0.0, 12.0, Direction::Up));

        small.rebake(&mut grid, 10.0);
        let small_sum: f64 = grid.forces().iter().sum();
        large.rebake(&mut grid, 10.0);
        let large_sum: f64 = grid.forces().iter().sum();

        // Both are a fixed fraction of force_scale set by the taper profile
        assert!(small_sum > 0.0 && small_sum < 10.0);
        assert!(large_sum > 0.0 && large_sum < 10.0);
        assert!((small_sum - large_sum).abs() < 1.5, "{small_sum} vs {large_sum}");
    }

    #[test]
    fn down_well_mirrors_up_well() {
        let mut up_grid = GridModel::new(10, 10, 1.0).unwrap();
        let mut down_grid = up_grid.clone();
        ForceWellRegistry::new()
            .with(well_at(0.0, 0.0, 3.0, Direction::Up))
            .rebake(&mut up_grid, 5.0);
        ForceWellRegistry::new()
            .with(well_at(0.0, 0.0, 3.0, Direction::Down))
            .rebake(&mut down_grid, 5.0);

        for (u, d) in up_grid.forces().iter().zip(down_grid.forces()) {
            assert_eq!(*u, -*d);
        }
    }

    #[test]
    fn well_outside_grid_contributes_nothing() {
        let mut grid = GridModel::new(6, 6, 1.0).unwrap();
        ForceWellRegistry::new()
            .with(well_at(500.0, 500.0, 2.0, Direction::Up))
            .rebake(&mut grid, 100.0);
        assert!(grid.forces().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn zero_gravity_is_guarded() {
        let mut grid = GridModel::new(6, 6, 1.0).unwrap();
        let mut well = well_at(0.0, 0.0, 3.0, Direction::Up);
        well.gravity = 0.0;
        ForceWellRegistry::new().with(well).rebake(&mut grid, 100.0);
        assert!(grid.forces().iter().all(|f| f.is_finite() && *f == 0.0));
    }

    #[test]
    fn edit_out_of_range_is_an_error() {
        let mut grid = GridModel::new(4, 4, 1.0).unwrap();
        let mut registry = ForceWellRegistry::new();
        registry.add_well(well_at(0.0, 0.0, 2.0, Direction::Up), &mut grid, 1.0);

        let err = registry.edit_well(3, 1.0, 1.0, &mut grid, 1.0).unwrap_err();
        assert_eq!(err, SimError::IndexOutOfRange { index: 3, len: 1 });
    }

    #[test]
    fn edit_rejects_bad_radius_and_strength() {
        let mut grid = GridModel::new(6, 6, 1.0).unwrap();
        let mut registry = ForceWellRegistry::new();
        registry.add_well(well_at(0.0, 0.0, 2.0, Direction::Up), &mut grid, 1.0);
        let forces = grid.forces().to_vec();

        let err = registry.edit_well(0, 1.0, -2.0, &mut grid, 1.0).unwrap_err();
        assert_eq!(err, SimError::InvalidParameter { name: "gravity_range", value: -2.0 });
        assert!(registry.edit_well(0, f64::NAN, 2.0, &mut grid, 1.0).is_err());

        assert_eq!(registry.get(0).unwrap().gravity_range, 2.0);
        assert_eq!(registry.get(0).unwrap().gravity, 1.0);
        assert_eq!(grid.forces(), forces.as_slice());
    }

    #[test]
    fn rebake_does_not_accumulate_across_calls() {
        let mut grid = GridModel::new(8, 8, 1.0).unwrap();
        let registry = ForceWellRegistry::new().with(well_at(1.0, -1.0, 3.0, Direction::Up));
        registry.rebake(&mut grid, 7.0);
        let first = grid.forces().to_vec();
        registry.rebake(&mut grid, 7.0);
        assert_eq!(first, grid.forces());
    }
}
