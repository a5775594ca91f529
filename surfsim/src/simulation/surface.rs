//! Per-frame surface evaluation
//!
//! Combines the four height sources for every node:
//!
//! ```text
//! z = base saddle + baked well force + live waves + external signal
//! ```
//!
//! and writes both a scalar height buffer and the renderer-facing position
//! buffer (`x, z, y` per node). Evaluation only reads simulation state, so
//! for a fixed state, `now` and signal the output is identical on every call.

use crate::simulation::grid::GridModel;
use crate::simulation::states::SimulationState;
use crate::simulation::waves::WaveEngine;

/// Map a down-sampled signal sample onto `[-1, 1]` for node `idx`.
///
/// Samples are spread over the grid in runs of `len / min(rows, cols)`
/// consecutive nodes, wrapping around the signal.
pub fn external_influence(signal: &[u8], idx: usize, grid: &GridModel) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let step = (signal.len() / grid.rows().min(grid.cols())).max(1);
    let sample = signal[(idx / step) % signal.len()];
    sample as f64 / 255.0 * 2.0 - 1.0
}

/// Owns the output buffers so a render loop can call `tick` every frame
/// without reallocating.
#[derive(Debug, Clone, Default)]
pub struct SurfaceEvaluator {
    positions: Vec<f64>, // x, z, y per node
    heights: Vec<f64>, // z per node
}

impl SurfaceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every node at time `now` and return the position buffer
    pub fn tick(
        &mut self,
        state: &SimulationState,
        waves: &WaveEngine,
        now: f64,
        signal: Option<&[u8]>,
    ) -> &[f64] {
        let grid = &state.grid;
        let shape = &state.params.shape;
        let forces = grid.forces();
        let signal = signal.unwrap_or(&[]);

        let n = grid.node_count();
        self.positions.resize(3 * n, 0.0);
        self.heights.resize(n, 0.0);

        for i in 0..grid.rows() {
            for j in 0..grid.cols() {
                let idx = grid.index(i, j);
                let p = grid.node_coord(i, j);

                let z = grid.base_height(i, j, shape)
                    + forces[idx]
                    + waves.evaluate(p, grid, now)
                    + external_influence(signal, idx, grid);

                self.heights[idx] = z;
                self.positions[3 * idx] = p.x;
                self.positions[3 * idx + 1] = z;
                self.positions[3 * idx + 2] = p.y;
            }
        }

        &self.positions
    }

    /// Position buffer from the last `tick`
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Height buffer from the last `tick`
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::engine::Engine;
    use crate::simulation::forces::ForceWellRegistry;
    use crate::simulation::params::{BaseShape, Parameters};

    fn flat_state(rows: usize, cols: usize) -> SimulationState {
        SimulationState {
            params: Parameters {
                shape: BaseShape {
                    a: 0.0,
                    b: 0.0,
                    tension: 1.0,
                },
                ..Parameters::default()
            },
            grid: GridModel::new(rows, cols, 1.0).unwrap(),
            wells: ForceWellRegistry::new(),
        }
    }

    #[test]
    fn influence_spans_minus_one_to_one() {
        let grid = GridModel::new(4, 4, 1.0).unwrap();
        assert_eq!(external_influence(&[0], 0, &grid), -1.0);
        assert_eq!(external_influence(&[255], 5, &grid), 1.0);
        assert_eq!(external_influence(&[], 5, &grid), 0.0);
    }

    #[test]
    fn influence_downsamples_in_runs() {
        // 8 samples over min(4, 4) = 4 -> runs of 2 nodes per sample
        let grid = GridModel::new(4, 4, 1.0).unwrap();
        let signal = [0, 255, 0, 255, 0, 255, 0, 255];
        assert_eq!(external_influence(&signal, 0, &grid), -1.0);
        assert_eq!(external_influence(&signal, 1, &grid), -1.0);
        assert_eq!(external_influence(&signal, 2, &grid), 1.0);
        // node 16 would be sample 8, wrapping to 0
        assert_eq!(external_influence(&signal, 16, &grid), -1.0);
    }

    #[test]
    fn layout_is_x_z_y() {
        let state = flat_state(2, 3);
        let waves = WaveEngine::new(&Engine::default());
        let mut eval = SurfaceEvaluator::new();
        let out = eval.tick(&state, &waves, 0.0, None).to_vec();

        assert_eq!(out.len(), 18);
        let p = state.grid.node_coord(1, 2);
        let idx = state.grid.index(1, 2);
        assert_eq!(&out[3 * idx..3 * idx + 3], &[p.x, 0.0, p.y]);
        assert_eq!(eval.heights().len(), 6);
    }

    #[test]
    fn tick_is_idempotent() {
        let mut state = flat_state(6, 6);
        state.params.shape = BaseShape::default();
        let mut waves = WaveEngine::new(&Engine::default());
        waves.trigger(crate::simulation::states::NVec2::new(1.0, 1.0), 0.3, 0.0);
        let mut eval = SurfaceEvaluator::new();

        let first = eval.tick(&state, &waves, 0.4, Some(&[10, 200, 30])).to_vec();
        let second = eval.tick(&state, &waves, 0.4, Some(&[10, 200, 30])).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn buffers_follow_grid_size() {
        let mut state = flat_state(4, 4);
        let waves = WaveEngine::new(&Engine::default());
        let mut eval = SurfaceEvaluator::new();
        eval.tick(&state, &waves, 0.0, None);
        assert_eq!(eval.positions().len(), 48);

        state.grid.resize(2, 2).unwrap();
        eval.tick(&state, &waves, 0.0, None);
        assert_eq!(eval.positions().len(), 12);
    }
}
