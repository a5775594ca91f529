//! The simulation controller
//!
//! `Simulation` owns every piece of mutable state:
//! - `SimulationState` (parameters, grid + force buffer, well registry)
//! - the `WaveEngine` with its live waves and signal history
//! - the `SurfaceEvaluator` output buffers
//! - the undo/redo `HistoryManager`
//!
//! All mutation goes through `&mut self`, so edits can never interleave with
//! an evaluation. Every edit that changes snapshot-able state records a
//! history entry after it succeeds; failed edits leave state and history
//! untouched.
//!
//! The controller is a Bevy `Resource`, so an external render loop can
//! insert it into its world and read `positions()` each frame.

use bevy_ecs::prelude::Resource;
use tracing::{debug, info, warn};

use crate::configuration::config::ScenarioConfig;
use crate::configuration::document::StateDocument;
use crate::error::{require_finite, require_positive, Result};
use crate::simulation::engine::Engine;
use crate::simulation::forces::ForceWellRegistry;
use crate::simulation::grid::GridModel;
use crate::simulation::history::HistoryManager;
use crate::simulation::params::{BaseShape, Parameters};
use crate::simulation::states::{Direction, ForceWell, NVec2, SimulationState};
use crate::simulation::surface::SurfaceEvaluator;
use crate::simulation::waves::WaveEngine;

#[derive(Resource, Debug)]
pub struct Simulation {
    engine: Engine,
    state: SimulationState,
    waves: WaveEngine,
    evaluator: SurfaceEvaluator,
    history: HistoryManager,
}

impl Simulation {
    /// Fresh simulation with no wells; the initial state is the first
    /// history entry
    pub fn new(grid: GridModel, params: Parameters, engine: Engine) -> Self {
        let state = SimulationState {
            params,
            grid,
            wells: ForceWellRegistry::new(),
        };
        let mut history = HistoryManager::new(engine.history_capacity);
        history.snapshot(&state);

        Self {
            waves: WaveEngine::new(&engine),
            evaluator: SurfaceEvaluator::new(),
            engine,
            state,
            history,
        }
    }

    /// Build a ready-to-run simulation from a loaded scenario
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        // Parameters (runtime) from SurfaceConfig
        let s_cfg = cfg.surface;
        let shape = BaseShape {
            a: require_finite("a", s_cfg.a)?,
            b: require_finite("b", s_cfg.b)?,
            tension: require_positive("tension", s_cfg.tension)?,
        };
        let params = Parameters {
            shape,
            gravity: require_finite("gravity", s_cfg.gravity)?,
            gravity_range: require_positive("gravity_range", s_cfg.gravity_range)?,
            force_scale: require_positive("force_scale", s_cfg.force_scale)?,
            particle_size: require_positive("particle_size", s_cfg.particle_size)?,
        };
        let grid = GridModel::new(s_cfg.rows, s_cfg.cols, s_cfg.spacing)?;

        // Engine (runtime) from EngineConfig
        let defaults = Engine::default();
        let e_cfg = cfg.engine;
        let engine = Engine {
            decay_rate: e_cfg.decay_rate.unwrap_or(defaults.decay_rate),
            signal_window: e_cfg.signal_window.unwrap_or(defaults.signal_window),
            threshold_factor: e_cfg.threshold_factor.unwrap_or(defaults.threshold_factor),
            rise_delta: e_cfg.rise_delta.unwrap_or(defaults.rise_delta),
            signal_amplitude: e_cfg.signal_amplitude.unwrap_or(defaults.signal_amplitude),
            history_capacity: e_cfg.history_capacity.unwrap_or(defaults.history_capacity),
        };

        // Wells: bake them all at once so the scenario starts as one history entry
        let mut wells = ForceWellRegistry::new();
        for w in &cfg.wells {
            wells = wells.with(checked_well(
                NVec2::new(w.x, w.y),
                w.gravity.unwrap_or(params.gravity),
                w.gravity_range.unwrap_or(params.gravity_range),
                w.direction.into(),
            )?);
        }

        let mut sim = Self::new(grid, params, engine);
        sim.state.wells = wells;
        sim.state.rebake();
        sim.history.clear();
        sim.history.snapshot(&sim.state);

        for w in &cfg.waves {
            sim.trigger_wave(NVec2::new(w.x, w.y), w.amplitude, w.at);
        }

        info!(
            rows = sim.grid().rows(),
            cols = sim.grid().cols(),
            wells = sim.wells().len(),
            waves = sim.waves().len(),
            "scenario built"
        );
        Ok(sim)
    }

    // accessors ==============================================================================

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn params(&self) -> &Parameters {
        &self.state.params
    }

    pub fn grid(&self) -> &GridModel {
        &self.state.grid
    }

    pub fn wells(&self) -> &ForceWellRegistry {
        &self.state.wells
    }

    pub fn waves(&self) -> &WaveEngine {
        &self.waves
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Position buffer (`x, z, y` per node) from the last evaluation
    pub fn positions(&self) -> &[f64] {
        self.evaluator.positions()
    }

    /// Height buffer from the last evaluation
    pub fn heights(&self) -> &[f64] {
        self.evaluator.heights()
    }

    // wells ==================================================================================

    /// Register a well and re-bake. Returns its index.
    pub fn add_well(
        &mut self,
        origin: NVec2,
        gravity: f64,
        gravity_range: f64,
        direction: Direction,
    ) -> Result<usize> {
        let well = checked_well(origin, gravity, gravity_range, direction)?;
        let force_scale = self.state.params.force_scale;
        let index = self.state.wells.add_well(well, &mut self.state.grid, force_scale);
        self.history.snapshot(&self.state);
        debug!(index, x = origin.x, y = origin.y, gravity, gravity_range, "well added");
        Ok(index)
    }

    /// Register a well using the current default strength and radius
    pub fn place_well(&mut self, origin: NVec2, direction: Direction) -> Result<usize> {
        let (gravity, range) = (self.state.params.gravity, self.state.params.gravity_range);
        self.add_well(origin, gravity, range, direction)
    }

    /// Change strength and radius of well `index` and re-bake
    pub fn edit_well(&mut self, index: usize, gravity: f64, gravity_range: f64) -> Result<()> {
        let force_scale = self.state.params.force_scale;
        self.state
            .wells
            .edit_well(index, gravity, gravity_range, &mut self.state.grid, force_scale)?;
        self.history.snapshot(&self.state);
        debug!(index, gravity, gravity_range, "well edited");
        Ok(())
    }

    // parameters =============================================================================

    /// Reallocate the grid. The surface comes back flat and the well
    /// registry is emptied with it; wells must be placed again. Undo
    /// restores the old grid together with its wells.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        self.state.grid.resize(rows, cols)?;
        let dropped = self.state.wells.len();
        self.state.wells = ForceWellRegistry::new();
        self.history.snapshot(&self.state);
        info!(rows, cols, dropped_wells = dropped, "grid resized");
        Ok(())
    }

    /// Change node spacing and re-bake, since wells sit at grid-space positions
    pub fn set_spacing(&mut self, spacing: f64) -> Result<()> {
        self.state.grid.set_spacing(spacing)?;
        self.state.rebake();
        self.history.snapshot(&self.state);
        Ok(())
    }

    pub fn set_shape(&mut self, shape: BaseShape) -> Result<()> {
        require_finite("a", shape.a)?;
        require_finite("b", shape.b)?;
        require_positive("tension", shape.tension)?;
        self.state.params.shape = shape;
        self.history.snapshot(&self.state);
        Ok(())
    }

    /// Strength and radius given to wells placed with [`Simulation::place_well`]
    pub fn set_well_defaults(&mut self, gravity: f64, gravity_range: f64) -> Result<()> {
        self.state.params.gravity = require_finite("gravity", gravity)?;
        self.state.params.gravity_range = require_positive("gravity_range", gravity_range)?;
        self.history.snapshot(&self.state);
        Ok(())
    }

    pub fn set_force_scale(&mut self, force_scale: f64) -> Result<()> {
        self.state.params.force_scale = require_positive("force_scale", force_scale)?;
        self.state.rebake();
        self.history.snapshot(&self.state);
        Ok(())
    }

    pub fn set_particle_size(&mut self, particle_size: f64) -> Result<()> {
        self.state.params.particle_size = require_positive("particle_size", particle_size)?;
        self.history.snapshot(&self.state);
        Ok(())
    }

    // waves ==================================================================================

    pub fn trigger_wave(&mut self, origin: NVec2, amplitude: f64, now: f64) {
        self.waves.trigger(origin, amplitude, now);
    }

    /// Feed one frame of amplitude samples; returns how many waves started
    pub fn trigger_from_signal(&mut self, samples: &[u8], now: f64) -> usize {
        self.waves.trigger_from_signal(samples, &self.state.grid, now)
    }

    pub fn prune_waves(&mut self, now: f64) -> usize {
        self.waves.prune(&self.state.grid, now)
    }

    // evaluation =============================================================================

    /// Evaluate the surface at `now` without touching simulation state
    pub fn evaluate(&mut self, now: f64, signal: Option<&[u8]>) -> &[f64] {
        self.evaluator.tick(&self.state, &self.waves, now, signal)
    }

    /// One render frame: ingest the signal, drop expired waves, evaluate
    pub fn frame(&mut self, now: f64, signal: Option<&[u8]>) -> &[f64] {
        if let Some(samples) = signal {
            self.trigger_from_signal(samples, now);
        }
        self.prune_waves(now);
        self.evaluate(now, signal)
    }

    // history ================================================================================

    /// Record the current state as a history entry
    pub fn snapshot(&mut self) {
        self.history.snapshot(&self.state);
    }

    /// Restore the previous history entry. At the oldest entry this is a
    /// no-op returning `NoHistory`.
    pub fn undo(&mut self) -> Result<()> {
        self.state = self.history.undo()?.clone();
        debug!(cursor = self.history.cursor(), "undo");
        Ok(())
    }

    /// Restore the next history entry. At the newest entry this is a
    /// no-op returning `NoHistory`.
    pub fn redo(&mut self) -> Result<()> {
        self.state = self.history.redo()?.clone();
        debug!(cursor = self.history.cursor(), "redo");
        Ok(())
    }

    // persistence ============================================================================

    pub fn serialize(&self) -> StateDocument {
        StateDocument::from_state(&self.state)
    }

    pub fn to_json(&self) -> Result<String> {
        self.serialize().to_json()
    }

    /// Replace the simulation state with a loaded document and re-bake its
    /// wells. History restarts from the loaded state. On error nothing changes.
    pub fn deserialize(&mut self, doc: StateDocument) -> Result<()> {
        let mut state = doc.into_state().inspect_err(|e| warn!(error = %e, "rejected document"))?;
        state.rebake();
        self.state = state;
        self.history.clear();
        self.history.snapshot(&self.state);
        info!(
            rows = self.grid().rows(),
            cols = self.grid().cols(),
            wells = self.wells().len(),
            "state loaded"
        );
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<()> {
        let doc = StateDocument::from_json(text).inspect_err(|e| warn!(error = %e, "unreadable document"))?;
        self.deserialize(doc)
    }
}

fn checked_well(origin: NVec2, gravity: f64, gravity_range: f64, direction: Direction) -> Result<ForceWell> {
    require_finite("origin.x", origin.x)?;
    require_finite("origin.y", origin.y)?;
    Ok(ForceWell {
        origin,
        gravity: require_finite("gravity", gravity)?,
        gravity_range: require_positive("gravity_range", gravity_range)?,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn small() -> Simulation {
        Simulation::new(
            GridModel::new(8, 8, 1.0).unwrap(),
            Parameters {
                gravity_range: 3.0,
                force_scale: 10.0,
                ..Parameters::default()
            },
            Engine::default(),
        )
    }

    #[test]
    fn starts_with_one_history_entry() {
        let mut sim = small();
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.undo().unwrap_err(), SimError::NoHistory);
        assert_eq!(sim.redo().unwrap_err(), SimError::NoHistory);
    }

    #[test]
    fn place_well_uses_defaults() {
        let mut sim = small();
        let idx = sim.place_well(NVec2::new(0.0, 0.0), Direction::Down).unwrap();
        let well = sim.wells().get(idx).unwrap();
        assert_eq!(well.gravity, 0.6);
        assert_eq!(well.gravity_range, 3.0);
        assert!(sim.grid().force_at(4, 4) < 0.0);
    }

    #[test]
    fn rejected_edits_leave_history_alone() {
        let mut sim = small();
        assert!(sim.add_well(NVec2::new(0.0, 0.0), 1.0, 0.0, Direction::Up).is_err());
        assert!(sim.edit_well(0, 1.0, 1.0).is_err());
        assert!(sim.resize(0, 3).is_err());
        assert!(sim.set_force_scale(f64::INFINITY).is_err());
        assert_eq!(sim.history().len(), 1);
        assert!(sim.wells().is_empty());
    }

    #[test]
    fn resize_flattens_and_drops_wells() {
        let mut sim = small();
        sim.add_well(NVec2::new(0.0, 0.0), 1.0, 2.0, Direction::Up).unwrap();
        sim.resize(6, 10).unwrap();
        assert!(sim.wells().is_empty());
        assert_eq!(sim.grid().forces().len(), 60);
        assert!(sim.grid().forces().iter().all(|&f| f == 0.0));

        // Undo brings back the old geometry and forces together
        sim.undo().unwrap();
        assert_eq!(sim.grid().rows(), 8);
        assert_eq!(sim.wells().len(), 1);
        assert!(sim.grid().force_at(4, 4) > 0.0);
    }

    #[test]
    fn frame_prunes_expired_waves() {
        let mut sim = small();
        sim.trigger_wave(NVec2::new(0.0, 0.0), 0.3, 0.0);
        sim.frame(0.1, None);
        assert_eq!(sim.waves().len(), 1);
        sim.frame(1.0e6, None);
        assert!(sim.waves().is_empty());
    }

    #[test]
    fn set_force_scale_rebakes() {
        let mut sim = small();
        sim.add_well(NVec2::new(0.0, 0.0), 1.0, 3.0, Direction::Up).unwrap();
        let before = sim.grid().force_at(4, 4);
        sim.set_force_scale(20.0).unwrap();
        assert!((sim.grid().force_at(4, 4) - 2.0 * before).abs() < 1e-12);
    }
}
