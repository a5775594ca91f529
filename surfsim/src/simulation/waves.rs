//! Transient ripples
//!
//! Each wave is a decaying sine front that leaves its origin at t = start
//! and travels outward at `wave_length` grid units per second. A node only
//! starts moving once the front has reached it.
//!
//! Waves come from explicit triggers or from an external amplitude signal:
//! a frame's samples are compared against an adaptive threshold built from
//! the rolling mean of recent frame levels, so loud and quiet inputs trigger
//! at comparable rates.

use std::collections::VecDeque;
use std::f64::consts::PI;

use tracing::{debug, trace};

use crate::simulation::engine::Engine;
use crate::simulation::grid::GridModel;
use crate::simulation::states::{NVec2, Wave};

#[derive(Debug, Clone)]
pub struct WaveEngine {
    waves: Vec<Wave>,
    levels: VecDeque<f64>, // recent per-frame mean sample values
    decay_rate: f64,
    signal_window: usize,
    threshold_factor: f64,
    rise_delta: f64,
    signal_amplitude: f64,
}

impl WaveEngine {
    pub fn new(engine: &Engine) -> Self {
        Self {
            waves: Vec::new(),
            levels: VecDeque::with_capacity(engine.signal_window + 1),
            decay_rate: engine.decay_rate,
            signal_window: engine.signal_window.max(1),
            threshold_factor: engine.threshold_factor,
            rise_delta: engine.rise_delta,
            signal_amplitude: engine.signal_amplitude,
        }
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Drop every live wave and forget the signal history
    pub fn clear(&mut self) {
        self.waves.clear();
        self.levels.clear();
    }

    /// Start a wave at `origin` at time `now`
    pub fn trigger(&mut self, origin: NVec2, amplitude: f64, now: f64) {
        trace!(x = origin.x, y = origin.y, amplitude, now, "wave triggered");
        self.waves.push(Wave {
            origin,
            start_time: now,
            amplitude,
        });
    }

    /// Feed one frame of amplitude samples (0..=255) and trigger a wave for
    /// every sample that stands out. Returns how many waves were started.
    ///
    /// A sample triggers when it exceeds `threshold_factor` times the rolling
    /// mean of frame levels and beats the previous frame's level by more than
    /// `rise_delta`. After a silent frame the threshold stands in for it.
    /// Sample index maps linearly onto x across the grid width,
    /// on the y = 0 line.
    pub fn trigger_from_signal(&mut self, samples: &[u8], grid: &GridModel, now: f64) -> usize {
        if samples.is_empty() {
            return 0;
        }

        let len = samples.len() as f64;
        let level = samples.iter().map(|&s| s as f64).sum::<f64>() / len;
        self.levels.push_back(level);
        if self.levels.len() > self.signal_window {
            self.levels.pop_front();
        }

        let mean = self.levels.iter().sum::<f64>() / self.levels.len() as f64;
        let threshold = mean * self.threshold_factor;
        // Without a usable predecessor (first frame, or a silent one) the
        // rise is measured from the threshold
        let previous = match self.levels.len().checked_sub(2).map(|i| self.levels[i]) {
            Some(level) if level != 0.0 => level,
            _ => threshold,
        };

        let width = grid.width();
        let mut triggered = 0;
        for (i, &sample) in samples.iter().enumerate() {
            let sample = sample as f64;
            if sample > threshold && sample - previous > self.rise_delta {
                let x = (i as f64 / len) * width - width / 2.0;
                let amplitude = (sample / 255.0) * self.signal_amplitude;
                self.trigger(NVec2::new(x, 0.0), amplitude, now);
                triggered += 1;
            }
        }

        if triggered > 0 {
            debug!(triggered, threshold, level, "signal peaks triggered waves");
        }
        triggered
    }

    /// Summed wave displacement at grid-space `node` at time `now`
    pub fn evaluate(&self, node: NVec2, grid: &GridModel, now: f64) -> f64 {
        let wave_length = grid.wave_length();
        self.waves
            .iter()
            .map(|wave| {
                let elapsed = now - wave.start_time;
                let distance = (node - wave.origin).norm();
                let normalized_time = elapsed - distance / wave_length;
                if normalized_time > 0.0 {
                    wave.amplitude * (normalized_time * PI).sin() * (-self.decay_rate * distance).exp()
                } else {
                    // Front has not arrived yet
                    0.0
                }
            })
            .sum()
    }

    /// True once the front has crossed the whole grid plus one wavelength.
    /// Deliberately coarse: some nodes may still be rippling slightly.
    pub fn is_expired(wave: &Wave, grid: &GridModel, now: f64) -> bool {
        let wave_length = grid.wave_length();
        let elapsed = now - wave.start_time;
        wave_length * elapsed > grid.max_distance() + wave_length
    }

    /// Remove expired waves. Returns how many were dropped.
    pub fn prune(&mut self, grid: &GridModel, now: f64) -> usize {
        let before = self.waves.len();
        self.waves.retain(|wave| !Self::is_expired(wave, grid, now));
        let removed = before - self.waves.len();
        if removed > 0 {
            trace!(removed, live = self.waves.len(), "pruned waves");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridModel {
        GridModel::new(21, 21, 1.0).unwrap()
    }

    #[test]
    fn front_arrives_at_distance_over_wave_length() {
        let grid = grid();
        let mut engine = WaveEngine::new(&Engine::default());
        engine.trigger(NVec2::new(0.0, 0.0), 0.3, 0.0);

        // wave_length is 10 on a 21x21 unit grid; a node 5 away is reached at t = 0.5
        let node = NVec2::new(5.0, 0.0);
        assert_eq!(engine.evaluate(node, &grid, 0.5), 0.0);
        assert_eq!(engine.evaluate(node, &grid, 0.49), 0.0);
        assert!(engine.evaluate(node, &grid, 0.6) > 0.0);
    }

    #[test]
    fn origin_is_still_at_trigger_time() {
        let grid = grid();
        let mut engine = WaveEngine::new(&Engine::default());
        engine.trigger(NVec2::new(0.0, 0.0), 0.3, 0.0);
        assert_eq!(engine.evaluate(NVec2::new(0.0, 0.0), &grid, 0.0), 0.0);

        let eps = 1e-3;
        let got = engine.evaluate(NVec2::new(0.0, 0.0), &grid, eps);
        let expected = 0.3 * (eps * PI).sin();
        assert!(got > 0.0);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn waves_superpose() {
        let grid = grid();
        let mut single = WaveEngine::new(&Engine::default());
        single.trigger(NVec2::new(2.0, 1.0), 0.2, 0.0);
        let mut double = single.clone();
        double.trigger(NVec2::new(2.0, 1.0), 0.2, 0.0);

        let node = NVec2::new(-1.0, 3.0);
        let one = single.evaluate(node, &grid, 0.7);
        assert!((double.evaluate(node, &grid, 0.7) - 2.0 * one).abs() < 1e-12);
    }

    #[test]
    fn prune_boundary() {
        let grid = grid();
        let mut engine = WaveEngine::new(&Engine::default());
        engine.trigger(NVec2::new(0.0, 0.0), 0.3, 0.0);

        let lifetime = (grid.max_distance() + grid.wave_length()) / grid.wave_length();
        assert_eq!(engine.prune(&grid, lifetime - 1e-9), 0);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.prune(&grid, lifetime + 1e-6), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn signal_peak_triggers_on_rise() {
        let grid = GridModel::new(10, 16, 1.0).unwrap();
        let mut engine = WaveEngine::new(&Engine::default());

        // A quiet frame establishes the baseline
        assert_eq!(engine.trigger_from_signal(&[10; 8], &grid, 0.0), 0);

        // One loud bin at index 4 of 8
        let mut frame = [10u8; 8];
        frame[4] = 200;
        assert_eq!(engine.trigger_from_signal(&frame, &grid, 0.1), 1);

        let wave = &engine.waves()[0];
        assert_eq!(wave.origin, NVec2::new(0.0, 0.0)); // 4/8 * 16 - 8
        assert!((wave.amplitude - 200.0 / 255.0 * 0.3).abs() < 1e-12);
        assert_eq!(wave.start_time, 0.1);
    }

    #[test]
    fn rise_after_silence_is_measured_from_threshold() {
        let grid = GridModel::new(10, 16, 1.0).unwrap();
        let mut engine = WaveEngine::new(&Engine::default());
        assert_eq!(engine.trigger_from_signal(&[0; 32], &grid, 0.0), 0);

        // Level 12, mean 6, threshold 9: clears the threshold but rises only 3 above it
        assert_eq!(engine.trigger_from_signal(&[12; 32], &grid, 0.1), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn steady_signal_does_not_trigger() {
        let grid = GridModel::new(10, 10, 1.0).unwrap();
        let mut engine = WaveEngine::new(&Engine::default());
        for frame in 0..20 {
            assert_eq!(engine.trigger_from_signal(&[120; 16], &grid, frame as f64), 0);
        }
        assert!(engine.is_empty());
    }

    #[test]
    fn empty_frame_is_ignored() {
        let grid = grid();
        let mut engine = WaveEngine::new(&Engine::default());
        assert_eq!(engine.trigger_from_signal(&[], &grid, 0.0), 0);
        assert!(engine.levels.is_empty());
    }

    #[test]
    fn signal_history_is_bounded() {
        let grid = grid();
        let mut engine = WaveEngine::new(&Engine::default());
        for frame in 0..120 {
            engine.trigger_from_signal(&[3; 4], &grid, frame as f64);
        }
        assert_eq!(engine.levels.len(), 50);
    }
}
