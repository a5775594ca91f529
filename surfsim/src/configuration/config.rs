//! Configuration types for loading surface scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`SurfaceConfig`] – shape, well defaults, force scale and grid geometry
//! - [`EngineConfig`]  – wave and signal tuning, undo depth
//! - [`WellConfig`]    – wells placed before the first frame
//! - [`WaveConfig`]    – scripted wave triggers
//! - [`RunConfig`]     – how the headless driver runs the scenario
//! - [`ScenarioConfig`] – top-level wrapper used to load a scenario from YAML
//!
//! Every section may be omitted; missing values fall back to defaults.
//!
//! # YAML format
//!
//! ```yaml
//! surface:
//!   a: 0.2                  # saddle curvature along x
//!   b: 0.3                  # saddle curvature along y
//!   tension: 1.5            # blend exponent
//!   gravity: 0.6            # default well strength
//!   gravity_range: 20.0     # default well radius
//!   force_scale: 800.0      # total influence per well
//!   rows: 100
//!   cols: 100
//!   spacing: 1.0
//!   particle_size: 0.5
//!
//! engine:
//!   decay_rate: 0.05
//!   signal_window: 50
//!
//! wells:
//!   - x: 0.0
//!     y: 0.0
//!     direction: "up"       # or "down"
//!     gravity_range: 10.0   # optional, defaults to surface.gravity_range
//!
//! waves:
//!   - x: 10.0
//!     y: -5.0
//!     amplitude: 0.2
//!     at: 0.5               # start time in seconds
//!
//! run:
//!   frames: 600
//!   frame_dt: 0.016
//!   min_frame_interval: 0.010
//!   output: "surface.json"
//!   signal:
//!     bins: 64
//!     base: 40
//!     peak: 220
//!     period: 30
//! ```

use serde::Deserialize;

use crate::simulation::states::Direction;

/// Which way a configured well pushes
/// `direction: "up"` or `direction: "down"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionConfig {
    #[serde(rename = "up")]
    Up,

    #[serde(rename = "down")]
    Down,
}

impl From<DirectionConfig> for Direction {
    fn from(d: DirectionConfig) -> Self {
        match d {
            DirectionConfig::Up => Direction::Up,
            DirectionConfig::Down => Direction::Down,
        }
    }
}

/// Surface shape, force and grid parameters
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SurfaceConfig {
    pub a: f64,
    pub b: f64,
    pub tension: f64,
    pub gravity: f64, // default strength for wells without one
    pub gravity_range: f64, // default radius for wells without one
    pub force_scale: f64,
    pub rows: usize,
    pub cols: usize,
    pub spacing: f64,
    pub particle_size: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            a: 0.2,
            b: 0.3,
            tension: 1.5,
            gravity: 0.6,
            gravity_range: 50.0,
            force_scale: 8000.0,
            rows: 200,
            cols: 200,
            spacing: 1.0,
            particle_size: 0.5,
        }
    }
}

/// Wave and history tuning; anything left out keeps the engine default
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub decay_rate: Option<f64>,
    pub signal_window: Option<usize>,
    pub threshold_factor: Option<f64>,
    pub rise_delta: Option<f64>,
    pub signal_amplitude: Option<f64>,
    pub history_capacity: Option<usize>,
}

/// A well placed when the scenario is built
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WellConfig {
    pub x: f64,
    pub y: f64,
    pub direction: DirectionConfig,
    pub gravity: Option<f64>,
    pub gravity_range: Option<f64>,
}

/// A wave that starts at time `at`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WaveConfig {
    pub x: f64,
    pub y: f64,
    pub amplitude: f64,
    #[serde(default)]
    pub at: f64,
}

/// Synthetic amplitude spectrum for headless runs: a flat `base` level with
/// a single `peak` bin every `period` frames, sweeping across the bins
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub bins: usize,
    pub base: u8,
    pub peak: u8,
    pub period: usize,
}

impl SignalConfig {
    /// Amplitude samples for frame number `frame`
    pub fn frame(&self, frame: usize) -> Vec<u8> {
        let mut samples = vec![self.base; self.bins];
        if self.bins > 0 && self.period > 0 && frame % self.period == 0 {
            samples[(frame / self.period) % self.bins] = self.peak;
        }
        samples
    }
}

/// Headless driver settings
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub frames: usize,
    pub frame_dt: f64, // seconds between frames
    pub min_frame_interval: f64, // signal frames closer than this are skipped
    pub output: Option<String>, // JSON document written after the run
    pub signal: Option<SignalConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            frame_dt: 1.0 / 60.0,
            min_frame_interval: 0.010,
            output: None,
            signal: None,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub surface: SurfaceConfig,
    pub engine: EngineConfig,
    pub wells: Vec<WellConfig>,
    pub waves: Vec<WaveConfig>,
    pub run: RunConfig,
}

impl ScenarioConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg = ScenarioConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, ScenarioConfig::default());
        assert_eq!(cfg.surface.rows, 200);
        assert_eq!(cfg.run.frames, 120);
    }

    #[test]
    fn partial_sections_fill_in() {
        let yaml = r#"
surface:
  rows: 8
  cols: 12
engine:
  decay_rate: 0.1
wells:
  - x: 1.0
    y: -2.0
    direction: "down"
    gravity_range: 3.0
waves:
  - x: 0.0
    y: 0.0
    amplitude: 0.2
"#;
        let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.surface.rows, 8);
        assert_eq!(cfg.surface.tension, 1.5);
        assert_eq!(cfg.engine.decay_rate, Some(0.1));
        assert_eq!(cfg.engine.signal_window, None);
        assert_eq!(cfg.wells[0].direction, DirectionConfig::Down);
        assert_eq!(cfg.wells[0].gravity, None);
        assert_eq!(cfg.waves[0].at, 0.0);
    }

    #[test]
    fn synthetic_signal_sweeps_peaks() {
        let signal = SignalConfig {
            bins: 4,
            base: 10,
            peak: 200,
            period: 3,
        };
        assert_eq!(signal.frame(0), vec![200, 10, 10, 10]);
        assert_eq!(signal.frame(1), vec![10; 4]);
        assert_eq!(signal.frame(3), vec![10, 200, 10, 10]);
        assert_eq!(signal.frame(12), vec![200, 10, 10, 10]);
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let yaml = "wells:\n  - { x: 0.0, y: 0.0, direction: sideways }\n";
        assert!(ScenarioConfig::from_yaml_str(yaml).is_err());
    }
}
