//! High-level runtime engine settings
//!
//! Tunes wave attenuation, signal-driven wave triggering and the depth of
//! the undo history used when building and running a `Simulation`

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub decay_rate: f64, // wave attenuation per unit distance
    pub signal_window: usize, // frames kept for the rolling signal mean
    pub threshold_factor: f64, // trigger level relative to the rolling mean
    pub rise_delta: f64, // minimum jump over the previous frame's level
    pub signal_amplitude: f64, // wave amplitude for a full-scale (255) sample
    pub history_capacity: usize, // undo depth
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            decay_rate: 0.05,
            signal_window: 50,
            threshold_factor: 1.5,
            rise_delta: 10.0,
            signal_amplitude: 0.3,
            history_capacity: 500,
        }
    }
}
