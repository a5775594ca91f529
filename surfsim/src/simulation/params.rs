//! Shape and force parameters for the surface
//!
//! `Parameters` holds the runtime knobs that are not grid geometry:
//! - saddle shape coefficients and blend tension (`BaseShape`),
//! - strength and radius given to newly placed wells,
//! - force normalization scale used by every rebake,
//! - particle size, carried for the renderer and persisted with the state

/// Saddle surface coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseShape {
    pub a: f64, // curvature along x
    pub b: f64, // curvature along y
    pub tension: f64, // blend exponent, > 0
}

impl Default for BaseShape {
    fn default() -> Self {
        Self {
            a: 0.2,
            b: 0.3,
            tension: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub shape: BaseShape,
    pub gravity: f64, // default strength for placed wells
    pub gravity_range: f64, // default radius for placed wells
    pub force_scale: f64, // total influence of one well after normalization
    pub particle_size: f64, // render hint only
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            shape: BaseShape::default(),
            gravity: 0.6,
            gravity_range: 50.0,
            force_scale: 8000.0,
            particle_size: 0.5,
        }
    }
}
