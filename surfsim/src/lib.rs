pub mod error;
pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use error::{Result, SimError};

pub use simulation::states::{NVec2, Direction, ForceWell, Wave, SimulationState};
pub use simulation::params::{BaseShape, Parameters};
pub use simulation::engine::Engine;
pub use simulation::grid::{GridModel, smoothstep};
pub use simulation::forces::{ForceField, ForceWellRegistry};
pub use simulation::waves::WaveEngine;
pub use simulation::surface::{SurfaceEvaluator, external_influence};
pub use simulation::history::HistoryManager;
pub use simulation::scenario::Simulation;

pub use configuration::config::{ScenarioConfig, SurfaceConfig, EngineConfig, WellConfig, WaveConfig, RunConfig, SignalConfig, DirectionConfig};
pub use configuration::document::{StateDocument, ParamsDocument, ForcePointDocument};

pub use benchmark::benchmark::{bench_rebake, bench_frame};
