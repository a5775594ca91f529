pub mod states;
pub mod params;
pub mod engine;
pub mod grid;
pub mod forces;
pub mod waves;
pub mod surface;
pub mod history;
pub mod scenario;
