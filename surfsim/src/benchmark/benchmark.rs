use std::time::Instant;

use tracing::warn;

use crate::error::Result;
use crate::simulation::engine::Engine;
use crate::simulation::grid::GridModel;
use crate::simulation::params::Parameters;
use crate::simulation::scenario::Simulation;
use crate::simulation::states::{Direction, NVec2};

/// Deterministic well/wave positions spread over the grid, no rand needed
fn scatter(i: usize, grid: &GridModel) -> NVec2 {
    let i_f = i as f64;
    NVec2::new(
        (i_f * 0.37).sin() * grid.max_x() * 0.8,
        (i_f * 0.13).cos() * grid.max_y() * 0.8,
    )
}

/// Helper to build a simulation on an `n x n` grid
fn make_simulation(n: usize) -> Option<Simulation> {
    let grid = GridModel::new(n, n, 1.0).ok()?;
    let params = Parameters {
        gravity_range: n as f64 / 8.0,
        ..Parameters::default()
    };
    Some(Simulation::new(grid, params, Engine::default()))
}

/// Place `count` up-wells at scattered positions, starting from scatter index `first`
fn place_scattered(sim: &mut Simulation, first: usize, count: usize) -> Result<()> {
    for i in first..first + count {
        let origin = scatter(i, sim.grid());
        sim.place_well(origin, Direction::Up)?;
    }
    Ok(())
}

/// Time a full rebake for growing grids and well counts
pub fn bench_rebake() {
    println!("grid,wells,rebake_ms");

    for n in [50, 100, 200, 400] {
        for wells in [1, 8, 32] {
            let Some(mut sim) = make_simulation(n) else {
                continue;
            };

            // Place all but the last well untimed
            if let Err(e) = place_scattered(&mut sim, 0, wells - 1) {
                warn!(grid = n, wells, error = %e, "skipping benchmark case");
                continue;
            }

            // The last placement rebakes every well
            let t0 = Instant::now();
            let placed = place_scattered(&mut sim, wells - 1, 1);
            let ms = t0.elapsed().as_secs_f64() * 1000.0;
            if let Err(e) = placed {
                warn!(grid = n, wells, error = %e, "skipping benchmark case");
                continue;
            }

            println!("{},{},{:.3}", n, wells, ms);
        }
    }
}

/// Time per-frame evaluation for growing grids and live wave counts
pub fn bench_frame() {
    println!("grid,waves,frame_ms");

    let frames = 5;
    for n in [50, 100, 200, 400] {
        for waves in [0, 10, 50] {
            let Some(mut sim) = make_simulation(n) else {
                continue;
            };
            for i in 0..waves {
                let origin = scatter(i, sim.grid());
                sim.trigger_wave(origin, 0.2, 0.0);
            }

            // Warm up
            sim.evaluate(0.1, None);

            let t0 = Instant::now();
            for f in 0..frames {
                sim.evaluate(0.1 + f as f64 * 0.016, None);
            }
            let ms = t0.elapsed().as_secs_f64() * 1000.0 / frames as f64;

            println!("{},{},{:.3}", n, waves, ms);
        }
    }
}
