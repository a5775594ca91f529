use surfsim::{RunConfig, ScenarioConfig, Simulation, StateDocument};
use surfsim::{bench_frame, bench_rebake};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under `scenarios/`
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Saved state document to restore before running
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where to write the final state; overrides `run.output`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run the timing benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

/// Stand-in for a render loop: drive `frames` frames at a fixed step,
/// feeding the synthetic signal no faster than `min_frame_interval`
fn run_headless(sim: &mut Simulation, run: &RunConfig) {
    let mut last_signal = f64::NEG_INFINITY;
    let mut peak = 0.0_f64;

    for frame in 0..run.frames {
        let now = frame as f64 * run.frame_dt;

        let samples = run.signal.as_ref().map(|s| s.frame(frame));
        let signal = match &samples {
            Some(s) if now - last_signal >= run.min_frame_interval => {
                last_signal = now;
                Some(s.as_slice())
            }
            _ => None,
        };

        let positions = sim.frame(now, signal);
        let frame_peak = positions
            .chunks_exact(3)
            .map(|p| p[1].abs())
            .fold(0.0_f64, f64::max);
        peak = peak.max(frame_peak);
    }

    info!(
        frames = run.frames,
        live_waves = sim.waves().len(),
        peak_height = peak,
        "run finished"
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.bench {
        bench_rebake();
        bench_frame();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let run = scenario_cfg.run.clone();
    let mut sim = Simulation::build_scenario(scenario_cfg)?;

    if let Some(path) = &args.load {
        let doc = StateDocument::read_from(path)
            .with_context(|| format!("failed to read state {}", path.display()))?;
        sim.deserialize(doc)?;
    }

    run_headless(&mut sim, &run);

    if let Some(path) = args.output.or_else(|| run.output.as_ref().map(PathBuf::from)) {
        sim.serialize()
            .write_to(&path)
            .with_context(|| format!("failed to write state {}", path.display()))?;
        info!(path = %path.display(), "state saved");
    }

    Ok(())
}
