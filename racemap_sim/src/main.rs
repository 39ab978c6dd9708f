//! RaceMap Simulator CLI
//!
//! Loads a DMS track payload, finalizes it and drives simulated vehicles
//! around it.

use clap::Parser;
use racemap_core::PipelineConfig;
use racemap_sim::{SimConfig, SimError, SimReport, Simulation};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// RaceMap track simulator
#[derive(Parser, Debug)]
#[command(name = "racemap-sim")]
#[command(about = "Run simulated vehicles around a RaceMap track", long_about = None)]
struct Args {
    /// Track payload file (DMS waypoints, one per line); reads stdin if omitted
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// JSON config file with optional `pipeline` and `sim` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulated vehicles
    #[arg(long)]
    vehicles: Option<usize>,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulation duration in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Vehicle tick rate in Hz
    #[arg(long)]
    tick_rate: Option<u32>,

    /// Step vehicles on one thread instead of running them in real time
    #[arg(long)]
    stepped: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    pipeline: PipelineConfig,
    sim: SimConfig,
}

impl Args {
    fn load_config(&self) -> Result<FileConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => FileConfig::default(),
        };

        let sim = &mut config.sim;
        if let Some(vehicles) = self.vehicles {
            sim.num_vehicles = vehicles;
        }
        if let Some(seed) = self.seed {
            sim.seed = seed;
        }
        if let Some(duration) = self.duration {
            sim.max_duration_secs = duration;
        }
        if let Some(tick_rate) = self.tick_rate {
            sim.tick_rate_hz = tick_rate;
        }
        if sim.seed == 0 {
            sim.seed = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42);
        }

        sim.validate()?;
        config.pipeline.validate()?;
        Ok(config)
    }

    fn read_payload(&self) -> Result<String, SimError> {
        Ok(match &self.track {
            Some(path) => std::fs::read_to_string(path)?,
            None => std::io::read_to_string(std::io::stdin())?,
        })
    }
}

fn run(args: &Args) -> Result<SimReport, SimError> {
    let config = args.load_config()?;
    let payload = args.read_payload()?;
    debug!(?config, "Loaded configuration");

    let sim_config = config.sim.clone();
    let (sim, payload_report) = Simulation::from_payload(&payload, &config.pipeline, config.sim)?;
    if !payload_report.rejected.is_empty() {
        warn!(
            accepted = payload_report.accepted,
            rejected = payload_report.rejected.len(),
            "Some waypoint lines were skipped"
        );
    }
    info!(
        waypoints = payload_report.accepted,
        length_m = sim.track().length_meters(),
        closed = sim.track().closed,
        "Track finalized"
    );

    if args.stepped {
        sim.run_stepped(sim_config.total_ticks())
    } else {
        sim.run_threaded(Duration::from_secs_f64(sim_config.max_duration_secs))
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("RaceMap Simulator v{}", env!("CARGO_PKG_VERSION"));
    }

    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            error!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    info!(
        "Ran {} vehicles (seed={}) for {:.1}s: {} ticks",
        report.vehicles.len(),
        report.seed,
        report.elapsed_secs,
        report.total_ticks
    );
    for vehicle in &report.vehicles {
        info!(
            "  {} at ({:.6}, {:.6}) speed={:.1} m/s course={:.0}°",
            vehicle.id, vehicle.position.lat, vehicle.position.lon, vehicle.speed, vehicle.course
        );
    }
}
