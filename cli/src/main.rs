use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use barista_simulator_core_rs::comparison::{ComparisonHarness, ComparisonRequest};
use barista_simulator_core_rs::{EngineConfig, QueueMode, SimulationClock};
use clap::{Parser, Subcommand};
use serde_json::json;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "barista-sim",
    about = "Coffee counter scheduling simulator",
    long_about = "Drive the barista simulation engine from the command line:\n\
                  run a live-style simulation or compare SMART against FIFO."
)]
struct Cli {
    /// JSON engine config; flags below override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Advance a simulated counter minute by minute and print its metrics
    Run {
        /// Minutes to simulate
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        /// Number of baristas
        #[arg(long)]
        workers: Option<usize>,
        /// Queue mode (smart or fifo)
        #[arg(long)]
        mode: Option<QueueMode>,
        /// Poisson arrivals per minute; omit for the configured default
        #[arg(long)]
        rate: Option<f64>,
        /// RNG seed
        #[arg(long, env = "BARISTA_SIM_SEED")]
        seed: Option<u64>,
        /// Minutes at which to trigger a rush hour
        #[arg(long, value_delimiter = ',')]
        rush_at: Vec<u32>,
    },
    /// Replay one arrival schedule through SMART and FIFO
    Compare {
        /// Orders in the schedule
        #[arg(long, default_value_t = 100)]
        orders: usize,
        /// Minutes to simulate
        #[arg(long, default_value_t = 300)]
        minutes: u32,
        /// Poisson arrivals per minute
        #[arg(long, default_value_t = 1.4)]
        rate: f64,
        /// Number of baristas
        #[arg(long, default_value_t = 3)]
        workers: usize,
        /// RNG seed; omit for a fresh one
        #[arg(long, env = "BARISTA_SIM_SEED")]
        seed: Option<u64>,
        /// Include the per-order detail log
        #[arg(long)]
        details: bool,
    },
}

// ── Entry point ────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let base = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Run {
            minutes,
            workers,
            mode,
            rate,
            seed,
            rush_at,
        } => {
            let config = EngineConfig {
                worker_count: workers.unwrap_or(base.worker_count),
                barista_names: base.barista_names.clone().filter(|_| workers.is_none()),
                initial_mode: mode.unwrap_or(base.initial_mode),
                rng_seed: seed.unwrap_or(base.rng_seed),
                ..base
            };
            run(config, minutes, rate, &rush_at)?
        }
        Commands::Compare {
            orders,
            minutes,
            rate,
            workers,
            seed,
            details,
        } => {
            let request = ComparisonRequest {
                arrival_count: orders,
                duration_minutes: minutes,
                arrival_rate: rate,
                worker_count: workers,
                seed,
            };
            let mut report = ComparisonHarness::new(base)
                .run(&request)
                .context("comparison failed")?;
            if !details {
                report.smart.orders.clear();
                report.fifo.orders.clear();
            }
            serde_json::to_value(&report)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(config: EngineConfig, minutes: u32, rate: Option<f64>, rush_at: &[u32]) -> Result<serde_json::Value> {
    let mut clock = SimulationClock::new(config).context("invalid engine config")?;
    clock.toggle_auto_arrivals(true, rate)?;

    for minute in 0..minutes {
        if rush_at.contains(&minute) {
            clock.trigger_rush_hour();
        }
        clock.advance_one_minute()?;
    }
    clock.check_invariants()?;

    Ok(json!({
        "metrics": clock.metrics(),
        "analytics": clock.analytics(),
        "queue": clock.queue_snapshot(),
    }))
}

fn load_config(path: Option<&std::path::Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: EngineConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Install an env-filtered fmt subscriber on stderr unless one is already set
fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "barista-sim",
            "compare",
            "--orders",
            "50",
            "--seed",
            "7",
            "--details",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare {
                orders,
                seed,
                details,
                minutes,
                ..
            } => {
                assert_eq!(orders, 50);
                assert_eq!(seed, Some(7));
                assert!(details);
                assert_eq!(minutes, 300);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_mode_and_rush() {
        let cli = Cli::try_parse_from([
            "barista-sim",
            "run",
            "--mode",
            "fifo",
            "--rush-at",
            "5,20",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { mode, rush_at, .. } => {
                assert_eq!(mode, Some(QueueMode::Fifo));
                assert_eq!(rush_at, vec![5, 20]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_mode() {
        assert!(Cli::try_parse_from(["barista-sim", "run", "--mode", "lifo"]).is_err());
    }

    #[test]
    fn test_short_run_produces_metrics() {
        let value = run(EngineConfig::default(), 10, Some(1.0), &[2]).unwrap();
        assert!(value["metrics"]["total_created"].as_u64().unwrap() >= 5);
    }
}
