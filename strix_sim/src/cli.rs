// strix_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Strix: a headless, seeded EKF localization simulator.
///
/// Drives one or more planar robots along scripted controls, samples noisy
/// measurements, and reports how well each agent's filter tracked the truth.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/landmark_loop.toml")]
    pub scenario: PathBuf,

    /// Overrides `simulation.seed` from the scenario.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit newline-delimited JSON logs.
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,

    /// Print the resolved scenario as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}
