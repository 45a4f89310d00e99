// strix_sim/src/main.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::error;

use strix_sim::prelude::*;
use strix_sim::telemetry::init_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli.log_level, cli.json_logs) {
        eprintln!("[strix] {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> SimResult<()> {
    let mut scenario = load_scenario(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.simulation.seed = Some(seed);
    }

    if cli.print_config {
        print!("{}", scenario.to_toml()?);
        return Ok(());
    }

    let mut rng = SimulationRng::new(scenario.simulation.seed);
    let reports = run_scenario(&scenario, &mut rng)?;
    print!("{}", render_table(&reports));
    Ok(())
}
