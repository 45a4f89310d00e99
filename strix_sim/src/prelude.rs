// strix_sim/src/prelude.rs

// Re-export the entire strix_core prelude so binaries get the filter types too.
pub use strix_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::cli::Cli;
pub use crate::error::{SimError, SimResult};
pub use crate::simulation::config::{
    load_scenario, load_scenario_str, AgentConfig, ControlSegment, ScenarioConfig, SensorConfig,
    SimulationSettings,
};
pub use crate::simulation::prng::SimulationRng;
pub use crate::simulation::report::{render_table, AgentReport};
pub use crate::simulation::runner::run_scenario;
