// strix_sim/src/simulation/config.rs

//! Scenario files: loading, overriding from the environment, validation, and
//! rendering back to TOML.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use strix_core::prelude::*;

use crate::error::{SimError, SimResult};

/// Environment variables with this prefix override scenario values, with `__`
/// separating nested keys (`STRIX_SIMULATION__SEED=7`).
pub const ENV_PREFIX: &str = "STRIX_";

/// Top-level sections the environment may override. Anything else carrying the
/// prefix (`STRIX_HOME`, ...) is ignored.
const OVERRIDABLE_SECTIONS: [&str; 2] = ["simulation", "filter"];

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// The root of the data parsed from a scenario TOML file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub filter: EkfConfig,

    // The TOML has `[[agents]]`, which becomes a Vec of AgentConfig structs.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Filter and ground-truth step, in seconds.
    pub dt: f64,
    pub duration_seconds: f64,
    /// Seconds between two sensor measurements.
    pub measurement_period: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: None,
            dt: 0.05,
            duration_seconds: 20.0,
            measurement_period: 0.5,
        }
    }
}

impl SimulationSettings {
    /// Number of `dt` steps that cover `duration_seconds`.
    pub fn step_count(&self) -> usize {
        (self.duration_seconds / self.dt).round() as usize
    }

    /// Number of `dt` steps between measurements, at least one.
    pub fn measurement_interval(&self) -> usize {
        ((self.measurement_period / self.dt).round() as usize).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub name: String,
    /// `[x, y, theta]`, in meters and radians.
    pub initial_pose: [f64; 3],
    /// Standard deviations of the prior belief around `initial_pose`.
    #[serde(default = "default_initial_std")]
    pub initial_std: [f64; 3],
    #[serde(default)]
    pub motion: VelocityModelConfig,
    #[serde(default)]
    pub controls: Vec<ControlSegment>,
    pub sensor: SensorConfig,
}

fn default_initial_std() -> [f64; 3] {
    [0.1, 0.1, 0.05]
}

/// Hold a velocity command for `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSegment {
    pub v: f64,
    pub omega: f64,
    pub duration: f64,
}

// The `kind` field decides which sensor variant to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum SensorConfig {
    Position {
        /// `[x, y]` noise, in meters.
        noise_std: [f64; 2],
    },
    RangeBearing {
        /// `[range, bearing]` noise, in meters and radians.
        noise_std: [f64; 2],
        /// Known landmark positions, visited round-robin.
        landmarks: Vec<[f64; 2]>,
    },
}

impl SensorConfig {
    pub fn noise_std(&self) -> [f64; 2] {
        match self {
            SensorConfig::Position { noise_std } => *noise_std,
            SensorConfig::RangeBearing { noise_std, .. } => *noise_std,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            SensorConfig::Position { .. } => "position",
            SensorConfig::RangeBearing { .. } => "range_bearing",
        }
    }
}

impl AgentConfig {
    /// The command active at time `t`. The robot stops once the schedule runs out.
    pub fn control_at(&self, t: f64) -> VelocityControl {
        let mut start = 0.0;
        for segment in &self.controls {
            let end = start + segment.duration;
            if t < end {
                return VelocityControl::new(segment.v, segment.omega);
            }
            start = end;
        }
        VelocityControl::default()
    }

    fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| SimError::InvalidScenario(format!("agent '{}': {msg}", self.name));

        if self.initial_pose.iter().any(|v| !v.is_finite()) {
            return Err(invalid("initial_pose must be finite".into()));
        }
        if self.initial_std.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(invalid("initial_std must be finite and non-negative".into()));
        }
        for (i, segment) in self.controls.iter().enumerate() {
            if !segment.v.is_finite() || !segment.omega.is_finite() {
                return Err(invalid(format!("control {i} has a non-finite velocity")));
            }
            if !(segment.duration.is_finite() && segment.duration > 0.0) {
                return Err(invalid(format!("control {i} must have a positive duration")));
            }
        }
        if self.sensor.noise_std().iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(invalid("sensor noise_std must be positive".into()));
        }
        if let SensorConfig::RangeBearing { landmarks, .. } = &self.sensor {
            if landmarks.is_empty() {
                return Err(invalid("range_bearing sensor needs at least one landmark".into()));
            }
            if landmarks.iter().flatten().any(|v| !v.is_finite()) {
                return Err(invalid("landmark coordinates must be finite".into()));
            }
        }
        // The motion model owns its own calibration checks.
        VelocityKinematicsModel::new(self.motion)?;
        Ok(())
    }
}

impl ScenarioConfig {
    /// Checks everything serde cannot: ranges, cross-field constraints, unique names.
    pub fn validate(&self) -> SimResult<()> {
        let sim = &self.simulation;
        if !(sim.dt.is_finite() && sim.dt > 0.0) {
            return Err(SimError::InvalidScenario(format!("dt must be positive, got {}", sim.dt)));
        }
        if !(sim.duration_seconds.is_finite() && sim.duration_seconds >= sim.dt) {
            return Err(SimError::InvalidScenario(format!(
                "duration_seconds must cover at least one step, got {}",
                sim.duration_seconds
            )));
        }
        if !(sim.measurement_period.is_finite() && sim.measurement_period >= sim.dt) {
            return Err(SimError::InvalidScenario(format!(
                "measurement_period must be at least dt, got {}",
                sim.measurement_period
            )));
        }

        EkfEngine::new(self.filter)?;

        if self.agents.is_empty() {
            return Err(SimError::InvalidScenario("no agents defined".into()));
        }
        let mut names = HashSet::new();
        for agent in &self.agents {
            if !names.insert(agent.name.as_str()) {
                return Err(SimError::InvalidScenario(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
            agent.validate()?;
        }
        Ok(())
    }

    /// Renders the resolved scenario back into TOML.
    pub fn to_toml(&self) -> SimResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Loads a scenario file, applies `STRIX_*` environment overrides, and validates it.
pub fn load_scenario(path: &Path) -> SimResult<ScenarioConfig> {
    if !path.is_file() {
        return Err(SimError::ScenarioNotFound(path.to_path_buf()));
    }
    info!("Loading scenario from: {}", path.display());
    extract(Figment::new().merge(Toml::file(path)), ENV_PREFIX)
}

/// Same as [`load_scenario`], for a scenario held in memory.
pub fn load_scenario_str(toml: &str) -> SimResult<ScenarioConfig> {
    extract(Figment::new().merge(Toml::string(toml)), ENV_PREFIX)
}

fn extract(figment: Figment, env_prefix: &str) -> SimResult<ScenarioConfig> {
    let config: ScenarioConfig = figment.merge(env_overrides(env_prefix)).extract()?;
    config.validate()?;
    Ok(config)
}

fn env_overrides(prefix: &str) -> Env {
    Env::prefixed(prefix).split("__").filter(|key| {
        let key = key.as_str().to_ascii_lowercase();
        OVERRIDABLE_SECTIONS.iter().any(|section| {
            key.strip_prefix(section).is_some_and(|rest| rest.starts_with('.'))
        })
    })
}
