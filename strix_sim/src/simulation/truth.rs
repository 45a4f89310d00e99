// strix_sim/src/simulation/truth.rs

use nalgebra::DVector;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use strix_core::prelude::*;

use crate::error::{SimError, SimResult};

/// The true pose of one agent.
///
/// The truth follows the same velocity kinematics the filter assumes, but the
/// commanded velocities are perturbed before integration with the noise the
/// model's `a1..a4` coefficients describe. The filter only ever sees the
/// commanded control.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    pose: State,
    model: VelocityKinematicsModel,
}

impl GroundTruth {
    pub fn new(initial_pose: [f64; 3], config: VelocityModelConfig) -> SimResult<Self> {
        Ok(Self {
            pose: DVector::from_row_slice(&initial_pose),
            model: VelocityKinematicsModel::new(config)?,
        })
    }

    pub fn pose(&self) -> &State {
        &self.pose
    }

    /// Advances the true pose by `dt` under a noisy version of `command`.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        command: VelocityControl,
        dt: f64,
        rng: &mut R,
    ) -> SimResult<()> {
        let applied = perturb(command, self.model.noise(), rng)?;
        self.model.set_control(applied);
        self.model.compute(&self.pose, dt)?;
        self.pose.copy_from(self.model.predicted_mean());
        Ok(())
    }
}

/// Samples the velocities actually executed for a command.
///
/// `v ~ N(v_cmd, a1·v² + a2·ω²)`, `ω ~ N(ω_cmd, a3·v² + a4·ω²)`.
pub fn perturb<R: Rng + ?Sized>(
    command: VelocityControl,
    noise: VelocityNoise,
    rng: &mut R,
) -> SimResult<VelocityControl> {
    let v2 = command.v * command.v;
    let w2 = command.omega * command.omega;
    let v_std = (noise.a1 * v2 + noise.a2 * w2).sqrt();
    let w_std = (noise.a3 * v2 + noise.a4 * w2).sqrt();
    Ok(VelocityControl::new(
        command.v + sample(v_std, rng)?,
        command.omega + sample(w_std, rng)?,
    ))
}

fn sample<R: Rng + ?Sized>(std_dev: f64, rng: &mut R) -> SimResult<f64> {
    let dist = Normal::new(0.0, std_dev)
        .map_err(|e| SimError::InvalidScenario(format!("noise std {std_dev}: {e}")))?;
    Ok(dist.sample(rng))
}
