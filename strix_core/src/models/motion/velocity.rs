// strix_core/src/models/motion/velocity.rs

use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Matrix3x2};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_dim, FilterError, FilterResult};
use crate::models::motion::{MotionModel, TimedMotionModel};
use crate::types::{State, VelocityControl};

/// State layout: `[x, y, theta]`.
pub const VELOCITY_STATE_DIM: usize = 3;

/// Default half-width of the band around `omega = 0` handled by the
/// straight-line closed form.
pub const DEFAULT_STRAIGHT_LINE_EPSILON: f64 = 1e-6;

/// Robot-specific coefficients that scale the commanded velocities into
/// control noise: `M = diag(a1·v² + a2·ω², a3·v² + a4·ω²)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VelocityNoise {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub a4: f64,
}

impl VelocityNoise {
    pub fn new(a1: f64, a2: f64, a3: f64, a4: f64) -> Self {
        Self { a1, a2, a3, a4 }
    }

    fn validate(&self) -> FilterResult<()> {
        for (name, value) in [("a1", self.a1), ("a2", self.a2), ("a3", self.a3), ("a4", self.a4)] {
            if !value.is_finite() || value < 0.0 {
                return Err(FilterError::InvalidParameter(format!(
                    "velocity noise coefficient {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Calibration for [`VelocityKinematicsModel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VelocityModelConfig {
    pub noise: VelocityNoise,
    /// Angular velocities with `|omega| < straight_line_epsilon` use the
    /// straight-line form. `0.0` restricts it to exactly `omega == 0`.
    pub straight_line_epsilon: f64,
}

impl Default for VelocityModelConfig {
    fn default() -> Self {
        Self {
            noise: VelocityNoise::default(),
            straight_line_epsilon: DEFAULT_STRAIGHT_LINE_EPSILON,
        }
    }
}

/// Kinematics of a planar robot driven by translational and angular velocity.
///
/// ```text
/// [ x' ]   [ x ]   [ -v/ω·sin(θ) + v/ω·sin(θ + ω·Δt) ]
/// [ y' ] = [ y ] + [  v/ω·cos(θ) - v/ω·cos(θ + ω·Δt) ]
/// [ θ' ]   [ θ ]   [  ω·Δt                            ]
/// ```
///
/// Process noise is the control noise `M` mapped into state space through the
/// control Jacobian `V`: `Q = V·M·Vᵀ`.
///
/// See S. Thrun, W. Burgard, D. Fox, "Probabilistic Robotics", p. 129.
#[derive(Debug, Clone)]
pub struct VelocityKinematicsModel {
    noise: VelocityNoise,
    straight_line_epsilon: f64,
    control: VelocityControl,

    // Scratch, overwritten by every `compute`.
    predicted: State,
    f_jac: DMatrix<f64>,
    q: DMatrix<f64>,
    v_jac: Matrix3x2<f64>,
    m: Matrix2<f64>,
}

impl VelocityKinematicsModel {
    /// Builds the model, rejecting negative or non-finite calibration.
    pub fn new(config: VelocityModelConfig) -> FilterResult<Self> {
        config.noise.validate()?;
        if !config.straight_line_epsilon.is_finite() || config.straight_line_epsilon < 0.0 {
            return Err(FilterError::InvalidParameter(format!(
                "straight_line_epsilon must be finite and non-negative, got {}",
                config.straight_line_epsilon
            )));
        }

        Ok(Self {
            noise: config.noise,
            straight_line_epsilon: config.straight_line_epsilon,
            control: VelocityControl::default(),
            predicted: DVector::zeros(VELOCITY_STATE_DIM),
            f_jac: DMatrix::identity(VELOCITY_STATE_DIM, VELOCITY_STATE_DIM),
            q: DMatrix::zeros(VELOCITY_STATE_DIM, VELOCITY_STATE_DIM),
            v_jac: Matrix3x2::zeros(),
            m: Matrix2::zeros(),
        })
    }

    /// Shorthand for a model with the default straight-line band.
    pub fn with_noise(a1: f64, a2: f64, a3: f64, a4: f64) -> FilterResult<Self> {
        Self::new(VelocityModelConfig {
            noise: VelocityNoise::new(a1, a2, a3, a4),
            ..VelocityModelConfig::default()
        })
    }

    /// Sets the velocity command used by subsequent `compute` calls.
    pub fn set_control(&mut self, control: VelocityControl) {
        self.control = control;
    }

    pub fn control(&self) -> VelocityControl {
        self.control
    }

    pub fn noise(&self) -> VelocityNoise {
        self.noise
    }

    /// Control Jacobian `V = ∂f/∂(v, ω)` from the last `compute`.
    pub fn control_jacobian(&self) -> &Matrix3x2<f64> {
        &self.v_jac
    }

    /// Control noise `M` from the last `compute`.
    pub fn control_noise(&self) -> &Matrix2<f64> {
        &self.m
    }

    fn is_straight(&self) -> bool {
        let w = self.control.omega;
        w == 0.0 || w.abs() < self.straight_line_epsilon
    }
}

impl MotionModel for VelocityKinematicsModel {
    fn state_dim(&self) -> usize {
        VELOCITY_STATE_DIM
    }

    fn predicted_mean(&self) -> &State {
        &self.predicted
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        &self.f_jac
    }

    fn process_noise(&self) -> &DMatrix<f64> {
        &self.q
    }
}

impl TimedMotionModel for VelocityKinematicsModel {
    fn compute(&mut self, mean: &State, dt: f64) -> FilterResult<()> {
        ensure_dim("velocity model mean", VELOCITY_STATE_DIM, mean.len())?;
        if !dt.is_finite() || dt < 0.0 {
            return Err(FilterError::InvalidParameter(format!(
                "dt must be finite and non-negative, got {dt}"
            )));
        }
        let VelocityControl { v, omega: w } = self.control;
        if !v.is_finite() || !w.is_finite() {
            return Err(FilterError::InvalidParameter(format!(
                "velocity control must be finite, got (v={v}, omega={w})"
            )));
        }

        let (x, y, theta) = (mean[0], mean[1], mean[2]);
        let s = theta.sin();
        let c = theta.cos();

        let (x_new, y_new, theta_new, dx_dtheta, dy_dtheta, v_jac) = if self.is_straight() {
            // No curvature: v/ω is undefined, use the limit form.
            (
                x + v * c * dt,
                y + v * s * dt,
                theta + w * dt,
                -v * s * dt,
                v * c * dt,
                Matrix3x2::new(
                    c * dt, 0.0, //
                    s * dt, 0.0, //
                    0.0, dt,
                ),
            )
        } else {
            let r = v / w;
            let d_theta = w * dt;
            let sp = (theta + d_theta).sin();
            let cp = (theta + d_theta).cos();

            (
                x + r * (-s + sp),
                y + r * (c - cp),
                theta + d_theta,
                r * (-c + cp),
                r * (-s + sp),
                Matrix3x2::new(
                    (-s + sp) / w,
                    r * ((s - sp) / w + cp * dt),
                    (c - cp) / w,
                    r * (-(c - cp) / w + sp * dt),
                    0.0,
                    dt,
                ),
            )
        };

        self.predicted[0] = x_new;
        self.predicted[1] = y_new;
        self.predicted[2] = theta_new;

        self.f_jac.fill_with_identity();
        self.f_jac[(0, 2)] = dx_dtheta;
        self.f_jac[(1, 2)] = dy_dtheta;

        let VelocityNoise { a1, a2, a3, a4 } = self.noise;
        self.m = Matrix2::new(
            a1 * v * v + a2 * w * w,
            0.0,
            0.0,
            a3 * v * v + a4 * w * w,
        );
        self.v_jac = v_jac;

        let q: Matrix3<f64> = self.v_jac * self.m * self.v_jac.transpose();
        self.q.copy_from(&q);

        Ok(())
    }
}
