// strix_core/src/types.rs

use nalgebra::{DMatrix, DVector};

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Covariance = DMatrix<f64>;
pub type MeasurementVector = DVector<f64>;

/// Translational and angular velocity command for a planar robot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityControl {
    /// Translational velocity `v`.
    pub v: f64,
    /// Angular velocity `omega`.
    pub omega: f64,
}

impl VelocityControl {
    pub fn new(v: f64, omega: f64) -> Self {
        Self { v, omega }
    }
}

/// Wraps an angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}
