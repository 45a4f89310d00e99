// strix_core/src/models/measurement/position.rs

use nalgebra::{DMatrix, DVector};

use crate::error::{ensure_dim, FilterResult};
use crate::models::measurement::MeasurementModel;
use crate::models::motion::velocity::VELOCITY_STATE_DIM;
use crate::types::{MeasurementVector, State};

/// A GPS-like sensor that observes the planar position directly: `h(x) = (x, y)`.
#[derive(Debug, Clone)]
pub struct PositionMeasurement {
    z_pred: MeasurementVector,
    h_jac: DMatrix<f64>,
}

impl PositionMeasurement {
    pub fn new() -> Self {
        // H never changes: d(z_x)/d(x) = 1, d(z_y)/d(y) = 1.
        let mut h_jac = DMatrix::zeros(2, VELOCITY_STATE_DIM);
        h_jac[(0, 0)] = 1.0;
        h_jac[(1, 1)] = 1.0;
        Self {
            z_pred: DVector::zeros(2),
            h_jac,
        }
    }
}

impl Default for PositionMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementModel for PositionMeasurement {
    fn state_dim(&self) -> usize {
        VELOCITY_STATE_DIM
    }

    fn measurement_dim(&self) -> usize {
        2
    }

    fn compute(&mut self, predicted_mean: &State) -> FilterResult<()> {
        ensure_dim("position sensor mean", VELOCITY_STATE_DIM, predicted_mean.len())?;
        self.z_pred[0] = predicted_mean[0];
        self.z_pred[1] = predicted_mean[1];
        Ok(())
    }

    fn predicted_measurement(&self) -> &MeasurementVector {
        &self.z_pred
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        &self.h_jac
    }
}
