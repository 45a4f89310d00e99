// strix_core/src/models/measurement/range_bearing.rs

use nalgebra::{DMatrix, DVector, Point2};

use crate::error::{ensure_dim, FilterError, FilterResult};
use crate::models::measurement::MeasurementModel;
use crate::models::motion::velocity::VELOCITY_STATE_DIM;
use crate::types::{normalize_angle, MeasurementVector, State};

/// Below this distance the bearing to the landmark is undefined.
const MIN_RANGE: f64 = 1e-9;

/// Range and bearing from the robot to a single known landmark.
///
/// `h(x) = ( sqrt(dx² + dy²), atan2(dy, dx) - θ )` with `dx = lx - x`, `dy = ly - y`.
/// The bearing is reported in `(-π, π]` and its innovation is wrapped the same way.
#[derive(Debug, Clone)]
pub struct RangeBearingMeasurement {
    landmark: Point2<f64>,
    z_pred: MeasurementVector,
    h_jac: DMatrix<f64>,
}

impl RangeBearingMeasurement {
    pub fn new(landmark: Point2<f64>) -> Self {
        Self {
            landmark,
            z_pred: DVector::zeros(2),
            h_jac: DMatrix::zeros(2, VELOCITY_STATE_DIM),
        }
    }

    pub fn landmark(&self) -> Point2<f64> {
        self.landmark
    }

    /// Points the sensor at a different landmark. Dimensions are unchanged.
    pub fn set_landmark(&mut self, landmark: Point2<f64>) {
        self.landmark = landmark;
    }
}

impl MeasurementModel for RangeBearingMeasurement {
    fn state_dim(&self) -> usize {
        VELOCITY_STATE_DIM
    }

    fn measurement_dim(&self) -> usize {
        2
    }

    fn compute(&mut self, predicted_mean: &State) -> FilterResult<()> {
        ensure_dim("range-bearing sensor mean", VELOCITY_STATE_DIM, predicted_mean.len())?;

        let dx = self.landmark.x - predicted_mean[0];
        let dy = self.landmark.y - predicted_mean[1];
        let q = dx * dx + dy * dy;
        let range = q.sqrt();
        if range.is_nan() || range < MIN_RANGE {
            return Err(FilterError::DegenerateGeometry(format!(
                "robot at ({}, {}) coincides with landmark ({}, {})",
                predicted_mean[0], predicted_mean[1], self.landmark.x, self.landmark.y
            )));
        }

        self.z_pred[0] = range;
        self.z_pred[1] = normalize_angle(dy.atan2(dx) - predicted_mean[2]);

        self.h_jac[(0, 0)] = -dx / range;
        self.h_jac[(0, 1)] = -dy / range;
        self.h_jac[(0, 2)] = 0.0;
        self.h_jac[(1, 0)] = dy / q;
        self.h_jac[(1, 1)] = -dx / q;
        self.h_jac[(1, 2)] = -1.0;

        Ok(())
    }

    fn predicted_measurement(&self) -> &MeasurementVector {
        &self.z_pred
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        &self.h_jac
    }

    fn residual(&self, z: &MeasurementVector, predicted: &MeasurementVector) -> MeasurementVector {
        let mut y = z - predicted;
        y[1] = normalize_angle(y[1]);
        y
    }
}
