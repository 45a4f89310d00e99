// strix_sim/src/simulation/sensors.rs

use nalgebra::{DMatrix, DVector, Point2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use strix_core::prelude::*;

use crate::error::{SimError, SimResult};
use crate::simulation::config::SensorConfig;

/// The measurement model an agent carries, built from its `[agents.sensor]` table.
///
/// A range-bearing sensor cycles through its landmarks, one per measurement.
/// The filter and the measurement generator each hold their own copy and must
/// be advanced together so both look at the same landmark.
#[derive(Debug, Clone)]
pub enum SimulatedSensor {
    Position(PositionMeasurement),
    RangeBearing {
        model: RangeBearingMeasurement,
        landmarks: Vec<Point2<f64>>,
        next: usize,
    },
}

impl SimulatedSensor {
    pub fn from_config(config: &SensorConfig) -> SimResult<Self> {
        match config {
            SensorConfig::Position { .. } => Ok(SimulatedSensor::Position(PositionMeasurement::new())),
            SensorConfig::RangeBearing { landmarks, .. } => {
                let landmarks: Vec<Point2<f64>> =
                    landmarks.iter().map(|&[x, y]| Point2::new(x, y)).collect();
                let first = landmarks.first().copied().ok_or_else(|| {
                    SimError::InvalidScenario("range_bearing sensor needs a landmark".into())
                })?;
                Ok(SimulatedSensor::RangeBearing {
                    model: RangeBearingMeasurement::new(first),
                    landmarks,
                    next: 0,
                })
            }
        }
    }

    /// Points the sensor at the landmark for the next measurement.
    pub fn advance_target(&mut self) {
        if let SimulatedSensor::RangeBearing {
            model,
            landmarks,
            next,
        } = self
        {
            model.set_landmark(landmarks[*next]);
            *next = (*next + 1) % landmarks.len();
        }
    }

    fn inner(&self) -> &dyn MeasurementModel {
        match self {
            SimulatedSensor::Position(model) => model,
            SimulatedSensor::RangeBearing { model, .. } => model,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn MeasurementModel {
        match self {
            SimulatedSensor::Position(model) => model,
            SimulatedSensor::RangeBearing { model, .. } => model,
        }
    }

    /// A noisy reading of `true_pose` from the current target.
    pub fn observe<R: Rng + ?Sized>(
        &mut self,
        true_pose: &State,
        noise: &SensorNoise,
        rng: &mut R,
    ) -> FilterResult<MeasurementVector> {
        self.compute(true_pose)?;
        let mut z = noise.corrupt(self.predicted_measurement(), rng);
        if let SimulatedSensor::RangeBearing { .. } = self {
            z[1] = normalize_angle(z[1]);
        }
        Ok(z)
    }
}

impl MeasurementModel for SimulatedSensor {
    fn state_dim(&self) -> usize {
        self.inner().state_dim()
    }

    fn measurement_dim(&self) -> usize {
        self.inner().measurement_dim()
    }

    fn compute(&mut self, predicted_mean: &State) -> FilterResult<()> {
        self.inner_mut().compute(predicted_mean)
    }

    fn predicted_measurement(&self) -> &MeasurementVector {
        self.inner().predicted_measurement()
    }

    fn jacobian(&self) -> &DMatrix<f64> {
        self.inner().jacobian()
    }

    fn residual(&self, z: &MeasurementVector, predicted: &MeasurementVector) -> MeasurementVector {
        self.inner().residual(z, predicted)
    }
}

/// Independent zero-mean Gaussian noise per measurement component, and the
/// matching diagonal `R` handed to the filter.
#[derive(Debug, Clone)]
pub struct SensorNoise {
    components: Vec<Normal<f64>>,
    covariance: DMatrix<f64>,
}

impl SensorNoise {
    pub fn new(std_devs: &[f64]) -> SimResult<Self> {
        let components = std_devs
            .iter()
            .map(|s| {
                Normal::new(0.0, *s)
                    .map_err(|e| SimError::InvalidScenario(format!("sensor noise std {s}: {e}")))
            })
            .collect::<SimResult<Vec<_>>>()?;
        let variances = DVector::from_iterator(std_devs.len(), std_devs.iter().map(|s| s * s));
        Ok(Self {
            components,
            covariance: DMatrix::from_diagonal(&variances),
        })
    }

    /// `R`.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn corrupt<R: Rng + ?Sized>(&self, ideal: &MeasurementVector, rng: &mut R) -> MeasurementVector {
        DVector::from_iterator(
            ideal.len(),
            ideal
                .iter()
                .zip(&self.components)
                .map(|(z, dist)| z + dist.sample(rng)),
        )
    }
}
