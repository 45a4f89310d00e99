// strix_core/src/estimation/ekf.rs

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::belief::GaussianBelief;
use crate::error::{ensure_dim, FilterError, FilterResult};
use crate::linalg::{congruence, invert_innovation_covariance, symmetrize};
use crate::models::measurement::MeasurementModel;
use crate::models::motion::{DiscreteMotionModel, MotionModel, TimedMotionModel};
use crate::types::MeasurementVector;

/// Tuning for [`EkfEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EkfConfig {
    /// `S` is rejected as singular when its reciprocal condition number is at
    /// or below this value.
    pub singular_tolerance: f64,
    /// Average each propagated and corrected covariance with its transpose.
    pub symmetrize: bool,
}

impl Default for EkfConfig {
    fn default() -> Self {
        Self {
            singular_tolerance: 1e-12,
            symmetrize: true,
        }
    }
}

/// Everything the update step computed, not just the posterior.
#[derive(Debug, Clone)]
pub struct Correction {
    /// The posterior belief `(x'', P'')`.
    pub belief: GaussianBelief,
    /// Innovation `y = z - h(x')`.
    pub innovation: MeasurementVector,
    /// Innovation covariance `S = H·P'·Hᵀ + R`.
    pub innovation_covariance: DMatrix<f64>,
    /// Kalman gain `K = P'·Hᵀ·S⁻¹`.
    pub gain: DMatrix<f64>,
    /// Normalized innovation squared `yᵀ·S⁻¹·y`.
    pub nis: f64,
}

/// The predict/update recursion of an Extended Kalman Filter.
///
/// The engine holds no model logic and no belief. Each call takes the belief by
/// reference and returns a new one, so a failed call leaves the caller's belief
/// untouched.
///
/// Callers are expected to `predict` exactly once per control input before each
/// `update`. The engine does not enforce this: updating a belief that was never
/// predicted is still a valid Bayesian update on the prior.
#[derive(Debug, Clone, Default)]
pub struct EkfEngine {
    config: EkfConfig,
}

impl EkfEngine {
    pub fn new(config: EkfConfig) -> FilterResult<Self> {
        if !(0.0..1.0).contains(&config.singular_tolerance) {
            return Err(FilterError::InvalidParameter(format!(
                "singular_tolerance must lie in [0, 1), got {}",
                config.singular_tolerance
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EkfConfig {
        &self.config
    }

    /// Propagates `belief` through a time-parameterized motion model over `dt`.
    ///
    /// `x' = f(x)`, `P' = F·P·Fᵀ + Q`.
    pub fn predict<M>(&self, belief: &GaussianBelief, model: &mut M, dt: f64) -> FilterResult<GaussianBelief>
    where
        M: TimedMotionModel + ?Sized,
    {
        ensure_dim("motion model state", model.state_dim(), belief.dim())?;
        model.compute(belief.mean(), dt)?;
        trace!(dim = belief.dim(), dt, "ekf predict");
        self.propagate(belief, &*model)
    }

    /// Propagates `belief` one step through a discrete-time motion model.
    pub fn predict_discrete<M>(&self, belief: &GaussianBelief, model: &mut M) -> FilterResult<GaussianBelief>
    where
        M: DiscreteMotionModel + ?Sized,
    {
        ensure_dim("motion model state", model.state_dim(), belief.dim())?;
        model.compute(belief.mean())?;
        trace!(dim = belief.dim(), "ekf predict (discrete)");
        self.propagate(belief, &*model)
    }

    /// Fuses measurement `z` with noise covariance `r` and returns the posterior.
    pub fn update<H>(
        &self,
        belief: &GaussianBelief,
        model: &mut H,
        z: &MeasurementVector,
        r: &DMatrix<f64>,
    ) -> FilterResult<GaussianBelief>
    where
        H: MeasurementModel + ?Sized,
    {
        self.correct(belief, model, z, r).map(|c| c.belief)
    }

    /// Same as [`EkfEngine::update`], but also returns the innovation, its
    /// covariance and the gain.
    pub fn correct<H>(
        &self,
        belief: &GaussianBelief,
        model: &mut H,
        z: &MeasurementVector,
        r: &DMatrix<f64>,
    ) -> FilterResult<Correction>
    where
        H: MeasurementModel + ?Sized,
    {
        let n = belief.dim();
        let m = model.measurement_dim();
        ensure_dim("measurement model state", model.state_dim(), n)?;
        ensure_dim("measurement vector", m, z.len())?;
        ensure_dim("measurement noise rows", m, r.nrows())?;
        ensure_dim("measurement noise columns", m, r.ncols())?;

        model.compute(belief.mean())?;
        let z_pred = model.predicted_measurement();
        let h_jac = model.jacobian();
        ensure_dim("predicted measurement", m, z_pred.len())?;
        ensure_dim("measurement jacobian rows", m, h_jac.nrows())?;
        ensure_dim("measurement jacobian columns", n, h_jac.ncols())?;

        let y = model.residual(z, z_pred);
        let p = belief.covariance();
        let p_ht = p * h_jac.transpose();
        let s = h_jac * &p_ht + r;

        let s_inv = invert_innovation_covariance(&s, self.config.singular_tolerance).map_err(|e| {
            debug!(error = %e, "ekf update rejected");
            e
        })?;

        let k_gain = &p_ht * &s_inv;
        let nis = y.dot(&(&s_inv * &y));

        let mean = belief.mean() + &k_gain * &y;
        let i_kh = DMatrix::<f64>::identity(n, n) - &k_gain * h_jac;
        let mut covariance = i_kh * p;
        if self.config.symmetrize {
            symmetrize(&mut covariance);
        }
        trace!(dim = n, measurement_dim = m, nis, "ekf update");

        Ok(Correction {
            belief: GaussianBelief::new(mean, covariance)?,
            innovation: y,
            innovation_covariance: s,
            gain: k_gain,
            nis,
        })
    }

    fn propagate<M>(&self, belief: &GaussianBelief, model: &M) -> FilterResult<GaussianBelief>
    where
        M: MotionModel + ?Sized,
    {
        let n = belief.dim();
        let f_jac = model.jacobian();
        let q = model.process_noise();
        ensure_dim("predicted mean", n, model.predicted_mean().len())?;
        ensure_dim("motion jacobian rows", n, f_jac.nrows())?;
        ensure_dim("motion jacobian columns", n, f_jac.ncols())?;
        ensure_dim("process noise rows", n, q.nrows())?;
        ensure_dim("process noise columns", n, q.ncols())?;

        let mut covariance = congruence(f_jac, belief.covariance()) + q;
        if self.config.symmetrize {
            symmetrize(&mut covariance);
        }
        GaussianBelief::new(model.predicted_mean().clone(), covariance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{asymmetry, is_positive_semi_definite};
    use crate::models::measurement::position::PositionMeasurement;
    use crate::models::motion::velocity::VelocityKinematicsModel;
    use crate::types::VelocityControl;
    use approx::assert_abs_diff_eq;
    use nalgebra::DVector;

    fn prior() -> GaussianBelief {
        GaussianBelief::from_std_devs(DVector::from_vec(vec![0.0, 0.0, 0.0]), &[0.5, 0.5, 0.1]).unwrap()
    }

    fn velocity(v: f64, w: f64) -> VelocityKinematicsModel {
        let mut model = VelocityKinematicsModel::with_noise(0.05, 0.01, 0.01, 0.05).unwrap();
        model.set_control(VelocityControl::new(v, w));
        model
    }

    #[test]
    fn test_rejects_out_of_range_tolerance() {
        let config = EkfConfig {
            singular_tolerance: 1.5,
            ..EkfConfig::default()
        };
        assert!(EkfEngine::new(config).is_err());
    }

    #[test]
    fn test_predict_propagates_covariance() {
        let engine = EkfEngine::default();
        let mut model = velocity(1.0, 0.3);
        let belief = prior();
        let predicted = engine.predict(&belief, &mut model, 0.5).unwrap();

        let f = model.jacobian();
        let expected = f * belief.covariance() * f.transpose() + model.process_noise();
        for (a, b) in predicted.covariance().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        assert_eq!(predicted.mean(), model.predicted_mean());
        assert!(is_positive_semi_definite(predicted.covariance(), 1e-12));
    }

    #[test]
    fn test_update_with_exact_measurement_keeps_mean() {
        let engine = EkfEngine::default();
        let mut model = PositionMeasurement::new();
        let belief = GaussianBelief::from_std_devs(DVector::from_vec(vec![1.0, 2.0, 0.5]), &[1.0, 1.0, 0.2])
            .unwrap();
        let z = DVector::from_vec(vec![1.0, 2.0]);
        let r = DMatrix::identity(2, 2) * 0.1;

        let correction = engine.correct(&belief, &mut model, &z, &r).unwrap();
        assert_abs_diff_eq!(correction.innovation.amax(), 0.0);
        assert_abs_diff_eq!(correction.nis, 0.0);
        for (a, b) in correction.belief.mean().iter().zip(belief.mean().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        assert!(correction.belief.covariance().trace() < belief.covariance().trace());
        assert_eq!(asymmetry(correction.belief.covariance()), 0.0);
    }

    #[test]
    fn test_update_rejects_wrong_noise_shape() {
        let engine = EkfEngine::default();
        let mut model = PositionMeasurement::new();
        let err = engine
            .update(&prior(), &mut model, &DVector::zeros(2), &DMatrix::identity(3, 3))
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::DimensionMismatch {
                context: "measurement noise rows",
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_singular_innovation_covariance() {
        let engine = EkfEngine::default();
        let mut model = PositionMeasurement::new();
        // Perfectly known position and a noiseless sensor: S = 0.
        let belief = GaussianBelief::new(
            DVector::zeros(3),
            DMatrix::from_diagonal(&DVector::from_vec(vec![0.0, 0.0, 1.0])),
        )
        .unwrap();
        let err = engine
            .update(&belief, &mut model, &DVector::zeros(2), &DMatrix::zeros(2, 2))
            .unwrap_err();
        assert!(matches!(err, FilterError::SingularInnovationCovariance { .. }));
    }
}
