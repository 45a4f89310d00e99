// strix_core/src/belief.rs

use nalgebra::{DMatrix, DVector};

use crate::error::{ensure_dim, FilterError, FilterResult};
use crate::types::{Covariance, State};

/// A multivariate normal estimate of the state: mean `x` and covariance `P`.
///
/// The belief is a plain data holder. It is created once from a prior, and
/// afterwards only ever replaced wholesale by the output of a filter step.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianBelief {
    mean: State,
    covariance: Covariance,
}

impl GaussianBelief {
    /// Builds a belief from an explicit mean and covariance.
    ///
    /// Fails with `DimensionMismatch` if the covariance is not square or its
    /// size disagrees with the mean.
    pub fn new(mean: State, covariance: Covariance) -> FilterResult<Self> {
        Self::check_shapes(&mean, &covariance)?;
        Ok(Self { mean, covariance })
    }

    /// A belief with the given mean and a diagonal covariance built from
    /// per-component standard deviations.
    pub fn from_std_devs(mean: State, std_devs: &[f64]) -> FilterResult<Self> {
        ensure_dim("belief standard deviations", mean.len(), std_devs.len())?;
        if let Some(bad) = std_devs.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(FilterError::InvalidParameter(format!(
                "standard deviation must be finite and non-negative, got {bad}"
            )));
        }
        let variances = DVector::from_iterator(std_devs.len(), std_devs.iter().map(|s| s * s));
        Ok(Self {
            mean,
            covariance: DMatrix::from_diagonal(&variances),
        })
    }

    /// Returns the dimension of the state vector.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &State {
        &self.mean
    }

    pub fn covariance(&self) -> &Covariance {
        &self.covariance
    }

    /// Replaces both mean and covariance after a filter step.
    ///
    /// The replacement must keep the belief's dimension; on failure the belief
    /// is unchanged.
    pub fn replace(&mut self, mean: State, covariance: Covariance) -> FilterResult<()> {
        Self::check_shapes(&mean, &covariance)?;
        ensure_dim("belief replacement", self.dim(), mean.len())?;
        self.mean = mean;
        self.covariance = covariance;
        Ok(())
    }

    /// Consumes the belief, returning `(mean, covariance)`.
    pub fn into_parts(self) -> (State, Covariance) {
        (self.mean, self.covariance)
    }

    fn check_shapes(mean: &State, covariance: &Covariance) -> FilterResult<()> {
        ensure_dim("covariance columns", covariance.nrows(), covariance.ncols())?;
        ensure_dim("covariance rows", mean.len(), covariance.nrows())
    }
}
