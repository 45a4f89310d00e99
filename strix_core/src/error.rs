// strix_core/src/error.rs

use thiserror::Error;

/// Every way a filter operation can fail.
///
/// No variant is recovered inside the library. When an operation returns one of
/// these, the belief it was given is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// A vector or matrix disagrees with a model's declared size or with the belief.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The innovation covariance `S` could not be inverted.
    #[error("innovation covariance is singular (reciprocal condition {reciprocal_condition:e})")]
    SingularInnovationCovariance { reciprocal_condition: f64 },

    /// Bad calibration or a bad step argument (negative coefficient, negative `dt`, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A measurement model cannot be linearized at the requested mean.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

pub type FilterResult<T> = Result<T, FilterError>;

/// Returns `DimensionMismatch` unless `actual == expected`.
pub(crate) fn ensure_dim(context: &'static str, expected: usize, actual: usize) -> FilterResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FilterError::DimensionMismatch {
            context,
            expected,
            actual,
        })
    }
}
