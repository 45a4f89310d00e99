// strix_core/src/linalg.rs

//! The handful of dense linear-algebra primitives the filter core relies on.
//!
//! `nalgebra` supplies products, transposes and decompositions. This module
//! only adds the covariance-specific pieces: congruence transforms,
//! symmetrization, PSD checks and a conditioning-aware inverse.

use nalgebra::DMatrix;

use crate::error::{FilterError, FilterResult};

/// Computes `A·P·Aᵀ`.
pub fn congruence(a: &DMatrix<f64>, p: &DMatrix<f64>) -> DMatrix<f64> {
    a * p * a.transpose()
}

/// Replaces `m` with `(m + mᵀ) / 2`. Non-square input is left as is.
pub fn symmetrize(m: &mut DMatrix<f64>) {
    if !m.is_square() {
        return;
    }
    *m = (&*m + m.transpose()) * 0.5;
}

/// Largest absolute difference between `m[(i, j)]` and `m[(j, i)]`.
pub fn asymmetry(m: &DMatrix<f64>) -> f64 {
    let n = m.nrows().min(m.ncols());
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((m[(i, j)] - m[(j, i)]).abs());
        }
    }
    worst
}

/// Smallest eigenvalue of a symmetric matrix. Returns `0.0` for an empty matrix.
pub fn min_eigenvalue(m: &DMatrix<f64>) -> f64 {
    if m.is_empty() {
        return 0.0;
    }
    m.clone()
        .symmetric_eigenvalues()
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
}

/// True if `m` is square, symmetric within `tol`, and has no eigenvalue below `-tol`.
pub fn is_positive_semi_definite(m: &DMatrix<f64>, tol: f64) -> bool {
    m.is_square() && asymmetry(m) <= tol && min_eigenvalue(m) >= -tol
}

/// Ratio of the smallest to the largest singular value, in `[0, 1]`.
///
/// Any non-finite entry yields `0.0`.
pub fn reciprocal_condition(m: &DMatrix<f64>) -> f64 {
    if m.is_empty() || m.iter().any(|v| !v.is_finite()) {
        return 0.0;
    }
    let singular_values = m.clone().svd(false, false).singular_values;
    let (lo, hi) = singular_values
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    if hi <= 0.0 {
        0.0
    } else {
        lo / hi
    }
}

/// Inverts an innovation covariance, rejecting it when its reciprocal condition
/// number is at or below `tolerance`.
pub fn invert_innovation_covariance(s: &DMatrix<f64>, tolerance: f64) -> FilterResult<DMatrix<f64>> {
    let rcond = reciprocal_condition(s);
    if rcond <= tolerance {
        return Err(FilterError::SingularInnovationCovariance {
            reciprocal_condition: rcond,
        });
    }
    s.clone()
        .try_inverse()
        .ok_or(FilterError::SingularInnovationCovariance {
            reciprocal_condition: rcond,
        })
}
