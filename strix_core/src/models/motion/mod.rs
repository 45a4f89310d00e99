// strix_core/src/models/motion/mod.rs

use dyn_clone::DynClone;
use nalgebra::DMatrix;
use std::fmt::Debug;

use crate::error::FilterResult;
use crate::types::State;

// --- MOTION MODEL TRAITS ---
// Represents how the state evolves between filter steps. `x' = f(x) + w`

/// Read side of a motion model: the results of its most recent `compute` call.
///
/// A model owns scratch buffers sized at construction and overwrites them on
/// every `compute`. Because `compute` takes `&mut self`, one instance can never
/// be computed from two threads at once. Give each thread or agent its own
/// instance (models are `DynClone`, so a configured prototype can be cloned).
pub trait MotionModel: DynClone + Debug + Send {
    /// The dimension `n` of the state vector this model propagates. Never changes.
    fn state_dim(&self) -> usize;

    /// Predicted mean `x'` from the last `compute`.
    fn predicted_mean(&self) -> &State;

    /// State Jacobian `F = ∂f/∂x`, evaluated at the mean passed to the last `compute`.
    fn jacobian(&self) -> &DMatrix<f64>;

    /// Process noise covariance `Q` from the last `compute`.
    fn process_noise(&self) -> &DMatrix<f64>;
}

/// A motion model whose step depends on the elapsed time `dt`.
pub trait TimedMotionModel: MotionModel {
    /// Recomputes the predicted mean, `F` and `Q` for a step of length `dt`
    /// starting at `mean`.
    fn compute(&mut self, mean: &State, dt: f64) -> FilterResult<()>;
}

/// A motion model that advances by one fixed, implicit step.
pub trait DiscreteMotionModel: MotionModel {
    /// Recomputes the predicted mean, `F` and `Q` for one step starting at `mean`.
    fn compute(&mut self, mean: &State) -> FilterResult<()>;
}

dyn_clone::clone_trait_object!(MotionModel);
dyn_clone::clone_trait_object!(TimedMotionModel);
dyn_clone::clone_trait_object!(DiscreteMotionModel);

pub mod velocity;
