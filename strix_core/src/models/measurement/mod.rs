// strix_core/src/models/measurement/mod.rs

use dyn_clone::DynClone;
use nalgebra::DMatrix;
use std::fmt::Debug;

use crate::error::FilterResult;
use crate::types::{MeasurementVector, State};

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
pub trait MeasurementModel: DynClone + Debug + Send {
    /// The state dimension `n` this sensor observes.
    fn state_dim(&self) -> usize;

    /// The dimension `m` of the measurement vector `z`.
    fn measurement_dim(&self) -> usize;

    /// Recomputes `h(x')` and `H = ∂h/∂x`, both evaluated at `predicted_mean`.
    fn compute(&mut self, predicted_mean: &State) -> FilterResult<()>;

    /// The predicted measurement `h(x')` from the last `compute`.
    fn predicted_measurement(&self) -> &MeasurementVector;

    /// The measurement Jacobian `H` from the last `compute`.
    fn jacobian(&self) -> &DMatrix<f64>;

    /// The innovation `z - ẑ`.
    ///
    /// Sensors with angular components override this to wrap angles.
    fn residual(&self, z: &MeasurementVector, predicted: &MeasurementVector) -> MeasurementVector {
        z - predicted
    }
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn MeasurementModel>`.
dyn_clone::clone_trait_object!(MeasurementModel);

pub mod position;
pub mod range_bearing;
