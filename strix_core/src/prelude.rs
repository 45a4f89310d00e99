// strix_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::models::measurement::MeasurementModel;
pub use crate::models::motion::{DiscreteMotionModel, MotionModel, TimedMotionModel};

// --- Core Data Structures ---
pub use crate::belief::GaussianBelief;
pub use crate::error::{FilterError, FilterResult};
pub use crate::types::{normalize_angle, Covariance, MeasurementVector, State, VelocityControl};

// --- Estimation Algorithms ---
pub use crate::estimation::{Correction, EkfConfig, EkfEngine, FilterSession};

// --- Concrete Model Implementations ---
pub use crate::models::measurement::position::PositionMeasurement;
pub use crate::models::measurement::range_bearing::RangeBearingMeasurement;
pub use crate::models::motion::velocity::{
    VelocityKinematicsModel, VelocityModelConfig, VelocityNoise,
};
