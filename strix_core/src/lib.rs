// strix_core/src/lib.rs

//! Extended Kalman Filter core: Gaussian beliefs, motion and measurement model
//! contracts, a planar velocity motion model, and the predict/update engine.

pub mod belief;
pub mod error;
pub mod estimation;
pub mod linalg;
pub mod models;
pub mod prelude;
pub mod types;
