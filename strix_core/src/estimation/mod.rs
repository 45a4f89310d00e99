// strix_core/src/estimation/mod.rs

//! The filter recursion and the session that owns a running estimate.

pub mod ekf;
pub mod session;

pub use ekf::{Correction, EkfConfig, EkfEngine};
pub use session::FilterSession;
