// strix_core/src/models/mod.rs

//! Motion and measurement models consumed by the filter engine.

pub mod measurement;
pub mod motion;
