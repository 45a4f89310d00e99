// strix_sim/src/lib.rs

//! Headless simulation driver for `strix_core`: scenario loading, ground truth,
//! simulated sensors, and the per-agent filter loop.

// This prelude is for convenience for other files WITHIN the strix_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;
pub mod telemetry;
