// strix_core/src/estimation/session.rs

use nalgebra::DMatrix;
use tracing::warn;

use crate::belief::GaussianBelief;
use crate::error::{ensure_dim, FilterResult};
use crate::estimation::ekf::{Correction, EkfEngine};
use crate::models::measurement::MeasurementModel;
use crate::models::motion::TimedMotionModel;
use crate::types::MeasurementVector;

/// One estimation loop: a belief plus the engine and models that advance it.
///
/// The session is the long-lived owner of the belief. A failed `predict` or
/// `update` returns the error and leaves the belief as it was, so the caller
/// can decide to skip that measurement and carry on.
#[derive(Debug)]
pub struct FilterSession<M, H>
where
    M: TimedMotionModel + ?Sized,
    H: MeasurementModel + ?Sized,
{
    engine: EkfEngine,
    belief: GaussianBelief,
    predicted_since_update: bool,
    motion: Box<M>,
    measurement: Box<H>,
}

impl<M, H> FilterSession<M, H>
where
    M: TimedMotionModel + ?Sized,
    H: MeasurementModel + ?Sized,
{
    /// Wires a session together, checking that both models agree with the prior.
    pub fn new(
        engine: EkfEngine,
        prior: GaussianBelief,
        motion: Box<M>,
        measurement: Box<H>,
    ) -> FilterResult<Self> {
        ensure_dim("session motion model", prior.dim(), motion.state_dim())?;
        ensure_dim("session measurement model", prior.dim(), measurement.state_dim())?;
        Ok(Self {
            engine,
            belief: prior,
            predicted_since_update: false,
            motion,
            measurement,
        })
    }

    pub fn belief(&self) -> &GaussianBelief {
        &self.belief
    }

    pub fn engine(&self) -> &EkfEngine {
        &self.engine
    }

    /// Access to the motion model, e.g. to set the next control input.
    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    /// Access to the measurement model, e.g. to retarget a landmark sensor.
    pub fn measurement_mut(&mut self) -> &mut H {
        &mut self.measurement
    }

    /// Advances the belief by `dt` using the motion model's current control.
    pub fn predict(&mut self, dt: f64) -> FilterResult<&GaussianBelief> {
        let predicted = self.engine.predict(&self.belief, &mut *self.motion, dt)?;
        self.belief = predicted;
        self.predicted_since_update = true;
        Ok(&self.belief)
    }

    /// Fuses one measurement into the belief.
    pub fn update(&mut self, z: &MeasurementVector, r: &DMatrix<f64>) -> FilterResult<Correction> {
        if !self.predicted_since_update {
            warn!("updating a belief that was not predicted since the last update");
        }
        let correction = self.engine.correct(&self.belief, &mut *self.measurement, z, r)?;
        self.belief = correction.belief.clone();
        self.predicted_since_update = false;
        Ok(correction)
    }
}
