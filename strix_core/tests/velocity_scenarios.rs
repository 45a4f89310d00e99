// strix_core/tests/velocity_scenarios.rs

use approx::assert_abs_diff_eq;
use nalgebra::{DMatrix, DVector, Point2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::FRAC_PI_2;
use strix_core::linalg::{asymmetry, is_positive_semi_definite};
use strix_core::prelude::*;

fn pose_belief(x: f64, y: f64, theta: f64, std: f64) -> GaussianBelief {
    GaussianBelief::from_std_devs(DVector::from_vec(vec![x, y, theta]), &[std; 3]).unwrap()
}

fn random_psd(rng: &mut ChaCha8Rng, n: usize) -> DMatrix<f64> {
    let a = DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0));
    // Rank-deficient on purpose now and then: zero one column.
    let a = if rng.gen_bool(0.25) {
        let mut a = a;
        a.column_mut(0).fill(0.0);
        a
    } else {
        a
    };
    &a * a.transpose()
}

#[test]
fn test_end_to_end_straight_line() {
    let engine = EkfEngine::default();
    let mut model = VelocityKinematicsModel::with_noise(0.1, 0.1, 0.1, 0.1).unwrap();
    model.set_control(VelocityControl::new(1.0, 0.0));

    let predicted = engine
        .predict(&pose_belief(0.0, 0.0, 0.0, 0.1), &mut model, 1.0)
        .unwrap();

    assert_abs_diff_eq!(predicted.mean()[0], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(predicted.mean()[1], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(predicted.mean()[2], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(model.jacobian()[(0, 2)], 0.0, epsilon = 1e-12);
}

#[test]
fn test_end_to_end_quarter_turn() {
    let engine = EkfEngine::default();
    let mut model = VelocityKinematicsModel::with_noise(0.1, 0.1, 0.1, 0.1).unwrap();
    model.set_control(VelocityControl::new(1.0, FRAC_PI_2));

    let predicted = engine
        .predict(&pose_belief(0.0, 0.0, 0.0, 0.1), &mut model, 1.0)
        .unwrap();

    // r = v/ω = 2/π; x' = r·sin(π/2), y' = r·(1 - cos(π/2)).
    let r = 2.0 / std::f64::consts::PI;
    assert_abs_diff_eq!(predicted.mean()[0], r, epsilon = 1e-5);
    assert_abs_diff_eq!(predicted.mean()[1], r, epsilon = 1e-5);
    assert_abs_diff_eq!(predicted.mean()[2], FRAC_PI_2, epsilon = 1e-5);
}

#[test]
fn test_straight_line_fixture_from_offset_pose() {
    let engine = EkfEngine::default();
    let mut model = VelocityKinematicsModel::with_noise(0.0, 0.0, 0.0, 0.0).unwrap();
    model.set_control(VelocityControl::new(2.0, 0.0));
    let dt = 0.1;

    let predicted = engine
        .predict(&pose_belief(0.5, 2.0, 3.0, 0.2), &mut model, dt)
        .unwrap();

    assert_abs_diff_eq!(predicted.mean()[0], 0.5 + 2.0 * 3.0_f64.cos() * dt, epsilon = 1e-5);
    assert_abs_diff_eq!(predicted.mean()[1], 2.0 + 2.0 * 3.0_f64.sin() * dt, epsilon = 1e-5);
    assert_abs_diff_eq!(predicted.mean()[2], 3.0, epsilon = 1e-5);
}

#[test]
fn test_propagation_preserves_psd() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let engine = EkfEngine::default();
    let mut model = VelocityKinematicsModel::with_noise(0.2, 0.05, 0.05, 0.2).unwrap();

    for _ in 0..200 {
        let prior = GaussianBelief::new(
            DVector::from_fn(3, |_, _| rng.gen_range(-5.0..5.0)),
            random_psd(&mut rng, 3),
        )
        .unwrap();
        let omega = if rng.gen_bool(0.2) { 0.0 } else { rng.gen_range(-2.0..2.0) };
        model.set_control(VelocityControl::new(rng.gen_range(-2.0..2.0), omega));

        let predicted = engine.predict(&prior, &mut model, rng.gen_range(0.0..1.0)).unwrap();
        assert_eq!(asymmetry(predicted.covariance()), 0.0);
        assert!(is_positive_semi_definite(predicted.covariance(), 1e-9));
    }
}

#[test]
fn test_update_never_increases_trace() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let engine = EkfEngine::default();
    let mut sensor = RangeBearingMeasurement::new(Point2::new(10.0, -4.0));

    for _ in 0..200 {
        let prior = GaussianBelief::new(
            DVector::from_fn(3, |_, _| rng.gen_range(-3.0..3.0)),
            random_psd(&mut rng, 3) + DMatrix::identity(3, 3) * 1e-3,
        )
        .unwrap();
        let z = DVector::from_vec(vec![rng.gen_range(5.0..15.0), rng.gen_range(-3.0..3.0)]);
        let r = DMatrix::from_diagonal(&DVector::from_vec(vec![
            rng.gen_range(0.01..1.0),
            rng.gen_range(0.001..0.1),
        ]));

        let posterior = engine.update(&prior, &mut sensor, &z, &r).unwrap();
        assert!(posterior.covariance().trace() <= prior.covariance().trace() + 1e-12);
        assert!(is_positive_semi_definite(posterior.covariance(), 1e-9));
    }
}

#[test]
fn test_long_run_stays_symmetric_and_bounded() {
    let engine = EkfEngine::default();
    let mut motion = VelocityKinematicsModel::with_noise(0.05, 0.01, 0.01, 0.05).unwrap();
    let mut sensor = PositionMeasurement::new();
    let r = DMatrix::identity(2, 2) * 0.04;
    let mut belief = pose_belief(0.0, 0.0, 0.0, 0.3);

    // Drive a circle with a perfect position sensor on the model's own prediction.
    motion.set_control(VelocityControl::new(1.0, 0.25));
    for _ in 0..2000 {
        belief = engine.predict(&belief, &mut motion, 0.05).unwrap();
        let z = DVector::from_vec(vec![belief.mean()[0], belief.mean()[1]]);
        belief = engine.update(&belief, &mut sensor, &z, &r).unwrap();
    }

    assert_eq!(asymmetry(belief.covariance()), 0.0);
    assert!(is_positive_semi_definite(belief.covariance(), 1e-9));
    assert!(belief.covariance().trace() < 1.0);
}

#[test]
fn test_session_with_boxed_models() {
    let prior = pose_belief(0.0, 0.0, 0.0, 0.5);
    let motion: Box<dyn TimedMotionModel> =
        Box::new(VelocityKinematicsModel::with_noise(0.1, 0.1, 0.1, 0.1).unwrap());
    let sensor: Box<dyn MeasurementModel> = Box::new(PositionMeasurement::new());

    // Cloned prototypes give each session its own scratch buffers.
    let mut a = FilterSession::new(EkfEngine::default(), prior.clone(), motion.clone(), sensor.clone()).unwrap();
    let mut b = FilterSession::new(EkfEngine::default(), prior, motion, sensor).unwrap();

    a.predict(1.0).unwrap();
    b.predict(2.0).unwrap();
    let z = DVector::from_vec(vec![0.1, -0.1]);
    a.update(&z, &DMatrix::identity(2, 2)).unwrap();

    assert_eq!(b.belief().mean(), &DVector::zeros(3));
    assert!(a.belief().covariance().trace() < b.belief().covariance().trace());
}
