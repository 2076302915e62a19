use breach_core::error::BuildError;
use breach_core::mocks::{ConstAccelerometer, RecordingDrivetrain, RecordingTelemetry};
use breach_core::{Auton, AutonCfg, Phase};
use breach_traits::clock::test_clock::TestClock;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
fn builder_missing_sensor_yields_typed_build_error() {
    let err = Auton::builder()
        // missing with_accelerometer()
        .with_drivetrain(RecordingDrivetrain::new())
        .try_build()
        .expect_err("should fail with MissingSensor");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSensor) => {}
        other => panic!("expected MissingSensor, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_drivetrain_yields_typed_build_error() {
    let err = Auton::builder()
        .with_accelerometer(ConstAccelerometer(1.0))
        .try_build()
        .expect_err("should fail with MissingDrivetrain");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingDrivetrain)
    ));
}

fn with(f: impl FnOnce(&mut AutonCfg)) -> AutonCfg {
    let mut cfg = AutonCfg::default();
    f(&mut cfg);
    cfg
}

#[rstest]
#[case::zero_tolerance(with(|c| c.level.tolerance = 0.0), "level tolerance must be > 0")]
#[case::nan_tolerance(with(|c| c.level.tolerance = f64::NAN), "level tolerance must be > 0")]
#[case::nan_reference(with(|c| c.level.reference = f64::NAN), "level reference must be finite")]
#[case::inf_seed(with(|c| c.filter.seed = f64::INFINITY), "filter seed must be finite")]
#[case::fast_breach(with(|c| c.machine.speeds.breach = 1.5), "drive speeds must be in [-1, 1]")]
#[case::nan_approach(with(|c| c.machine.speeds.approach = f64::NAN), "drive speeds must be in [-1, 1]")]
#[case::no_telemetry(with(|c| c.telemetry_every = 0), "telemetry_every must be >= 1")]
fn invalid_config_is_rejected(#[case] cfg: AutonCfg, #[case] expected: &str) {
    let err = Auton::builder()
        .with_accelerometer(ConstAccelerometer(1.0))
        .with_drivetrain(RecordingDrivetrain::new())
        .with_config(cfg)
        .build()
        .expect_err("invalid config");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert_eq!(*msg, expected),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[test]
fn zero_window_builds_with_single_slot() {
    let cfg = with(|c| c.filter.window = 0);
    let mut ctl = Auton::builder()
        .with_accelerometer(ConstAccelerometer(0.5))
        .with_drivetrain(RecordingDrivetrain::new())
        .with_config(cfg)
        .with_clock(Arc::new(TestClock::new()))
        .build()
        .expect("window 0 is clamped, not rejected");
    ctl.reset().unwrap();
    // one slot: the average is the latest sample
    let st = ctl.tick().unwrap();
    assert_eq!(st.average, 0.5);
    assert!(!st.level);
}

#[test]
fn boxed_controller_publishes_to_custom_telemetry() {
    let telemetry = RecordingTelemetry::new();
    let log = telemetry.log();
    let mut ctl = Auton::builder()
        .with_accelerometer(ConstAccelerometer(1.0))
        .with_drivetrain(RecordingDrivetrain::new())
        .with_telemetry(telemetry)
        .with_clock(Arc::new(TestClock::new()))
        .build()
        .unwrap();
    ctl.reset().unwrap();
    let st = ctl.tick().unwrap();
    assert_eq!(st.phase, Phase::Wait);
    let keys: Vec<&str> = log.borrow().iter().map(|e| e.key).collect();
    assert_eq!(keys, ["LEVEL", "G", "PHASE"]);
}
