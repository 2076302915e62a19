use std::sync::Arc;
use std::time::Duration;

use breach_hardware::error::HwError;
use breach_hardware::{FieldProfile, SimField};
use breach_traits::clock::test_clock::TestClock;
use breach_traits::{Accelerometer, Axis, Drivetrain};
use rstest::rstest;

fn field(profile: FieldProfile) -> (SimField, TestClock) {
    let clock = TestClock::new();
    let field = SimField::new(profile, Arc::new(clock.clone()), Axis::Y);
    (field, clock)
}

#[rstest]
fn reads_one_g_on_flat_floor() {
    let (field, _clock) = field(FieldProfile::default());
    let mut accel = field.accelerometer();
    let g = accel.read(Axis::Y).unwrap();
    assert!((g - 1.0).abs() < 1e-12);
    assert_eq!(accel.read(Axis::X).unwrap(), 0.0);
    assert_eq!(accel.read(Axis::Z).unwrap(), 0.0);
}

#[rstest]
fn driving_forward_reaches_the_ramp() {
    let profile = FieldProfile::default();
    let (field, clock) = field(profile);
    let mut accel = field.accelerometer();
    let mut drive = field.drivetrain();

    // 0.3 * 3 m/s = 0.9 m/s; one second puts the robot 0.1 m up the ramp.
    drive.arcade_drive(0.3, 0.0).unwrap();
    clock.advance(Duration::from_secs(1));
    let g = accel.read(Axis::Y).unwrap();
    let expected = profile.incline_deg.to_radians().cos();
    assert!((g - expected).abs() < 1e-12, "g = {g}");
    assert!((field.position_m() - 0.9).abs() < 1e-9);
    let pitch = accel.read(Axis::X).unwrap();
    assert!(pitch > 0.0, "up-ramp pitch should be positive");
}

#[rstest]
fn stop_freezes_position_and_counts() {
    let (field, clock) = field(FieldProfile::default());
    let mut drive = field.drivetrain();
    drive.arcade_drive(0.5, 0.0).unwrap();
    clock.advance(Duration::from_millis(200));
    drive.stop().unwrap();
    let here = field.position_m();
    clock.advance(Duration::from_secs(5));
    assert!((field.position_m() - here).abs() < 1e-12);
    let state = field.drive_state();
    assert_eq!(state.stops, 1);
    assert_eq!(state.commands, 1);
    assert_eq!(state.forward, 0.0);
}

#[rstest]
fn out_of_range_commands_are_clamped() {
    let (field, _clock) = field(FieldProfile::default());
    let mut drive = field.drivetrain();
    drive.arcade_drive(3.0, -2.0).unwrap();
    let state = field.drive_state();
    assert_eq!(state.forward, 1.0);
    assert_eq!(state.turn, -1.0);
}

#[rstest]
fn injected_fault_fails_after_limit() {
    let profile = FieldProfile {
        fault_after: Some(2),
        ..FieldProfile::default()
    };
    let (field, _clock) = field(profile);
    let mut accel = field.accelerometer();
    assert!(accel.read(Axis::Y).is_ok());
    assert!(accel.read(Axis::Y).is_ok());
    let err = accel.read(Axis::Y).expect_err("third read fails");
    match err.downcast_ref::<HwError>() {
        Some(HwError::SensorFault { reads: 2 }) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
fn noise_stays_within_amplitude() {
    let profile = FieldProfile {
        noise_g: 0.01,
        ..FieldProfile::default()
    };
    let (field, _clock) = field(profile);
    let mut accel = field.accelerometer();
    for _ in 0..500 {
        let g = accel.read(Axis::Y).unwrap();
        assert!((g - 1.0).abs() <= 0.01 + 1e-12);
    }
}
