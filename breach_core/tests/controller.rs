use breach_core::mocks::{
    DriveLog, FailingAccelerometer, RecordingDrivetrain, SettableAccelerometer,
};
use breach_core::{
    AutonCfg, AutonController, AutonError, CycleStatus, DriveCommand, NullTelemetry, Phase,
    StopReason, build_controller,
};
use breach_traits::clock::test_clock::TestClock;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(5);

type Ctl = AutonController<SettableAccelerometer, RecordingDrivetrain, NullTelemetry>;

struct Rig {
    ctl: Ctl,
    g: Rc<Cell<f64>>,
    drive: DriveLog,
    clock: TestClock,
    phases: Vec<Phase>,
}

impl Rig {
    fn new() -> Self {
        let clock = TestClock::new();
        let (sensor, g) = SettableAccelerometer::new(1.0);
        let drivetrain = RecordingDrivetrain::new();
        let drive = drivetrain.log();
        let ctl = build_controller(
            sensor,
            drivetrain,
            NullTelemetry,
            AutonCfg::default(),
            Some(Arc::new(clock.clone())),
        )
        .expect("valid default config");
        Self {
            ctl,
            g,
            drive,
            clock,
            phases: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.ctl.reset().expect("reset");
        self.phases = vec![Phase::Wait];
    }

    fn cycle(&mut self) -> CycleStatus {
        self.clock.advance(PERIOD);
        let st = self.ctl.tick().expect("tick");
        if let Some(tr) = st.transition {
            self.phases.push(tr.to);
        }
        st
    }

    /// Cycle with the sensor at `g` until `phase` is entered or `max` cycles pass.
    fn run_until(&mut self, g: f64, phase: Phase, max: usize) -> CycleStatus {
        self.g.set(g);
        for _ in 0..max {
            let st = self.cycle();
            if st.phase == phase {
                return st;
            }
        }
        panic!("did not reach {phase} within {max} cycles");
    }

    /// Hold the current reading until `at` into the phase, then switch the
    /// sensor to `g` and cycle until `phase` is entered.
    fn tilt_at(&mut self, at: Duration, g: f64, phase: Phase) -> CycleStatus {
        let from = self.ctl.phase();
        while self.ctl.phase_elapsed() < at {
            let st = self.cycle();
            assert_eq!(Some(st.phase), from, "left {from:?} before the tilt");
        }
        self.run_until(g, phase, 20)
    }
}

#[test]
fn nominal_run_visits_all_phases_in_order() {
    let mut rig = Rig::new();
    rig.reset();

    let st = rig.run_until(1.0, Phase::Approach, 400);
    assert_eq!(st.command, Some(DriveCommand::forward(0.3)));
    assert!(st.transition.unwrap().elapsed > Duration::from_secs(1));

    // robot noses onto the ramp half a second into Approach
    let at = Duration::from_millis(500);
    let st = rig.tilt_at(at, 0.966, Phase::Breach);
    assert_eq!(st.command, Some(DriveCommand::forward(1.0)));
    let tr = st.transition.unwrap();
    assert!(tr.elapsed >= at && tr.elapsed < at + Duration::from_millis(50));

    // and comes back level one second into Breach
    let at = Duration::from_secs(1);
    let st = rig.tilt_at(at, 1.0, Phase::Courtyard);
    assert_eq!(st.command, Some(DriveCommand::forward(0.3)));
    let tr = st.transition.unwrap();
    assert!(tr.elapsed >= at && tr.elapsed < at + Duration::from_millis(50));

    let st = rig.run_until(1.0, Phase::Stop, 500);
    assert_eq!(st.command, Some(DriveCommand::IDLE));
    assert_eq!(st.transition.unwrap().reason, Some(StopReason::Completed));
    assert_eq!(rig.ctl.stop_reason(), Some(StopReason::Completed));

    // Stop keeps cutting output
    assert_eq!(rig.cycle().command, Some(DriveCommand::FullStop));

    assert_eq!(
        rig.phases,
        [
            Phase::Wait,
            Phase::Approach,
            Phase::Breach,
            Phase::Courtyard,
            Phase::Stop
        ]
    );
    let log = rig.drive.borrow();
    let full_stops: Vec<usize> = log
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == DriveCommand::FullStop)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(full_stops, [log.len() - 1]);
    assert_eq!(log[0], DriveCommand::IDLE);
}

#[test]
fn approach_timeout_stops_and_stays_stopped() {
    let mut rig = Rig::new();
    rig.reset();
    rig.run_until(1.0, Phase::Approach, 400);

    // never leaves level ground
    let st = rig.run_until(1.0, Phase::Stop, 500);
    assert_eq!(st.command, Some(DriveCommand::IDLE));
    assert_eq!(st.transition.unwrap().reason, Some(StopReason::ApproachTimeout));

    // a tilted reading no longer matters
    rig.g.set(0.5);
    for _ in 0..50 {
        let st = rig.cycle();
        assert_eq!(st.phase, Phase::Stop);
        assert_eq!(st.command, Some(DriveCommand::FullStop));
        assert!(st.transition.is_none());
    }
    assert_eq!(rig.ctl.stop_reason(), Some(StopReason::ApproachTimeout));
}

#[test]
fn breach_timeout_when_never_level_again() {
    let mut rig = Rig::new();
    rig.reset();
    rig.run_until(1.0, Phase::Approach, 400);
    rig.run_until(0.9, Phase::Breach, 20);
    let st = rig.run_until(0.9, Phase::Stop, 1100);
    assert_eq!(st.transition.unwrap().reason, Some(StopReason::BreachTimeout));
    assert!(st.transition.unwrap().elapsed > Duration::from_secs(5));
}

#[test]
fn reset_is_idempotent() {
    let mut rig = Rig::new();
    rig.reset();
    rig.run_until(1.0, Phase::Approach, 400);
    rig.run_until(0.8, Phase::Breach, 20);

    rig.ctl.reset().expect("first reset");
    let after_one = format!("{:?}", rig.ctl);
    let avg_one = rig.ctl.last_average();
    rig.ctl.reset().expect("second reset");
    assert_eq!(format!("{:?}", rig.ctl), after_one);
    assert_eq!(rig.ctl.last_average(), avg_one);
    assert_eq!(rig.ctl.phase(), Some(Phase::Wait));
    assert_eq!(rig.ctl.cycle(), 0);
    assert_eq!(rig.ctl.stop_reason(), None);
    assert_eq!(rig.ctl.phase_elapsed(), Duration::ZERO);

    // filter was reseeded: a single flat reading is level again
    rig.g.set(1.0);
    assert!(rig.cycle().level);
}

#[test]
fn reset_restarts_wait_timer() {
    let mut rig = Rig::new();
    rig.clock.advance(Duration::from_secs(30));
    rig.reset();
    let st = rig.cycle();
    assert_eq!(st.phase, Phase::Wait);
    assert!(st.transition.is_none());
}

#[test]
fn sensor_error_propagates_as_typed_error() {
    let clock = TestClock::new();
    let mut ctl = build_controller(
        FailingAccelerometer("i2c bus error"),
        RecordingDrivetrain::new(),
        NullTelemetry,
        AutonCfg::default(),
        Some(Arc::new(clock)),
    )
    .unwrap();
    ctl.reset().unwrap();
    let err = ctl.tick().expect_err("sensor is down");
    match err.downcast_ref::<AutonError>() {
        Some(AutonError::Hardware(msg)) => assert!(msg.contains("i2c bus error")),
        other => panic!("expected Hardware, got: {other:?}"),
    }
    assert_eq!(err.to_string(), "reading accelerometer");
}
