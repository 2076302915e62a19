//! Test and helper mocks for breach_core

use crate::machine::DriveCommand;
use crate::telemetry::{TelemetryEntry, TelemetryValue};
use breach_traits::{Accelerometer, Axis, BoxError, Drivetrain, Telemetry};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Always reads the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstAccelerometer(pub f64);

impl Accelerometer for ConstAccelerometer {
    fn read(&mut self, _axis: Axis) -> Result<f64, BoxError> {
        Ok(self.0)
    }
}

/// Reads whatever the paired `Rc<Cell<f64>>` handle currently holds.
#[derive(Debug, Clone)]
pub struct SettableAccelerometer {
    value: Rc<Cell<f64>>,
}

impl SettableAccelerometer {
    pub fn new(initial: f64) -> (Self, Rc<Cell<f64>>) {
        let value = Rc::new(Cell::new(initial));
        (
            Self {
                value: value.clone(),
            },
            value,
        )
    }
}

impl Accelerometer for SettableAccelerometer {
    fn read(&mut self, _axis: Axis) -> Result<f64, BoxError> {
        Ok(self.value.get())
    }
}

/// Always errors on read.
#[derive(Debug, Clone)]
pub struct FailingAccelerometer(pub &'static str);

impl Accelerometer for FailingAccelerometer {
    fn read(&mut self, _axis: Axis) -> Result<f64, BoxError> {
        Err(Box::new(std::io::Error::other(self.0)))
    }
}

pub type DriveLog = Rc<RefCell<Vec<DriveCommand>>>;

/// Records every drive call in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingDrivetrain {
    log: DriveLog,
    fail_arcade: bool,
}

impl RecordingDrivetrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A drivetrain whose `arcade_drive` always errors (stop still records).
    pub fn failing() -> Self {
        Self {
            log: DriveLog::default(),
            fail_arcade: true,
        }
    }

    pub fn log(&self) -> DriveLog {
        self.log.clone()
    }
}

impl Drivetrain for RecordingDrivetrain {
    fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), BoxError> {
        if self.fail_arcade {
            return Err(Box::new(std::io::Error::other("motor controller offline")));
        }
        self.log
            .borrow_mut()
            .push(DriveCommand::Arcade { forward, turn });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        self.log.borrow_mut().push(DriveCommand::FullStop);
        Ok(())
    }
}

pub type TelemetryLog = Rc<RefCell<Vec<TelemetryEntry>>>;

#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    log: TelemetryLog,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> TelemetryLog {
        self.log.clone()
    }

    fn push(&self, key: &'static str, value: TelemetryValue) {
        self.log.borrow_mut().push(TelemetryEntry { key, value });
    }
}

impl Telemetry for RecordingTelemetry {
    fn put_bool(&mut self, key: &'static str, value: bool) {
        self.push(key, TelemetryValue::Bool(value));
    }
    fn put_number(&mut self, key: &'static str, value: f64) {
        self.push(key, TelemetryValue::Number(value));
    }
    fn put_text(&mut self, key: &'static str, value: &str) {
        self.push(key, TelemetryValue::Text(value.to_owned()));
    }
}
