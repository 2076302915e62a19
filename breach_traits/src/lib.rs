//! Collaborator seams for the autonomous controller.
//!
//! Everything the control loop touches outside of pure computation goes
//! through one of these traits: the orientation sensor, the drivetrain, the
//! dashboard and the clock.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Accelerometer axis. Readings are in g (1.0 = Earth gravity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

pub trait Accelerometer {
    /// Read one sample on `axis`. Expected to be synchronous and non-blocking.
    fn read(&mut self, axis: Axis) -> Result<f64, BoxError>;
}

/// Arcade-style drivetrain. Speeds are normalized to [-1, 1]; implementations
/// clamp out-of-range input.
pub trait Drivetrain {
    fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), BoxError>;
    /// Cut motor output entirely.
    fn stop(&mut self) -> Result<(), BoxError>;
}

/// Dashboard sink. Fire-and-forget; implementations must not block.
pub trait Telemetry {
    fn put_bool(&mut self, key: &'static str, value: bool);
    fn put_number(&mut self, key: &'static str, value: f64);
    fn put_text(&mut self, key: &'static str, value: &str);
}

impl<T: Accelerometer + ?Sized> Accelerometer for Box<T> {
    fn read(&mut self, axis: Axis) -> Result<f64, BoxError> {
        (**self).read(axis)
    }
}

impl<T: Drivetrain + ?Sized> Drivetrain for Box<T> {
    fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), BoxError> {
        (**self).arcade_drive(forward, turn)
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        (**self).stop()
    }
}

impl<T: Telemetry + ?Sized> Telemetry for Box<T> {
    fn put_bool(&mut self, key: &'static str, value: bool) {
        (**self).put_bool(key, value);
    }
    fn put_number(&mut self, key: &'static str, value: f64) {
        (**self).put_number(key, value);
    }
    fn put_text(&mut self, key: &'static str, value: &str) {
        (**self).put_text(key, value);
    }
}
