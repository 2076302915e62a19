//! Simulated robot hardware.
//!
//! `SimField` models a robot driving in a straight line across flat floor,
//! over a two-ramp obstacle, and into the courtyard beyond it. The
//! accelerometer and drivetrain halves share one world state, so drive
//! commands move the robot and the robot's position shapes the readings.
pub mod error;

use breach_traits::{Accelerometer, Axis, BoxError, Clock, Drivetrain};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::error::HwError;

/// Field geometry and robot kinematics.
#[derive(Debug, Clone, Copy)]
pub struct FieldProfile {
    /// Flat floor before the obstacle (m).
    pub start_m: f64,
    /// Up-ramp plus down-ramp length (m).
    pub obstacle_m: f64,
    /// Ramp incline (degrees).
    pub incline_deg: f64,
    /// Ground speed at full forward command (m/s).
    pub max_speed_mps: f64,
    /// Peak noise amplitude added to every reading (g).
    pub noise_g: f64,
    /// Fail every read after this many successful ones.
    pub fault_after: Option<u64>,
}

impl Default for FieldProfile {
    fn default() -> Self {
        Self {
            start_m: 0.8,
            obstacle_m: 1.2,
            incline_deg: 15.0,
            max_speed_mps: 3.0,
            noise_g: 0.0,
            fault_after: None,
        }
    }
}

impl FieldProfile {
    /// Signed pitch in radians at `position_m`: positive on the up-ramp,
    /// negative on the down-ramp, zero on the flats.
    pub fn pitch_at(&self, position_m: f64) -> f64 {
        let up_end = self.start_m + self.obstacle_m / 2.0;
        let down_end = self.start_m + self.obstacle_m;
        let theta = self.incline_deg.to_radians();
        if position_m < self.start_m || position_m >= down_end {
            0.0
        } else if position_m < up_end {
            theta
        } else {
            -theta
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveState {
    pub forward: f64,
    pub turn: f64,
    /// Number of `stop()` calls seen.
    pub stops: u64,
    /// Number of `arcade_drive` calls seen.
    pub commands: u64,
}

struct World {
    profile: FieldProfile,
    clock: Arc<dyn Clock + Send + Sync>,
    gravity_axis: Axis,
    position_m: f64,
    last_update: Instant,
    drive: DriveState,
    reads: u64,
    noise_state: u32,
}

impl World {
    /// Integrate position up to now using the current forward command.
    fn advance(&mut self) {
        let now = self.clock.now();
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        self.position_m += self.drive.forward * self.profile.max_speed_mps * dt;
    }

    fn next_noise(&mut self) -> f64 {
        if self.profile.noise_g == 0.0 {
            return 0.0;
        }
        // xorshift32
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        let unit = f64::from(x) / (f64::from(u32::MAX) + 1.0);
        (unit * 2.0 - 1.0) * self.profile.noise_g
    }

    fn reading(&mut self, axis: Axis) -> f64 {
        let pitch = self.profile.pitch_at(self.position_m);
        let noise = self.next_noise();
        let clean = if axis == self.gravity_axis {
            pitch.cos()
        } else if axis == pitch_axis(self.gravity_axis) {
            pitch.sin()
        } else {
            0.0
        };
        clean + noise
    }
}

/// The axis that picks up the pitch component for a given gravity axis.
fn pitch_axis(gravity: Axis) -> Axis {
    match gravity {
        Axis::X => Axis::Z,
        Axis::Y => Axis::X,
        Axis::Z => Axis::Y,
    }
}

/// Shared simulated world; split into sensor and drivetrain handles.
#[derive(Clone)]
pub struct SimField {
    world: Rc<RefCell<World>>,
}

impl SimField {
    pub fn new(profile: FieldProfile, clock: Arc<dyn Clock + Send + Sync>, gravity_axis: Axis) -> Self {
        let last_update = clock.now();
        Self {
            world: Rc::new(RefCell::new(World {
                profile,
                clock,
                gravity_axis,
                position_m: 0.0,
                last_update,
                drive: DriveState::default(),
                reads: 0,
                noise_state: 0x00C0_FFEE,
            })),
        }
    }

    pub fn accelerometer(&self) -> SimAccelerometer {
        SimAccelerometer {
            world: self.world.clone(),
        }
    }

    pub fn drivetrain(&self) -> SimDrivetrain {
        SimDrivetrain {
            world: self.world.clone(),
        }
    }

    /// Distance travelled from the start line, integrated up to now.
    pub fn position_m(&self) -> f64 {
        let mut w = self.world.borrow_mut();
        w.advance();
        w.position_m
    }

    pub fn drive_state(&self) -> DriveState {
        self.world.borrow().drive
    }

    pub fn profile(&self) -> FieldProfile {
        self.world.borrow().profile
    }
}

pub struct SimAccelerometer {
    world: Rc<RefCell<World>>,
}

impl Accelerometer for SimAccelerometer {
    fn read(&mut self, axis: Axis) -> Result<f64, BoxError> {
        let mut w = self.world.borrow_mut();
        if let Some(limit) = w.profile.fault_after
            && w.reads >= limit
        {
            tracing::warn!(reads = w.reads, "simulated accelerometer fault");
            return Err(Box::new(HwError::SensorFault { reads: w.reads }));
        }
        w.advance();
        w.reads += 1;
        let g = w.reading(axis);
        tracing::trace!(?axis, g, position_m = w.position_m, "sim accel read");
        Ok(g)
    }
}

pub struct SimDrivetrain {
    world: Rc<RefCell<World>>,
}

impl Drivetrain for SimDrivetrain {
    fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), BoxError> {
        let mut w = self.world.borrow_mut();
        w.advance();
        w.drive.forward = clamp_unit(forward);
        w.drive.turn = clamp_unit(turn);
        w.drive.commands += 1;
        tracing::debug!(forward = w.drive.forward, turn = w.drive.turn, "sim arcade drive");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        let mut w = self.world.borrow_mut();
        w.advance();
        w.drive.forward = 0.0;
        w.drive.turn = 0.0;
        w.drive.stops += 1;
        Ok(())
    }
}

/// Clamp to [-1, 1]; NaN maps to 0.
fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_profile_has_up_and_down_ramps() {
        let p = FieldProfile::default();
        let theta = p.incline_deg.to_radians();
        assert_eq!(p.pitch_at(0.0), 0.0);
        assert_eq!(p.pitch_at(0.9), theta);
        assert_eq!(p.pitch_at(1.5), -theta);
        assert_eq!(p.pitch_at(2.0), 0.0);
    }

    #[test]
    fn clamp_unit_handles_out_of_range_and_nan() {
        assert_eq!(clamp_unit(2.0), 1.0);
        assert_eq!(clamp_unit(-7.5), -1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn pitch_axis_rotates() {
        assert_eq!(pitch_axis(Axis::Y), Axis::X);
        assert_eq!(pitch_axis(Axis::Z), Axis::Y);
        assert_eq!(pitch_axis(Axis::X), Axis::Z);
    }
}
