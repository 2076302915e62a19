//! Autonomous phase sequence as a pure transition function.
//!
//! `step` takes the current phase, this cycle's level flag and the time
//! spent in the phase, and returns the next phase plus the drive command to
//! issue (if any). It never touches hardware or clocks.
//!
//! ```text
//! Wait --(t > wait)--> Approach --(!level)--> Breach --(level)--> Courtyard --(t > courtyard)--> Stop
//!                         |                      |
//!                         +--(t > approach)--> Stop (ApproachTimeout)
//!                                                +--(t > breach)--> Stop (BreachTimeout)
//! ```
//!
//! Timeouts are checked before the level condition.
use crate::config::MachineCfg;
use std::fmt;
use std::time::Duration;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Wait = 0,
    Approach = 1,
    Breach = 2,
    Courtyard = 3,
    Stop = 4,
}

impl Phase {
    pub const ALL: [Self; 5] = [
        Self::Wait,
        Self::Approach,
        Self::Breach,
        Self::Courtyard,
        Self::Stop,
    ];

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a stored tag; `None` for anything outside the known phases.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Wait),
            1 => Some(Self::Approach),
            2 => Some(Self::Breach),
            3 => Some(Self::Courtyard),
            4 => Some(Self::Stop),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Wait => "Wait",
            Self::Approach => "Approach",
            Self::Breach => "Breach",
            Self::Courtyard => "Courtyard",
            Self::Stop => "Stop",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stop)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveCommand {
    Arcade { forward: f64, turn: f64 },
    /// Cut motor output.
    FullStop,
}

impl DriveCommand {
    pub const fn forward(speed: f64) -> Self {
        Self::Arcade {
            forward: speed,
            turn: 0.0,
        }
    }

    pub const IDLE: Self = Self::Arcade {
        forward: 0.0,
        turn: 0.0,
    };
}

/// Why the sequence ended in `Stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Courtyard phase ran its course.
    Completed,
    /// Never saw the obstacle.
    ApproachTimeout,
    /// Never came back to level after the obstacle.
    BreachTimeout,
    /// Phase state could not be decoded.
    Fault,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::ApproachTimeout => "approach_timeout",
            Self::BreachTimeout => "breach_timeout",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub next: Phase,
    /// Command to send this cycle; `None` leaves the previous command in force.
    pub command: Option<DriveCommand>,
    /// Set only on the cycle that enters `Stop`.
    pub stop_reason: Option<StopReason>,
}

impl Step {
    const fn stay(phase: Phase) -> Self {
        Self {
            next: phase,
            command: None,
            stop_reason: None,
        }
    }

    const fn to(next: Phase, command: DriveCommand) -> Self {
        Self {
            next,
            command: Some(command),
            stop_reason: None,
        }
    }

    const fn stop(reason: StopReason) -> Self {
        Self {
            next: Phase::Stop,
            command: Some(DriveCommand::IDLE),
            stop_reason: Some(reason),
        }
    }
}

pub fn step(phase: Phase, level: bool, elapsed: Duration, cfg: &MachineCfg) -> Step {
    let t = &cfg.timeouts;
    let s = &cfg.speeds;
    match phase {
        Phase::Wait if elapsed > t.wait => {
            Step::to(Phase::Approach, DriveCommand::forward(s.approach))
        }
        Phase::Approach if elapsed > t.approach => Step::stop(StopReason::ApproachTimeout),
        Phase::Approach if !level => Step::to(Phase::Breach, DriveCommand::forward(s.breach)),
        Phase::Breach if elapsed > t.breach => Step::stop(StopReason::BreachTimeout),
        Phase::Breach if level => Step::to(Phase::Courtyard, DriveCommand::forward(s.approach)),
        Phase::Courtyard if elapsed > t.courtyard => Step::stop(StopReason::Completed),
        Phase::Stop => Step {
            next: Phase::Stop,
            command: Some(DriveCommand::FullStop),
            stop_reason: None,
        },
        other => Step::stay(other),
    }
}

/// Transition from a raw stored tag. An undecodable tag forces `Stop` with
/// a full stop and `StopReason::Fault`.
pub fn step_tag(tag: u8, level: bool, elapsed: Duration, cfg: &MachineCfg) -> Step {
    match Phase::from_tag(tag) {
        Some(phase) => step(phase, level, elapsed, cfg),
        None => Step {
            next: Phase::Stop,
            command: Some(DriveCommand::FullStop),
            stop_reason: Some(StopReason::Fault),
        },
    }
}
