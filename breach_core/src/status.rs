//! Per-cycle status returned by `AutonController::step_with_sample`.

use crate::machine::{DriveCommand, Phase, StopReason};
use std::time::Duration;

/// A phase change observed during a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// `None` when the stored phase could not be decoded.
    pub from: Option<Phase>,
    pub to: Phase,
    /// Time spent in `from` before leaving it.
    pub elapsed: Duration,
    pub reason: Option<StopReason>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStatus {
    /// Zero-based cycle index since the last reset.
    pub cycle: u64,
    /// Phase after this cycle.
    pub phase: Phase,
    pub level: bool,
    pub average: f64,
    /// Command sent this cycle, if any.
    pub command: Option<DriveCommand>,
    pub transition: Option<Transition>,
}

impl CycleStatus {
    pub fn is_stopped(&self) -> bool {
        self.phase.is_terminal()
    }
}
