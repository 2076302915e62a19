//! Configuration types for the autonomous controller.
//!
//! These are the runtime configuration structs used by `AutonController`.
//! They are separate from the TOML-deserialized config in `breach_config`.

use breach_traits::Axis;
use std::time::Duration;

/// Moving average configuration.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Window size; 0 is clamped to 1 by the filter.
    pub window: usize,
    /// Value every slot holds after a reset.
    pub seed: f64,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            window: 8,
            seed: 1.0,
        }
    }
}

/// Level classification against a calibrated at-rest reading.
#[derive(Debug, Clone, Copy)]
pub struct LevelCfg {
    pub reference: f64,
    /// `|avg - reference| < tolerance` means level.
    pub tolerance: f64,
}

impl Default for LevelCfg {
    fn default() -> Self {
        Self {
            reference: 1.0,
            tolerance: 0.005,
        }
    }
}

/// Forward drive speeds, normalized to [-1, 1].
#[derive(Debug, Clone, Copy)]
pub struct SpeedCfg {
    pub approach: f64,
    pub breach: f64,
}

impl Default for SpeedCfg {
    fn default() -> Self {
        Self {
            approach: 0.3,
            breach: 1.0,
        }
    }
}

/// Time allowed in each non-terminal phase.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTimeouts {
    pub wait: Duration,
    pub approach: Duration,
    pub breach: Duration,
    pub courtyard: Duration,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(1),
            approach: Duration::from_secs(2),
            breach: Duration::from_secs(5),
            courtyard: Duration::from_secs(2),
        }
    }
}

impl PhaseTimeouts {
    /// Worst-case length of a full sequence.
    pub fn total(&self) -> Duration {
        self.wait + self.approach + self.breach + self.courtyard
    }
}

/// Everything the pure transition function needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineCfg {
    pub timeouts: PhaseTimeouts,
    pub speeds: SpeedCfg,
}

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct AutonCfg {
    pub axis: Axis,
    pub filter: FilterCfg,
    pub level: LevelCfg,
    pub machine: MachineCfg,
    /// Publish dashboard values every N cycles (>= 1).
    pub telemetry_every: u32,
}

impl Default for AutonCfg {
    fn default() -> Self {
        Self {
            axis: Axis::Y,
            filter: FilterCfg::default(),
            level: LevelCfg::default(),
            machine: MachineCfg::default(),
            telemetry_every: 20,
        }
    }
}
