//! `From` implementations bridging `breach_config` types to `breach_core` types.

use std::time::Duration;

use crate::config::{AutonCfg, FilterCfg, LevelCfg, MachineCfg, PhaseTimeouts, SpeedCfg};
use crate::runner::RunParams;

/// Seconds to `Duration`; negative or non-finite input maps to zero
/// (validation rejects those before we get here).
fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v).unwrap_or(Duration::ZERO)
}

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&breach_config::FilterCfg> for FilterCfg {
    fn from(c: &breach_config::FilterCfg) -> Self {
        let window = if c.window <= 0 {
            tracing::warn!(window = c.window, "filter.window <= 0; clamping to 1");
            1
        } else {
            usize::try_from(c.window).unwrap_or(usize::MAX)
        };
        Self {
            window,
            seed: c.seed,
        }
    }
}

// ── LevelCfg / SpeedCfg / PhaseTimeouts ──────────────────────────────────────

impl From<&breach_config::LevelCfg> for LevelCfg {
    fn from(c: &breach_config::LevelCfg) -> Self {
        Self {
            reference: c.reference_g,
            tolerance: c.tolerance,
        }
    }
}

impl From<&breach_config::SpeedsCfg> for SpeedCfg {
    fn from(c: &breach_config::SpeedsCfg) -> Self {
        Self {
            approach: c.approach,
            breach: c.breach,
        }
    }
}

impl From<&breach_config::PhasesCfg> for PhaseTimeouts {
    fn from(c: &breach_config::PhasesCfg) -> Self {
        Self {
            wait: secs(c.wait_s),
            approach: secs(c.approach_s),
            breach: secs(c.breach_s),
            courtyard: secs(c.courtyard_s),
        }
    }
}

// ── Whole document ───────────────────────────────────────────────────────────

impl From<&breach_config::Config> for AutonCfg {
    fn from(c: &breach_config::Config) -> Self {
        Self {
            axis: c.sensor.axis.into(),
            filter: (&c.filter).into(),
            level: (&c.level).into(),
            machine: MachineCfg {
                timeouts: (&c.phases).into(),
                speeds: (&c.speeds).into(),
            },
            telemetry_every: c.loop_.telemetry_every,
        }
    }
}

impl From<&breach_config::Config> for RunParams {
    fn from(c: &breach_config::Config) -> Self {
        Self {
            period: Duration::from_millis(c.loop_.period_ms),
            poll: Duration::from_micros(c.loop_.effective_poll_us()),
            budget: secs(c.autonomous.budget_s),
            exit_on_stop: c.autonomous.exit_on_stop,
        }
    }
}
