#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the autonomous controller.
//!
//! - `Config` and sub-structs are deserialized from TOML; every section is
//!   optional and falls back to the competition defaults.
//! - `Config::validate` rejects values the control loop cannot run with.
//!   A non-positive filter window is not rejected here: the filter clamps it.
use serde::Deserialize;
use std::path::Path;

/// Length of the autonomous period granted by field control.
pub const DEFAULT_BUDGET_S: f64 = 15.0;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoopCfg {
    /// Control cycle period in milliseconds.
    pub period_ms: u64,
    /// Sleep granularity while waiting for the next period. Defaults to period / 10.
    pub poll_us: Option<u64>,
    /// Publish dashboard values every N cycles.
    pub telemetry_every: u32,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            period_ms: 5,
            poll_us: None,
            telemetry_every: 20,
        }
    }
}

impl LoopCfg {
    /// Effective poll interval in microseconds.
    pub fn effective_poll_us(&self) -> u64 {
        self.poll_us
            .unwrap_or_else(|| self.period_ms.saturating_mul(1000) / 10)
            .max(1)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AxisCfg {
    X,
    #[default]
    Y,
    Z,
}

impl From<AxisCfg> for breach_traits::Axis {
    fn from(a: AxisCfg) -> Self {
        match a {
            AxisCfg::X => Self::X,
            AxisCfg::Y => Self::Y,
            AxisCfg::Z => Self::Z,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SensorCfg {
    /// Accelerometer axis carrying gravity when the robot sits level.
    pub axis: AxisCfg,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Moving average window; values <= 0 are clamped to 1 by the filter.
    pub window: i64,
    /// Initial value of every slot (assume a flat start).
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LevelCfg {
    /// Smoothed reading while sitting on flat floor.
    pub reference_g: f64,
    /// Absolute tolerance around `reference_g`.
    pub tolerance: f64,
}

impl Default for LevelCfg {
    fn default() -> Self {
        Self {
            reference_g: 1.0,
            tolerance: 0.005,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SpeedsCfg {
    /// Forward speed on the flats.
    pub approach: f64,
    /// Forward speed while scaling the obstacle.
    pub breach: f64,
}

impl Default for SpeedsCfg {
    fn default() -> Self {
        Self {
            approach: 0.3,
            breach: 1.0,
        }
    }
}

/// Per-phase timeouts in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhasesCfg {
    pub wait_s: f64,
    pub approach_s: f64,
    pub breach_s: f64,
    pub courtyard_s: f64,
}

impl Default for PhasesCfg {
    fn default() -> Self {
        Self {
            wait_s: 1.0,
            approach_s: 2.0,
            breach_s: 5.0,
            courtyard_s: 2.0,
        }
    }
}

impl PhasesCfg {
    /// Worst-case sequence length when every phase runs to its timeout.
    pub fn total_s(&self) -> f64 {
        self.wait_s + self.approach_s + self.breach_s + self.courtyard_s
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutonomousCfg {
    /// Autonomous period length; the loop is disabled once it elapses.
    pub budget_s: f64,
    /// Leave the loop as soon as the machine reaches Stop.
    pub exit_on_stop: bool,
}

impl Default for AutonomousCfg {
    fn default() -> Self {
        Self {
            budget_s: DEFAULT_BUDGET_S,
            exit_on_stop: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated field used when no robot is attached.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    /// Flat floor before the obstacle, in meters.
    pub start_m: f64,
    /// Obstacle length (up-ramp plus down-ramp), in meters.
    pub obstacle_m: f64,
    /// Ramp incline in degrees.
    pub incline_deg: f64,
    /// Ground speed at full forward command.
    pub max_speed_mps: f64,
    /// Peak amplitude of deterministic sensor noise, in g.
    pub noise_g: f64,
    /// Fail every sensor read after this many successful ones.
    pub fault_after: Option<u64>,
}

impl Default for SimCfg {
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "loop")]
    pub loop_: LoopCfg,
    pub sensor: SensorCfg,
    pub filter: FilterCfg,
    pub level: LevelCfg,
    pub speeds: SpeedsCfg,
    pub phases: PhasesCfg,
    pub autonomous: AutonomousCfg,
    pub logging: Logging,
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn finite_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Loop
        if self.loop_.period_ms == 0 {
            eyre::bail!("loop.period_ms must be >= 1");
        }
        if self.loop_.period_ms > 1000 {
            eyre::bail!("loop.period_ms is unreasonably large (>1s)");
        }
        if let Some(poll) = self.loop_.poll_us {
            if poll == 0 {
                eyre::bail!("loop.poll_us must be >= 1");
            }
            if poll > self.loop_.period_ms.saturating_mul(1000) {
                eyre::bail!("loop.poll_us must not exceed loop.period_ms");
            }
        }
        if self.loop_.telemetry_every == 0 {
            eyre::bail!("loop.telemetry_every must be >= 1");
        }

        // Filter
        if self.filter.window > 4096 {
            eyre::bail!("filter.window is unreasonably large (>4096)");
        }
        if !self.filter.seed.is_finite() {
            eyre::bail!("filter.seed must be finite");
        }

        // Level
        if !self.level.reference_g.is_finite() {
            eyre::bail!("level.reference_g must be finite");
        }
        if !(self.level.tolerance.is_finite() && self.level.tolerance > 0.0) {
            eyre::bail!("level.tolerance must be > 0");
        }

        // Speeds
        for (key, v) in [
            ("speeds.approach", self.speeds.approach),
            ("speeds.breach", self.speeds.breach),
        ] {
            if !(v.is_finite() && (-1.0..=1.0).contains(&v)) {
                eyre::bail!("{key} must be in [-1.0, 1.0]");
            }
        }

        // Phases
        for (key, v) in [
            ("phases.wait_s", self.phases.wait_s),
            ("phases.approach_s", self.phases.approach_s),
            ("phases.breach_s", self.phases.breach_s),
            ("phases.courtyard_s", self.phases.courtyard_s),
        ] {
            if !finite_non_negative(v) {
                eyre::bail!("{key} must be a finite value >= 0");
            }
        }

        // Autonomous budget
        if !(self.autonomous.budget_s.is_finite() && self.autonomous.budget_s > 0.0) {
            eyre::bail!("autonomous.budget_s must be > 0");
        }
        let total = self.phases.total_s();
        if total > self.autonomous.budget_s {
            eyre::bail!(
                "phase timeouts sum to {total:.3}s which exceeds autonomous.budget_s ({:.3}s)",
                self.autonomous.budget_s
            );
        }

        // Sim
        if !finite_non_negative(self.sim.start_m) || !finite_non_negative(self.sim.obstacle_m) {
            eyre::bail!("sim.start_m and sim.obstacle_m must be finite values >= 0");
        }
        if !(self.sim.incline_deg.is_finite() && (0.0..90.0).contains(&self.sim.incline_deg)) {
            eyre::bail!("sim.incline_deg must be in [0, 90)");
        }
        if !(self.sim.max_speed_mps.is_finite() && self.sim.max_speed_mps > 0.0) {
            eyre::bail!("sim.max_speed_mps must be > 0");
        }
        if !finite_non_negative(self.sim.noise_g) {
            eyre::bail!("sim.noise_g must be a finite value >= 0");
        }

        Ok(())
    }
}
