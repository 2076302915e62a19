//! Type-state builder for `Auton` and generic `build_controller` constructor.
//!
//! The builder enforces at compile time that an accelerometer and a
//! drivetrain are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use breach_traits::clock::{Clock, MonotonicClock};
use breach_traits::{Accelerometer, Drivetrain, Telemetry};

use crate::config::AutonCfg;
use crate::controller::AutonController;
use crate::error::{BuildError, Result};
use crate::telemetry::NullTelemetry;

/// Boxed controller produced by the builder.
pub type Auton =
    AutonController<Box<dyn Accelerometer>, Box<dyn Drivetrain>, Box<dyn Telemetry>>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct AutonBuilder<S, D> {
    sensor: Option<Box<dyn Accelerometer>>,
    drive: Option<Box<dyn Drivetrain>>,
    telemetry: Option<Box<dyn Telemetry>>,
    cfg: Option<AutonCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
    _d: PhantomData<D>,
}

impl Default for AutonBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            drive: None,
            telemetry: None,
            cfg: None,
            clock: None,
            _s: PhantomData,
            _d: PhantomData,
        }
    }
}

impl Auton {
    /// Start building a controller.
    pub fn builder() -> AutonBuilder<Missing, Missing> {
        AutonBuilder::default()
    }
}

impl<S, D> AutonBuilder<S, D> {
    fn retag<S2, D2>(self) -> AutonBuilder<S2, D2> {
        AutonBuilder {
            sensor: self.sensor,
            drive: self.drive,
            telemetry: self.telemetry,
            cfg: self.cfg,
            clock: self.clock,
            _s: PhantomData,
            _d: PhantomData,
        }
    }

    pub fn with_accelerometer(
        mut self,
        sensor: impl Accelerometer + 'static,
    ) -> AutonBuilder<Set, D> {
        self.sensor = Some(Box::new(sensor));
        self.retag()
    }

    pub fn with_drivetrain(mut self, drive: impl Drivetrain + 'static) -> AutonBuilder<S, Set> {
        self.drive = Some(Box::new(drive));
        self.retag()
    }

    /// Dashboard sink; defaults to `NullTelemetry`.
    pub fn with_telemetry(mut self, telemetry: impl Telemetry + 'static) -> Self {
        self.telemetry = Some(Box::new(telemetry));
        self
    }

    pub fn with_config(mut self, cfg: AutonCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    /// Inject a custom clock (tests); defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and build regardless of type state.
    pub fn try_build(self) -> Result<Auton> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let drive = self
            .drive
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDrivetrain))?;
        let telemetry: Box<dyn Telemetry> = match self.telemetry {
            Some(t) => t,
            None => Box::new(NullTelemetry),
        };
        build_controller(
            sensor,
            drive,
            telemetry,
            self.cfg.unwrap_or_default(),
            self.clock,
        )
    }
}

impl AutonBuilder<Set, Set> {
    pub fn build(self) -> Result<Auton> {
        self.try_build()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Reject configurations the controller cannot run safely.
pub fn validate(cfg: &AutonCfg) -> Result<()> {
    if !cfg.filter.seed.is_finite() {
        return Err(invalid("filter seed must be finite"));
    }
    if !cfg.level.reference.is_finite() {
        return Err(invalid("level reference must be finite"));
    }
    if !(cfg.level.tolerance.is_finite() && cfg.level.tolerance > 0.0) {
        return Err(invalid("level tolerance must be > 0"));
    }
    let speeds = cfg.machine.speeds;
    if !(-1.0..=1.0).contains(&speeds.approach) || !(-1.0..=1.0).contains(&speeds.breach) {
        return Err(invalid("drive speeds must be in [-1, 1]"));
    }
    if cfg.telemetry_every == 0 {
        return Err(invalid("telemetry_every must be >= 1"));
    }
    if cfg.filter.window == 0 {
        tracing::warn!("filter window 0 clamped to 1");
    }
    Ok(())
}

/// Generic constructor for static dispatch. Validates `cfg` first.
pub fn build_controller<A: Accelerometer, D: Drivetrain, T: Telemetry>(
    sensor: A,
    drive: D,
    telemetry: T,
    cfg: AutonCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<AutonController<A, D, T>> {
    validate(&cfg)?;
    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
    Ok(AutonController::from_parts(
        sensor, drive, telemetry, cfg, clock,
    ))
}
