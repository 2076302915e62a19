//! One owned context for the autonomous sequence.
//!
//! `AutonController` ties the filter, the level detector and the phase
//! machine to the sensor, drivetrain and dashboard. The runner (or a test)
//! calls `tick()` once per scheduled cycle.
use std::sync::Arc;
use std::time::Instant;

use breach_traits::clock::Clock;
use breach_traits::{Accelerometer, Drivetrain, Telemetry};
use eyre::WrapErr;

use crate::config::AutonCfg;
use crate::error::Result;
use crate::filter::MovingAverage;
use crate::hw_error::map_hw_error;
use crate::level::LevelDetector;
use crate::machine::{self, DriveCommand, Phase, StopReason};
use crate::status::{CycleStatus, Transition};

pub struct AutonController<A: Accelerometer, D: Drivetrain, T: Telemetry> {
    pub(crate) sensor: A,
    pub(crate) drive: D,
    pub(crate) telemetry: T,
    pub(crate) cfg: AutonCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    filter: MovingAverage,
    detector: LevelDetector,
    // stored as a raw tag and decoded every cycle
    phase_tag: u8,
    phase_entered: Instant,
    cycle: u64,
    last_average: f64,
    last_level: bool,
    stop_reason: Option<StopReason>,
    rejected_samples: u64,
}

impl<A: Accelerometer, D: Drivetrain, T: Telemetry> core::fmt::Debug for AutonController<A, D, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AutonController")
            .field("phase", &Phase::from_tag(self.phase_tag))
            .field("cycle", &self.cycle)
            .field("last_average", &self.last_average)
            .field("last_level", &self.last_level)
            .field("stop_reason", &self.stop_reason)
            .finish_non_exhaustive()
    }
}

impl<A: Accelerometer, D: Drivetrain, T: Telemetry> AutonController<A, D, T> {
    /// Assemble a controller from already-validated parts. Starts in `Wait`
    /// with a seeded filter; call `reset()` on autonomous entry.
    pub(crate) fn from_parts(
        sensor: A,
        drive: D,
        telemetry: T,
        cfg: AutonCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let filter = MovingAverage::new(cfg.filter.window, cfg.filter.seed);
        let detector = LevelDetector::from(cfg.level);
        let phase_entered = clock.now();
        Self {
            sensor,
            drive,
            telemetry,
            filter,
            detector,
            phase_tag: Phase::Wait.tag(),
            phase_entered,
            cycle: 0,
            last_average: cfg.filter.seed,
            last_level: false,
            stop_reason: None,
            rejected_samples: 0,
            cfg,
            clock,
        }
    }

    /// Re-enter autonomous mode: reseed the filter, go to `Wait`, restart the
    /// phase timer, zero the cycle counter and command arcade(0, 0).
    /// Calling it twice in a row leaves the same state as calling it once.
    pub fn reset(&mut self) -> Result<()> {
        self.filter.reseed(self.cfg.filter.seed);
        self.phase_tag = Phase::Wait.tag();
        self.phase_entered = self.clock.now();
        self.cycle = 0;
        self.last_average = self.filter.average();
        self.last_level = self.detector.classify(self.last_average);
        self.stop_reason = None;
        self.rejected_samples = 0;
        tracing::info!(
            window = self.filter.len(),
            seed = self.cfg.filter.seed,
            "autonomous reset"
        );
        self.apply(DriveCommand::IDLE)
    }

    /// One control cycle: read the accelerometer, then `step_with_sample`.
    pub fn tick(&mut self) -> Result<CycleStatus> {
        let sample = self
            .sensor
            .read(self.cfg.axis)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading accelerometer")?;
        self.step_with_sample(sample)
    }

    /// One control cycle with an externally supplied sample (in g).
    ///
    /// Non-finite samples are skipped: the filter keeps its previous window
    /// and the cycle proceeds on the unchanged average.
    pub fn step_with_sample(&mut self, sample: f64) -> Result<CycleStatus> {
        let average = if sample.is_finite() {
            self.filter.add_and_average(sample)
        } else {
            self.rejected_samples += 1;
            tracing::warn!(
                sample,
                rejected = self.rejected_samples,
                "skipping non-finite accelerometer sample"
            );
            self.filter.average()
        };
        let level = self.detector.classify(average);
        self.last_average = average;
        self.last_level = level;

        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.phase_entered);
        let from = Phase::from_tag(self.phase_tag);
        let step = machine::step_tag(self.phase_tag, level, elapsed, &self.cfg.machine);

        let mut transition = None;
        if from != Some(step.next) {
            self.phase_tag = step.next.tag();
            self.phase_entered = now;
            if step.stop_reason.is_some() {
                self.stop_reason = step.stop_reason;
            }
            match (from, step.stop_reason) {
                (None, _) => tracing::error!(
                    tag = self.phase_tag,
                    cycle = self.cycle,
                    "undecodable phase state; forcing Stop"
                ),
                (Some(prev), reason) => tracing::info!(
                    from = %prev,
                    to = %step.next,
                    elapsed_ms = elapsed.as_millis() as u64,
                    average,
                    reason = reason.map(StopReason::as_str),
                    "phase transition"
                ),
            }
            transition = Some(Transition {
                from,
                to: step.next,
                elapsed,
                reason: step.stop_reason,
            });
        }

        if let Some(cmd) = step.command {
            self.apply(cmd)?;
        }

        if self.cycle % u64::from(self.cfg.telemetry_every.max(1)) == 0 {
            self.publish();
        }
        tracing::trace!(
            cycle = self.cycle,
            phase = %step.next,
            sample,
            average,
            level,
            "cycle"
        );

        let status = CycleStatus {
            cycle: self.cycle,
            phase: step.next,
            level,
            average,
            command: step.command,
            transition,
        };
        self.cycle += 1;
        Ok(status)
    }

    /// Cut drive output (best-effort; failures are logged, not returned).
    pub fn stop_drive(&mut self) {
        if let Err(e) = self.drive.stop() {
            tracing::warn!(error = %e, "drivetrain stop failed");
        }
    }

    fn apply(&mut self, cmd: DriveCommand) -> Result<()> {
        match cmd {
            DriveCommand::Arcade { forward, turn } => self
                .drive
                .arcade_drive(forward, turn)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("arcade_drive"),
            DriveCommand::FullStop => {
                self.stop_drive();
                Ok(())
            }
        }
    }

    fn publish(&mut self) {
        self.telemetry.put_bool("LEVEL", self.last_level);
        self.telemetry.put_number("G", self.last_average);
        let phase = Phase::from_tag(self.phase_tag).map_or("?", Phase::name);
        self.telemetry.put_text("PHASE", phase);
    }

    /// Current phase; `None` only if the stored state is corrupt.
    pub fn phase(&self) -> Option<Phase> {
        Phase::from_tag(self.phase_tag)
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn last_average(&self) -> f64 {
        self.last_average
    }

    pub fn last_level(&self) -> bool {
        self.last_level
    }

    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    /// Time spent in the current phase so far.
    pub fn phase_elapsed(&self) -> std::time::Duration {
        self.clock.now().saturating_duration_since(self.phase_entered)
    }

    #[cfg(test)]
    pub(crate) fn force_phase_tag(&mut self, tag: u8) {
        self.phase_tag = tag;
    }
}
