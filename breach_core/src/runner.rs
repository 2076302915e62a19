//! Autonomous period driver.
//!
//! Resets the controller, then runs `tick` cycles gated by a
//! `PeriodicScheduler` until the sequence stops, the operator disables the
//! robot, or the period budget runs out. The drivetrain is always stopped
//! on the way out, including on error.
use std::time::Duration;

use breach_traits::{Accelerometer, Drivetrain, Telemetry};

use crate::controller::AutonController;
use crate::error::Result;
use crate::machine::{Phase, StopReason};
use crate::scheduler::{PeriodicScheduler, SchedulerStats, default_poll};

/// Default autonomous period budget.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Control loop period.
    pub period: Duration,
    /// Scheduler polling granularity.
    pub poll: Duration,
    /// Hard cap on the whole run.
    pub budget: Duration,
    /// Leave the loop as soon as the machine enters `Stop`.
    pub exit_on_stop: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        let period = Duration::from_millis(5);
        Self {
            period,
            poll: default_poll(period),
            budget: DEFAULT_BUDGET,
            exit_on_stop: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The machine reached `Stop`.
    Stopped(StopReason),
    /// `enabled()` went false before `Stop`.
    Disabled,
    /// The budget elapsed before `Stop`.
    BudgetExpired,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped(r) => r.as_str(),
            Self::Disabled => "disabled",
            Self::BudgetExpired => "budget_expired",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Phases in the order they were entered, starting with `Wait`.
    pub visited: Vec<Phase>,
    pub outcome: Outcome,
    pub cycles: u64,
    pub elapsed: Duration,
    pub stats: SchedulerStats,
}

/// Run one autonomous period.
///
/// `enabled` is polled before every cycle; returning false ends the run.
pub fn run_autonomous<A, D, T>(
    ctl: &mut AutonController<A, D, T>,
    params: &RunParams,
    enabled: &dyn Fn() -> bool,
) -> Result<RunSummary>
where
    A: Accelerometer,
    D: Drivetrain,
    T: Telemetry,
{
    let clock = ctl.clock();
    let mut sched = PeriodicScheduler::new(clock.clone(), params.poll);
    if let Err(e) = ctl.reset() {
        ctl.stop_drive();
        return Err(e);
    }
    sched.reset();
    let start = clock.now();
    let mut visited = vec![Phase::Wait];
    tracing::info!(
        period_us = params.period.as_micros() as u64,
        poll_us = params.poll.as_micros() as u64,
        budget_ms = params.budget.as_millis() as u64,
        "autonomous run start"
    );

    let outcome = loop {
        if !enabled() {
            break ctl.stop_reason().map_or(Outcome::Disabled, Outcome::Stopped);
        }
        if clock.now().saturating_duration_since(start) >= params.budget {
            break ctl
                .stop_reason()
                .map_or(Outcome::BudgetExpired, Outcome::Stopped);
        }
        let status = match ctl.tick() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, cycle = ctl.cycle(), "autonomous cycle failed");
                ctl.stop_drive();
                return Err(e);
            }
        };
        if let Some(tr) = status.transition {
            visited.push(tr.to);
        }
        if status.is_stopped() && params.exit_on_stop {
            break Outcome::Stopped(ctl.stop_reason().unwrap_or(StopReason::Fault));
        }
        sched.wait_for_period(params.period);
    };

    ctl.stop_drive();
    let summary = RunSummary {
        visited,
        outcome,
        cycles: ctl.cycle(),
        elapsed: clock.now().saturating_duration_since(start),
        stats: sched.stats(),
    };
    tracing::info!(
        outcome = summary.outcome.as_str(),
        cycles = summary.cycles,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        overruns = summary.stats.overruns,
        "autonomous run end"
    );
    Ok(summary)
}
