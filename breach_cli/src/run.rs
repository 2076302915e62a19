//! Autonomous run against the simulated field: config mapping, assembly,
//! execution and reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use breach_core::error::Result as CoreResult;
use breach_core::telemetry::{TelemetryEntry, TelemetryPublisher};
use breach_core::{AutonCfg, Phase, RunParams, RunSummary, SchedulerStats, build_controller};
use breach_hardware::{FieldProfile, SimField};
use breach_traits::clock::{Clock, MonotonicClock};
use breach_traits::{Accelerometer, Axis};

use crate::cli::RtOpts;
use crate::rt::setup_rt_once;

/// Dashboard queue depth; entries beyond this are dropped.
const TELEMETRY_QUEUE: usize = 256;

pub fn profile_from(c: &breach_config::SimCfg) -> FieldProfile {
    FieldProfile {
        start_m: c.start_m,
        obstacle_m: c.obstacle_m,
        incline_deg: c.incline_deg,
        max_speed_mps: c.max_speed_mps,
        noise_g: c.noise_g,
        fault_after: c.fault_after,
    }
}

/// What `run` reports back to `main`.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub position_m: f64,
    pub telemetry_dropped: u64,
    pub period: Duration,
}

fn log_entry(e: TelemetryEntry) {
    tracing::debug!(target: "telemetry", key = e.key, value = ?e.value);
}

pub fn run_sim(
    cfg: &breach_config::Config,
    budget_s: Option<f64>,
    rt: RtOpts,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunReport> {
    setup_rt_once(rt);

    let auton: AutonCfg = cfg.into();
    let mut params: RunParams = cfg.into();
    if let Some(s) = budget_s {
        params.budget = Duration::try_from_secs_f64(s)
            .map_err(|_| eyre::eyre!("--budget-s must be a finite value >= 0 (got {s})"))?;
    }

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let field = SimField::new(profile_from(&cfg.sim), clock.clone(), auton.axis);
    let (publisher, telemetry) = TelemetryPublisher::spawn(TELEMETRY_QUEUE, log_entry);

    let mut ctl = build_controller(
        field.accelerometer(),
        field.drivetrain(),
        telemetry,
        auton,
        Some(clock),
    )?;
    let enabled = || !shutdown.load(Ordering::Relaxed);
    let result = breach_core::run_autonomous(&mut ctl, &params, &enabled);
    drop(ctl);

    let telemetry_dropped = publisher.dropped();
    let delivered = publisher.finish();
    tracing::debug!(delivered, dropped = telemetry_dropped, "telemetry publisher stopped");

    let summary = result?;
    Ok(RunReport {
        summary,
        position_m: field.position_m(),
        telemetry_dropped,
        period: params.period,
    })
}

pub fn visited_names(visited: &[Phase]) -> Vec<&'static str> {
    visited.iter().map(|p| p.name()).collect()
}

pub fn report_json(r: &RunReport) -> String {
    use serde_json::json;
    let timestamp_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let s = &r.summary;
    json!({
        "timestamp": timestamp_ms,
        "outcome": s.outcome.as_str(),
        "visited": visited_names(&s.visited),
        "cycles": s.cycles,
        "duration_ms": s.elapsed.as_millis() as u64,
        "position_m": r.position_m,
        "overruns": s.stats.overruns,
        "max_lateness_us": s.stats.max_lateness.as_micros() as u64,
        "telemetry_dropped": r.telemetry_dropped,
    })
    .to_string()
}

pub fn report_text(r: &RunReport) -> String {
    let s = &r.summary;
    format!(
        "autonomous {}: {} ({:.2} s, {} cycles, {:.2} m)",
        s.outcome.as_str(),
        visited_names(&s.visited).join(" -> "),
        s.elapsed.as_secs_f64(),
        s.cycles,
        r.position_m,
    )
}

pub fn print_stats(stats: &SchedulerStats, period: Duration) {
    eprintln!("\n--- Loop Stats ---");
    eprintln!("Cycles: {}", stats.cycles);
    eprintln!("Period (us): {}", period.as_micros());
    eprintln!("Overruns (> period): {}", stats.overruns);
    eprintln!("Max lateness (us): {}", stats.max_lateness.as_micros());
    eprintln!("------------------\n");
}

/// Phase budget lines for `breach check`.
pub fn phase_budget(cfg: &breach_config::Config) -> Vec<(&'static str, f64)> {
    let p = &cfg.phases;
    vec![
        ("wait", p.wait_s),
        ("approach", p.approach_s),
        ("breach", p.breach_s),
        ("courtyard", p.courtyard_s),
    ]
}

/// One sensor read and one drive round-trip against the simulated field.
/// The cycle's dashboard values go to the `telemetry` log target.
pub fn self_check(cfg: &breach_config::Config) -> CoreResult<f64> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let axis: Axis = cfg.sensor.axis.into();
    let field = SimField::new(profile_from(&cfg.sim), clock.clone(), axis);
    let mut sensor = field.accelerometer();
    let g = sensor
        .read(axis)
        .map_err(|e| eyre::Report::new(breach_core::hw_error::map_hw_error(&*e)))?;
    let mut ctl = build_controller(
        sensor,
        field.drivetrain(),
        breach_core::TracingTelemetry,
        cfg.into(),
        Some(clock),
    )?;
    ctl.reset()?;
    ctl.tick()?;
    ctl.stop_drive();
    Ok(g)
}
