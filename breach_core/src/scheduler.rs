//! Fixed-period gate for the control loop.
//!
//! `PeriodicScheduler` decides when the next cycle may start. A cycle that
//! finishes early waits in short polling sleeps; a cycle that overruns is
//! counted and the boundary is re-armed at the current instant, so late
//! cycles are never followed by a catch-up burst.
use breach_traits::clock::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Floor for the polling sleep so a zero poll never spins.
const MIN_POLL: Duration = Duration::from_micros(1);

/// Default polling granularity: a tenth of the period.
pub fn default_poll(period: Duration) -> Duration {
    (period / 10).max(MIN_POLL)
}

/// Loop timing counters, reported by `breach run --stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Boundaries crossed since the last reset.
    pub cycles: u64,
    /// Waits that found the period already over on entry.
    pub overruns: u64,
    /// Largest amount by which a boundary was crossed late.
    pub max_lateness: Duration,
}

pub struct PeriodicScheduler {
    clock: Arc<dyn Clock + Send + Sync>,
    poll: Duration,
    last: Instant,
    stats: SchedulerStats,
}

impl core::fmt::Debug for PeriodicScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeriodicScheduler")
            .field("poll", &self.poll)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl PeriodicScheduler {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, poll: Duration) -> Self {
        let last = clock.now();
        Self {
            clock,
            poll: poll.max(MIN_POLL),
            last,
            stats: SchedulerStats::default(),
        }
    }

    /// Start a new reference point and clear the counters.
    pub fn reset(&mut self) {
        self.last = self.clock.now();
        self.stats = SchedulerStats::default();
    }

    pub fn poll(&self) -> Duration {
        self.poll
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// True once `period` has elapsed since the last true result (or reset).
    /// A true result re-arms the boundary at the current instant.
    pub fn has_period_passed(&mut self, period: Duration) -> bool {
        self.cross_if_passed(period)
    }

    /// Block until `period` has elapsed, sleeping in steps of at most the
    /// polling granularity.
    pub fn wait_for_period(&mut self, period: Duration) {
        let mut first = true;
        loop {
            if self.cross_if_passed(period) {
                if first {
                    self.stats.overruns += 1;
                    tracing::trace!(overruns = self.stats.overruns, "cycle overran its period");
                }
                return;
            }
            first = false;
            let elapsed = self.clock.now().saturating_duration_since(self.last);
            let remaining = period.saturating_sub(elapsed);
            self.clock.sleep(remaining.min(self.poll).max(MIN_POLL));
        }
    }

    fn cross_if_passed(&mut self, period: Duration) -> bool {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed < period {
            return false;
        }
        self.last = now;
        self.stats.cycles += 1;
        let late = elapsed - period;
        if late > self.stats.max_lateness {
            self.stats.max_lateness = late;
        }
        true
    }
}
