#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Autonomous sequence logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent autonomous controller. All
//! hardware interactions go through the `breach_traits::Accelerometer`,
//! `breach_traits::Drivetrain` and `breach_traits::Telemetry` traits.
//!
//! ## Architecture
//!
//! - **Filtering**: fixed-window moving average (`filter` module)
//! - **Level detection**: tolerance check against a reference (`level` module)
//! - **Scheduling**: fixed-period loop gate with polling sleeps (`scheduler` module)
//! - **Phases**: pure transition function over `Phase` (`machine` module)
//! - **Controller**: owned per-cycle context (`controller` module)
//! - **Runner**: one autonomous period, start to drive shutdown (`runner` module)
//!
//! Per cycle the scheduler gates progress, the filter takes one sample, the
//! detector classifies the average and the machine turns the level flag and
//! the time spent in the current phase into a drive command.

pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod level;
pub mod machine;
pub mod mocks;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod telemetry;

pub use builder::{Auton, AutonBuilder, build_controller};
pub use config::{AutonCfg, FilterCfg, LevelCfg, MachineCfg, PhaseTimeouts, SpeedCfg};
pub use controller::AutonController;
pub use error::{AutonError, BuildError, Result};
pub use filter::MovingAverage;
pub use level::{LevelDetector, is_level};
pub use machine::{DriveCommand, Phase, Step, StopReason, step};
pub use runner::{Outcome, RunParams, RunSummary, run_autonomous};
pub use scheduler::{PeriodicScheduler, SchedulerStats};
pub use status::{CycleStatus, Transition};
pub use telemetry::{ChannelTelemetry, NullTelemetry, TelemetryPublisher, TracingTelemetry};
