mod cli;
mod error_fmt;
mod rt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, JSON_MODE, RtOpts};
use crate::error_fmt::{exit_code_for_error, exit_code_for_outcome, format_error_json, humanize};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let mut log_guard = None;
    let code = match real_main(cli, &mut log_guard) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "breach failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    // flush the file writer before exit skips destructors
    drop(log_guard);
    std::process::exit(code);
}

fn real_main(cli: Cli, log_guard: &mut Option<WorkerGuard>) -> eyre::Result<i32> {
    color_eyre::install()?;

    // Config errors are reported before logging is up, so load first.
    let cfg = match &cli.config {
        Some(path) => breach_config::load_file(path)?,
        None => {
            let cfg = breach_config::Config::default();
            cfg.validate()?;
            cfg
        }
    };
    *log_guard = init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    if let Some(path) = &cli.config {
        tracing::debug!(config = %path.display(), "config loaded");
    }

    match cli.cmd {
        Commands::Run {
            budget_s,
            stats,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }
            let rt = RtOpts {
                enabled: rt,
                prio: rt_prio,
                lock: rt_lock,
                cpu: rt_cpu,
            };
            let report = run::run_sim(&cfg, budget_s, rt, shutdown)?;
            if stats {
                run::print_stats(&report.summary.stats, report.period);
            }
            if cli.json {
                println!("{}", run::report_json(&report));
            } else {
                println!("{}", run::report_text(&report));
            }
            Ok(exit_code_for_outcome(report.summary.outcome))
        }
        Commands::Check => {
            let budget = run::phase_budget(&cfg);
            let total = cfg.phases.total_s();
            if cli.json {
                let phases: serde_json::Map<String, serde_json::Value> = budget
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), serde_json::json!(v)))
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": true,
                        "phases_s": phases,
                        "total_s": total,
                        "budget_s": cfg.autonomous.budget_s,
                        "period_ms": cfg.loop_.period_ms,
                        "poll_us": cfg.loop_.effective_poll_us(),
                    })
                );
            } else {
                for (name, secs) in &budget {
                    println!("{name:<10} {secs:>7.3} s");
                }
                println!(
                    "total      {total:>7.3} s of {:.3} s budget",
                    cfg.autonomous.budget_s
                );
                println!(
                    "loop: {} ms period, {} us poll",
                    cfg.loop_.period_ms,
                    cfg.loop_.effective_poll_us()
                );
                println!("config OK");
            }
            Ok(0)
        }
        Commands::SelfCheck => {
            let g = run::self_check(&cfg).wrap_err("self-check")?;
            if cli.json {
                println!("{}", serde_json::json!({ "ok": true, "g": g }));
            } else {
                println!("self-check ok (accelerometer {g:.3} g)");
            }
            Ok(0)
        }
    }
}

fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &breach_config::Logging,
) -> eyre::Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => {
            let level = cli_level.or(logging.level.as_deref()).unwrap_or("info");
            EnvFilter::try_new(level).wrap_err_with(|| format!("invalid log level {level:?}"))?
        }
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed(),
        );
    }

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file:?}"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "never" => tracing_appender::rolling::never(dir, name),
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            other => eyre::bail!("logging.rotation must be never|daily|hourly (got {other:?})"),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;
    Ok(guard)
}
