//! Human-readable error descriptions, exit codes, and structured JSON errors.

use breach_core::{Outcome, StopReason};

/// Exit code for a run that ended in `outcome`.
pub fn exit_code_for_outcome(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Stopped(StopReason::Completed) => 0,
        Outcome::Stopped(StopReason::ApproachTimeout) => 3,
        Outcome::Stopped(StopReason::BreachTimeout) => 4,
        Outcome::Stopped(StopReason::Fault) => 5,
        Outcome::Disabled | Outcome::BudgetExpired => 6,
    }
}

/// Hardware faults map to 5; everything else is a generic failure (1).
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use breach_core::error::AutonError;
    match err.downcast_ref::<AutonError>() {
        Some(AutonError::Hardware(_) | AutonError::HardwareFault(_) | AutonError::Timeout) => 5,
        _ => 1,
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use breach_core::error::{AutonError, BuildError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No accelerometer was provided to the controller.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the accelerometer is created successfully and passed via with_accelerometer(...).".to_string()
            }
            BuildError::MissingDrivetrain => {
                "What happened: No drivetrain was provided to the controller.\nLikely causes: The motor controllers failed to initialize or were not wired into the builder.\nHow to fix: Ensure the drivetrain is created successfully and passed via with_drivetrain(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `breach check`."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<AutonError>() {
        return match ae {
            AutonError::Timeout => "What happened: Accelerometer read timed out.\nLikely causes: Sensor bus not wired correctly, no power, or a stalled driver.\nHow to fix: Check the sensor wiring and power, then run `breach self-check`.".to_string(),
            AutonError::HardwareFault(msg) | AutonError::Hardware(msg) => format!(
                "What happened: Hardware fault during autonomous ({msg}).\nLikely causes: Sensor or drivetrain stopped responding mid-run.\nHow to fix: The drive was stopped. Inspect the hardware, then run `breach self-check` before the next match."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path, or omit --config to use the built-in defaults. Original: {msg}"
        );
    }

    if lower.starts_with("parse config") {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nLikely causes: A syntax error, a misspelled value, or a wrong type.\nHow to fix: Compare against etc/breach.toml. Original: {msg}"
        );
    }

    if lower.contains("exceeds autonomous.budget_s") {
        return format!(
            "What happened: The phase timeouts do not fit in the autonomous period ({msg}).\nLikely causes: A [phases] timeout was raised without adjusting the others.\nHow to fix: Lower the [phases] values so they sum to at most autonomous.budget_s."
        );
    }

    if lower.contains(" must ") || lower.contains("unreasonably large") {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: A value outside its allowed range.\nHow to fix: Edit the config file, then rerun `breach check`."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use breach_core::error::{AutonError, BuildError};
    use serde_json::json;

    let reason = if err.downcast_ref::<BuildError>().is_some() {
        "Build"
    } else if let Some(ae) = err.downcast_ref::<AutonError>() {
        match ae {
            AutonError::Timeout => "Timeout",
            AutonError::Hardware(_) | AutonError::HardwareFault(_) => "HardwareFault",
        }
    } else {
        "Error"
    };
    json!({
        "reason": reason,
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use breach_core::error::{AutonError, BuildError};

    #[test]
    fn outcome_exit_codes_are_stable() {
        assert_eq!(exit_code_for_outcome(Outcome::Stopped(StopReason::Completed)), 0);
        assert_eq!(exit_code_for_outcome(Outcome::Stopped(StopReason::ApproachTimeout)), 3);
        assert_eq!(exit_code_for_outcome(Outcome::Stopped(StopReason::BreachTimeout)), 4);
        assert_eq!(exit_code_for_outcome(Outcome::Stopped(StopReason::Fault)), 5);
        assert_eq!(exit_code_for_outcome(Outcome::Disabled), 6);
        assert_eq!(exit_code_for_outcome(Outcome::BudgetExpired), 6);
    }

    #[test]
    fn hardware_errors_exit_with_fault_code() {
        let e = eyre::Report::new(AutonError::HardwareFault("x".into())).wrap_err("reading accelerometer");
        assert_eq!(exit_code_for_error(&e), 5);
        assert!(humanize(&e).starts_with("What happened: Hardware fault"));
        let e = eyre::eyre!("loop.period_ms must be >= 1");
        assert_eq!(exit_code_for_error(&e), 1);
    }

    #[test]
    fn json_error_carries_reason_and_message() {
        let e = eyre::Report::new(BuildError::InvalidConfig("level tolerance must be > 0"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Build");
        assert_eq!(v["exit_code"], 1);
        assert!(v["message"].as_str().unwrap().contains("level tolerance"));
    }

    #[test]
    fn every_controller_error_has_a_json_reason() {
        for (err, reason) in [
            (AutonError::Timeout, "Timeout"),
            (AutonError::Hardware("bus".into()), "HardwareFault"),
            (AutonError::HardwareFault("bus".into()), "HardwareFault"),
        ] {
            let v: serde_json::Value =
                serde_json::from_str(&format_error_json(&eyre::Report::new(err))).unwrap();
            assert_eq!(v["reason"], reason);
            assert_eq!(v["exit_code"], 5);
        }
    }

    #[test]
    fn budget_overflow_gets_specific_hint() {
        let e = eyre::eyre!("phase timeouts sum to 16.000s which exceeds autonomous.budget_s (15.000s)");
        assert!(humanize(&e).contains("sum to at most autonomous.budget_s"));
    }
}
