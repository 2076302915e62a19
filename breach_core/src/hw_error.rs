//! Maps `Box<dyn Error>` from trait boundaries to typed `AutonError`.
//!
//! The traits in `breach_traits` use `Box<dyn Error + Send + Sync>` so any
//! robot backend can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `breach_hardware::HwError`.

use crate::error::AutonError;

/// Map a trait-boundary error to a typed `AutonError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> AutonError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<breach_hardware::error::HwError>() {
            return match hw {
                breach_hardware::error::HwError::Timeout => AutonError::Timeout,
                other => AutonError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        AutonError::Timeout
    } else {
        AutonError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_strings_map_to_timeout() {
        let e = std::io::Error::other("i2c Timeout on bus 1");
        assert!(matches!(map_hw_error(&e), AutonError::Timeout));
    }

    #[test]
    fn other_strings_map_to_hardware() {
        let e = std::io::Error::other("bus error");
        match map_hw_error(&e) {
            AutonError::Hardware(msg) => assert_eq!(msg, "bus error"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_are_downcast() {
        use breach_hardware::error::HwError;
        assert!(matches!(map_hw_error(&HwError::Timeout), AutonError::Timeout));
        match map_hw_error(&HwError::SensorFault { reads: 7 }) {
            AutonError::HardwareFault(msg) => assert!(msg.contains("7 reads")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
