#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must parse or fail cleanly; a parsed config must validate or fail cleanly.
    let Ok(cfg) = breach_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // Anything that validates has a usable loop and a phase sequence that fits the period.
        assert!(cfg.loop_.period_ms >= 1);
        assert!(cfg.loop_.effective_poll_us() >= 1);
        assert!(cfg.phases.total_s() <= cfg.autonomous.budget_s);
        assert!(cfg.level.tolerance > 0.0);
    }
});
