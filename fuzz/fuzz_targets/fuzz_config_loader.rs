#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    if let Ok(cfg) = turbidostat_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let params = turbidostat_core::LoopParams::from(&cfg);
            assert!(params.control.dilute_period.as_secs() >= 1);
        }
    }
});
