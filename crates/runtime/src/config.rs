//! Environment-variable configuration knobs.
//!
//! A bad value for a knob falls back to its default and logs a warning
//! rather than failing evaluator startup -- the knobs are tuning, not
//! correctness-affecting, so a malformed env var shouldn't stop the host.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Ceiling on live levels before the trampoline raises a recursion
    /// error instead of growing the level stack unboundedly.
    pub max_level_depth: usize,
    /// Whether Level push/drop counters are recorded; off trades an
    /// assertion's worth of coverage for a few avoided atomic ops per step.
    pub diagnostics_enabled: bool,
    /// Wall-clock seconds after which the watchdog requests a HALT, or
    /// `0` to disable it.
    pub watchdog_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_level_depth: 10_000,
            diagnostics_enabled: cfg!(feature = "diagnostics"),
            watchdog_secs: 0,
        }
    }
}

pub fn from_env() -> Config {
    let mut config = Config::default();

    if let Ok(raw) = env::var("REBEL_MAX_LEVEL_DEPTH") {
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => config.max_level_depth = n,
            _ => tracing::warn!(
                value = %raw,
                "invalid REBEL_MAX_LEVEL_DEPTH, keeping default {}",
                config.max_level_depth
            ),
        }
    }

    if let Ok(raw) = env::var("REBEL_DIAGNOSTICS") {
        match raw.as_str() {
            "0" | "false" | "off" => config.diagnostics_enabled = false,
            "1" | "true" | "on" => config.diagnostics_enabled = true,
            _ => tracing::warn!(value = %raw, "invalid REBEL_DIAGNOSTICS, ignoring"),
        }
    }

    if let Ok(raw) = env::var("REBEL_WATCHDOG_SECS") {
        match raw.parse::<u64>() {
            Ok(n) => config.watchdog_secs = n,
            _ => tracing::warn!(value = %raw, "invalid REBEL_WATCHDOG_SECS, keeping watchdog disabled"),
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn bad_max_depth_falls_back_to_default() {
        unsafe { env::set_var("REBEL_MAX_LEVEL_DEPTH", "not-a-number") };
        let config = from_env();
        assert_eq!(config.max_level_depth, Config::default().max_level_depth);
        unsafe { env::remove_var("REBEL_MAX_LEVEL_DEPTH") };
    }

    #[test]
    #[serial]
    fn parses_valid_max_depth() {
        unsafe { env::set_var("REBEL_MAX_LEVEL_DEPTH", "42") };
        let config = from_env();
        assert_eq!(config.max_level_depth, 42);
        unsafe { env::remove_var("REBEL_MAX_LEVEL_DEPTH") };
    }
}
