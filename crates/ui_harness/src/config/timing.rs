//! Timing configuration for harness operations

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

/// Wait-engine timing configuration
#[derive(Debug, Clone)]
pub struct WaitTimingConfig {
    pub poll_interval_ms: u64,
    pub default_timeout_ms: u64,
}

impl Default for WaitTimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: env::var("PLAYCHECK_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            default_timeout_ms: env::var("PLAYCHECK_WAIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        }
    }
}

impl WaitTimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Session timing configuration for launch and reset deadlines
#[derive(Debug, Clone)]
pub struct SessionTimingConfig {
    pub launch_timeout_ms: u64,
    pub reset_timeout_ms: u64,
}

impl Default for SessionTimingConfig {
    fn default() -> Self {
        Self {
            launch_timeout_ms: env::var("PLAYCHECK_LAUNCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            reset_timeout_ms: env::var("PLAYCHECK_RESET_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

/// Per-command deadlines for adb invocations
#[derive(Debug, Clone)]
pub struct AdbTimingConfig {
    pub command_timeout_ms: u64,
    pub dump_timeout_ms: u64,
    pub screenshot_timeout_ms: u64,
}

impl Default for AdbTimingConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: env::var("PLAYCHECK_ADB_COMMAND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
            dump_timeout_ms: env::var("PLAYCHECK_ADB_DUMP_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            screenshot_timeout_ms: env::var("PLAYCHECK_ADB_SCREENSHOT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub wait: WaitTimingConfig,
    pub session: SessionTimingConfig,
    pub adb: AdbTimingConfig,
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: TimingConfig = TimingConfig::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_timing_defaults() {
        let config = WaitTimingConfig::default();
        assert!(config.poll_interval_ms > 0);
        assert!(config.default_timeout_ms >= config.poll_interval_ms);
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(config.poll_interval_ms)
        );
    }

    #[test]
    fn test_session_timing_defaults() {
        let config = SessionTimingConfig::default();
        assert!(config.launch_timeout_ms >= config.reset_timeout_ms);
    }
}
