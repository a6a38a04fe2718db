//! Configuration module for the harness
//!
//! This module contains:
//! - `timing`: Timing configurations for waits, session lifecycle, and adb calls

mod timing;

pub use timing::{
    AdbTimingConfig, SessionTimingConfig, TimingConfig, WaitTimingConfig, TIMING_CONFIG,
};
