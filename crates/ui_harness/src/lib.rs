//! ui_harness: device-driven UI smoke testing for the Playground app
//!
//! This library provides:
//! - A device session controller (launch and reset of the app under test)
//! - A visibility assertion engine (wait-until-visible with a bounded
//!   timeout and an immediate, non-polling variant)
//! - An ADB backend for app lifecycle, UI-hierarchy dumps, and screenshots
//! - A sequential suite runner with JSON-serializable reports
//!
//! # Example
//!
//! ```no_run
//! use ui_harness::{DeviceSession, Locator, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> ui_harness::Result<()> {
//!     let config = SessionConfig::new("dev.pytorch.playground");
//!     let mut session = DeviceSession::new(config);
//!
//!     session.launch().await?;
//!     session.wait_visible(&Locator::text("Playground"), 5_000).await?;
//!     session.assert_visible_now(&Locator::text("Astro Bird")).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Device backend
pub mod adb;

// Core functionality
pub mod artifacts;
pub mod locator;
pub mod session;
pub mod smoke;
pub mod suite;
pub mod wait;

// Re-export commonly used types and functions
pub use error::{HarnessError, Result};

// Config re-exports
pub use config::{
    AdbTimingConfig, SessionTimingConfig, TimingConfig, WaitTimingConfig, TIMING_CONFIG,
};

// ADB re-exports
pub use adb::{connect, list_devices, AdbDriver, ConnectionType, DeviceInfo, Screenshot, UiSnapshot};

// Locator re-exports
pub use locator::{Locator, Strategy};

// Wait re-exports
pub use wait::{
    poll_until_visible, Clock, FakeClock, NodeState, TokioClock, WaitOptions, WaitVerdict,
};

// Session re-exports
pub use session::{DeviceSession, LaunchState, SessionConfig};

// Artifact re-exports
pub use artifacts::ArtifactSaver;

// Suite re-exports
pub use suite::{run_suite, CaseFn, CaseReport, CaseStatus, SuiteReport, TestCase};

// Smoke-suite re-exports
pub use smoke::{smoke_cases, LANDING_TIMEOUT_MS, PLAYGROUND_PACKAGE};
