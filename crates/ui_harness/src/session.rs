//! Device session lifecycle and assertions
//!
//! One [`DeviceSession`] owns the app under test for a whole suite run.
//! Lifecycle mutation (`launch`, `reset`) requires `&mut self`; assertions
//! take `&self` and only ever read rendered state, so the borrow checker
//! enforces that nothing mutates the app mid-assertion.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::adb::{AdbDriver, Screenshot, UiSnapshot};
use crate::config::TIMING_CONFIG;
use crate::error::{HarnessError, Result};
use crate::locator::Locator;
use crate::wait::{poll_until_visible, Clock, NodeState, TokioClock, WaitOptions, WaitVerdict};

/// Configuration for a device session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub package: String,
    pub activity: Option<String>,
    pub device_id: Option<String>,
    pub adb_path: String,
    pub launch_timeout_ms: u64,
    pub reset_timeout_ms: u64,
}

impl SessionConfig {
    /// Create a config for the given application id
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            activity: None,
            device_id: None,
            adb_path: "adb".to_string(),
            launch_timeout_ms: TIMING_CONFIG.session.launch_timeout_ms,
            reset_timeout_ms: TIMING_CONFIG.session.reset_timeout_ms,
        }
    }

    /// Launch a specific activity instead of the default launcher intent
    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    /// Target a specific device in multi-device setups
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Use a non-default adb binary
    pub fn with_adb_path(mut self, adb_path: impl Into<String>) -> Self {
        self.adb_path = adb_path.into();
        self
    }

    /// Override the launch deadline
    pub fn with_launch_timeout_ms(mut self, launch_timeout_ms: u64) -> Self {
        self.launch_timeout_ms = launch_timeout_ms;
        self
    }

    /// Override the reset deadline
    pub fn with_reset_timeout_ms(mut self, reset_timeout_ms: u64) -> Self {
        self.reset_timeout_ms = reset_timeout_ms;
        self
    }
}

/// Lifecycle state of the app under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    NotLaunched,
    Running,
}

/// The single running instance of the application under test.
///
/// Created once per suite, launched once, reset before every test case.
pub struct DeviceSession {
    config: SessionConfig,
    driver: AdbDriver,
    clock: Arc<dyn Clock>,
    state: LaunchState,
    reset_generation: u64,
}

impl DeviceSession {
    pub fn new(config: SessionConfig) -> Self {
        let driver =
            AdbDriver::new(config.device_id.clone()).with_adb_path(config.adb_path.clone());
        Self {
            config,
            driver,
            clock: Arc::new(TokioClock::new()),
            state: LaunchState::NotLaunched,
            reset_generation: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    /// Number of completed resets since launch
    pub fn reset_generation(&self) -> u64 {
        self.reset_generation
    }

    /// Launch the app under test; a no-op when it is already running.
    ///
    /// Returns once the app owns the foreground, so the first assertion
    /// can run against an interactive UI.
    pub async fn launch(&mut self) -> Result<()> {
        if self.state == LaunchState::Running {
            debug!("launch skipped, app already running");
            return Ok(());
        }

        info!("launching {}", self.config.package);
        self.driver
            .start_app(&self.config.package, self.config.activity.as_deref())
            .await
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;
        self.await_foreground(self.config.launch_timeout_ms)
            .await
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;

        self.state = LaunchState::Running;
        Ok(())
    }

    /// Return the app to its initial screen by force-stopping and
    /// relaunching it.
    ///
    /// Requires a prior `launch`. When this returns, the initial screen
    /// is in the foreground and rendering.
    pub async fn reset(&mut self) -> Result<()> {
        if self.state != LaunchState::Running {
            return Err(HarnessError::NotLaunched);
        }

        debug!(
            "resetting {} (generation {})",
            self.config.package, self.reset_generation
        );
        self.driver
            .force_stop(&self.config.package)
            .await
            .map_err(|e| HarnessError::ResetFailed(e.to_string()))?;
        self.driver
            .start_app(&self.config.package, self.config.activity.as_deref())
            .await
            .map_err(|e| HarnessError::ResetFailed(e.to_string()))?;
        self.await_foreground(self.config.reset_timeout_ms)
            .await
            .map_err(|e| HarnessError::ResetFailed(e.to_string()))?;

        self.reset_generation += 1;
        Ok(())
    }

    /// Wait until `locator` resolves to a visible node.
    ///
    /// Returns the time the node took to appear. Fails with
    /// [`HarnessError::WaitTimeout`] carrying the last observed node state
    /// once `timeout_ms` has elapsed.
    pub async fn wait_visible(&self, locator: &Locator, timeout_ms: u64) -> Result<Duration> {
        self.require_running()?;

        let options = WaitOptions::new().with_timeout(timeout_ms);
        let verdict =
            poll_until_visible(self.clock.as_ref(), &options, || self.probe(locator)).await?;

        match verdict {
            WaitVerdict::Succeeded { elapsed } => {
                debug!("{} visible after {:?}", locator, elapsed);
                Ok(elapsed)
            }
            WaitVerdict::TimedOut {
                elapsed,
                last_state,
            } => Err(HarnessError::WaitTimeout {
                locator: locator.to_string(),
                timeout_ms,
                elapsed_ms: elapsed.as_millis() as u64,
                last_state,
            }),
        }
    }

    /// Assert `locator` is visible right now; a single snapshot, no retry.
    ///
    /// Only sound when the caller knows rendering has settled, e.g. after
    /// a successful wait on another node of the same screen.
    pub async fn assert_visible_now(&self, locator: &Locator) -> Result<()> {
        self.require_running()?;

        match self.probe(locator).await? {
            NodeState::Visible => Ok(()),
            state => Err(HarnessError::NotVisible {
                locator: locator.to_string(),
                state,
            }),
        }
    }

    /// Capture the device screen (for failure artifacts)
    pub async fn screenshot(&self) -> Result<Screenshot> {
        self.driver.screenshot().await
    }

    /// Current node state for a locator, from a fresh UI snapshot
    async fn probe(&self, locator: &Locator) -> Result<NodeState> {
        let xml = self.driver.dump_ui().await?;
        let snapshot = UiSnapshot::parse(&xml)?;
        Ok(snapshot.node_state(locator))
    }

    /// Poll until the configured package owns the foreground
    async fn await_foreground(&self, timeout_ms: u64) -> Result<()> {
        let options = WaitOptions::new().with_timeout(timeout_ms);
        let driver = &self.driver;
        let package = &self.config.package;

        let verdict = poll_until_visible(self.clock.as_ref(), &options, || async move {
            let focused = driver.foreground_package().await?;
            Ok(if focused == *package {
                NodeState::Visible
            } else {
                NodeState::Missing
            })
        })
        .await?;

        match verdict {
            WaitVerdict::Succeeded { elapsed } => {
                debug!("{} in foreground after {:?}", package, elapsed);
                Ok(())
            }
            WaitVerdict::TimedOut { elapsed, .. } => Err(HarnessError::Timeout(format!(
                "{} not in foreground after {:?}",
                package, elapsed
            ))),
        }
    }

    fn require_running(&self) -> Result<()> {
        match self.state {
            LaunchState::Running => Ok(()),
            LaunchState::NotLaunched => Err(HarnessError::NotLaunched),
        }
    }
}
