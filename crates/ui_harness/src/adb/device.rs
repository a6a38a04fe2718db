//! Device control for the app under test

use std::time::Duration;
use tempfile::tempdir;
use tokio::process::Command;
use tracing::debug;

use crate::config::TIMING_CONFIG;
use crate::error::{HarnessError, Result};

/// Handle to one device (or emulator) reachable through adb.
///
/// Owned by the session controller; all harness I/O for the app under
/// test flows through here. Every call is read-only with respect to the
/// app except the explicit lifecycle operations.
#[derive(Debug, Clone)]
pub struct AdbDriver {
    adb_path: String,
    device_id: Option<String>,
}

impl AdbDriver {
    pub fn new(device_id: Option<String>) -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_id,
        }
    }

    /// Use a non-default adb binary
    pub fn with_adb_path(mut self, adb_path: impl Into<String>) -> Self {
        self.adb_path = adb_path.into();
        self
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Build an adb invocation with the device specifier applied
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(id) = &self.device_id {
            cmd.arg("-s").arg(id);
        }
        cmd
    }

    /// Run an adb command, collecting combined stdout/stderr
    pub(super) async fn run(&self, args: &[&str], timeout_ms: u64) -> Result<String> {
        let mut cmd = self.command();
        cmd.args(args);

        let output = tokio::time::timeout(Duration::from_millis(timeout_ms), cmd.output())
            .await
            .map_err(|_| {
                HarnessError::Timeout(format!(
                    "adb {} timed out after {}ms",
                    args.join(" "),
                    timeout_ms
                ))
            })?
            .map_err(HarnessError::Io)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(format!("{}{}", stdout, stderr))
    }

    /// Start the app. With a configured activity the start is explicit and
    /// waits for the activity to resume (`am start -W`); otherwise the
    /// launcher intent is fired through monkey.
    pub async fn start_app(&self, package: &str, activity: Option<&str>) -> Result<()> {
        let output = match activity {
            Some(activity) => {
                let component = format!("{}/{}", package, activity);
                self.run(
                    &["shell", "am", "start", "-W", "-n", &component],
                    TIMING_CONFIG.adb.command_timeout_ms,
                )
                .await?
            }
            None => {
                self.run(
                    &[
                        "shell",
                        "monkey",
                        "-p",
                        package,
                        "-c",
                        "android.intent.category.LAUNCHER",
                        "1",
                    ],
                    TIMING_CONFIG.adb.command_timeout_ms,
                )
                .await?
            }
        };

        if output.contains("Error") || output.contains("monkey aborted") {
            return Err(HarnessError::CommandFailed(format!(
                "app start failed: {}",
                output.trim()
            )));
        }
        Ok(())
    }

    /// Kill the app process and clear its activity stack
    pub async fn force_stop(&self, package: &str) -> Result<()> {
        self.run(
            &["shell", "am", "force-stop", package],
            TIMING_CONFIG.adb.command_timeout_ms,
        )
        .await?;
        Ok(())
    }

    /// Package name owning the currently focused window, or an empty
    /// string when focus cannot be determined (mid-transition)
    pub async fn foreground_package(&self) -> Result<String> {
        let output = self
            .run(
                &["shell", "dumpsys", "window"],
                TIMING_CONFIG.adb.command_timeout_ms,
            )
            .await?;

        if output.is_empty() {
            return Err(HarnessError::CommandFailed(
                "No output from dumpsys window".to_string(),
            ));
        }

        for line in output.lines() {
            if line.contains("mCurrentFocus") || line.contains("mFocusedApp") {
                if let Some(package) = parse_focus_line(line) {
                    return Ok(package);
                }
            }
        }

        Ok(String::new())
    }

    /// Capture the UI hierarchy as raw XML.
    ///
    /// The dump is written on the device, pulled into a temporary
    /// directory, and read back; a fresh capture per call.
    pub async fn dump_ui(&self) -> Result<String> {
        let temp_dir = tempdir().map_err(HarnessError::Io)?;
        let local_path = temp_dir.path().join("ui_dump.xml");

        let output = self
            .run(
                &["shell", "uiautomator", "dump", "/sdcard/ui_dump.xml"],
                TIMING_CONFIG.adb.dump_timeout_ms,
            )
            .await?;
        if !output.contains("dumped to") {
            return Err(HarnessError::CommandFailed(format!(
                "uiautomator dump failed: {}",
                output.trim()
            )));
        }

        let local = local_path.to_string_lossy().to_string();
        let pull_output = self
            .run(
                &["pull", "/sdcard/ui_dump.xml", &local],
                TIMING_CONFIG.adb.dump_timeout_ms,
            )
            .await?;
        if !local_path.exists() {
            return Err(HarnessError::CommandFailed(format!(
                "adb pull failed: {}",
                pull_output.trim()
            )));
        }

        let xml = tokio::fs::read_to_string(&local_path)
            .await
            .map_err(HarnessError::Io)?;
        debug!("UI dump: {} bytes", xml.len());
        Ok(xml)
    }
}

/// Extract the package from a window-focus line, e.g.
/// `mCurrentFocus=Window{1a2b3c u0 dev.pytorch.playground/dev.pytorch.playground.MainActivity}`
fn parse_focus_line(line: &str) -> Option<String> {
    let token = line
        .split_whitespace()
        .find(|token| token.contains('/') && !token.contains('='))?;
    let package = token.trim_end_matches('}').split('/').next()?;
    if package.is_empty() {
        None
    } else {
        Some(package.to_string())
    }
}
