//! Screen capture for failure diagnostics

use tempfile::tempdir;
use tracing::debug;

use super::AdbDriver;
use crate::config::TIMING_CONFIG;
use crate::error::{HarnessError, Result};

/// A captured device screenshot
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl AdbDriver {
    /// Capture the device screen as PNG
    pub async fn screenshot(&self) -> Result<Screenshot> {
        let temp_dir = tempdir().map_err(HarnessError::Io)?;
        let local_path = temp_dir.path().join("screenshot.png");

        let output = self
            .run(
                &["shell", "screencap", "-p", "/sdcard/playcheck.png"],
                TIMING_CONFIG.adb.screenshot_timeout_ms,
            )
            .await?;
        if output.contains("Status: -1") || output.contains("Failed") {
            return Err(HarnessError::CommandFailed(format!(
                "screencap failed: {}",
                output.trim()
            )));
        }

        let local = local_path.to_string_lossy().to_string();
        let pull_output = self
            .run(
                &["pull", "/sdcard/playcheck.png", &local],
                TIMING_CONFIG.adb.screenshot_timeout_ms,
            )
            .await?;
        if !local_path.exists() {
            return Err(HarnessError::CommandFailed(format!(
                "adb pull failed: {}",
                pull_output.trim()
            )));
        }

        let png_bytes = tokio::fs::read(&local_path)
            .await
            .map_err(HarnessError::Io)?;
        if png_bytes.is_empty() {
            return Err(HarnessError::CommandFailed(
                "screenshot file is empty".to_string(),
            ));
        }

        // Decode once to validate the capture and pick up its dimensions
        let img = image::load_from_memory(&png_bytes).map_err(HarnessError::Image)?;
        let (width, height) = (img.width(), img.height());
        debug!(
            "screenshot captured: {}x{}, {} bytes",
            width,
            height,
            png_bytes.len()
        );

        Ok(Screenshot {
            png_bytes,
            width,
            height,
        })
    }
}
