//! Failure artifact persistence
//!
//! Saves diagnostic screenshots under a timestamped run directory so a
//! failed case leaves evidence of what the screen actually showed.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::adb::Screenshot;
use crate::error::{HarnessError, Result};

/// Manages screenshot persistence for one suite run
#[derive(Debug, Clone)]
pub struct ArtifactSaver {
    base_dir: PathBuf,
    run_dir: PathBuf,
    case_count: usize,
}

impl ArtifactSaver {
    /// Create a saver with a fresh run directory under `base_dir`.
    ///
    /// The run directory is named `yyyy-mm-dd_HH-MM-SS`.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let run_start: DateTime<Local> = Local::now();
        let run_dir = base_dir.join(run_start.format("%Y-%m-%d_%H-%M-%S").to_string());

        fs::create_dir_all(&run_dir).await.map_err(HarnessError::Io)?;
        info!("artifact run directory: {}", run_dir.display());

        Ok(Self {
            base_dir,
            run_dir,
            case_count: 0,
        })
    }

    /// Save a failure screenshot for the named case.
    ///
    /// Filename format: `case_NNN_<slug>.png`
    pub async fn save_screenshot(
        &mut self,
        case_name: &str,
        screenshot: &Screenshot,
    ) -> Result<PathBuf> {
        self.case_count += 1;
        let filename = format!("case_{:03}_{}.png", self.case_count, slug(case_name));
        let file_path = self.run_dir.join(&filename);

        fs::write(&file_path, &screenshot.png_bytes)
            .await
            .map_err(HarnessError::Io)?;
        debug!(
            "saved failure screenshot: {} ({} bytes)",
            file_path.display(),
            screenshot.png_bytes.len()
        );

        Ok(file_path)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn case_count(&self) -> usize {
        self.case_count
    }
}

/// Filesystem-safe form of a case name
fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn screenshot() -> Screenshot {
        Screenshot {
            png_bytes: vec![0x89, 0x50, 0x4E, 0x47],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_slug_is_filesystem_safe() {
        assert_eq!(slug("landing screen renders"), "landing-screen-renders");
        assert_eq!(slug("Wait/Retry #2"), "wait-retry--2");
    }

    #[tokio::test]
    async fn test_saver_creates_run_directory() {
        let temp_dir = tempdir().unwrap();
        let saver = ArtifactSaver::new(temp_dir.path()).await.unwrap();

        assert!(saver.run_dir().exists());
        assert_eq!(saver.base_dir(), temp_dir.path());
        assert_eq!(saver.case_count(), 0);
    }

    #[tokio::test]
    async fn test_save_screenshot_numbers_files() {
        let temp_dir = tempdir().unwrap();
        let mut saver = ArtifactSaver::new(temp_dir.path()).await.unwrap();

        let first = saver
            .save_screenshot("landing screen renders", &screenshot())
            .await
            .unwrap();
        let second = saver
            .save_screenshot("absent label times out", &screenshot())
            .await
            .unwrap();

        assert!(first.exists());
        assert!(second.exists());
        assert!(first
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("case_001_landing"));
        assert!(second
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("case_002_absent"));
        assert_eq!(saver.case_count(), 2);
    }
}
