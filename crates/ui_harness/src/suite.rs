//! Sequential test-case runner
//!
//! Cases run strictly in order against one session: launch once, then
//! reset before every case. A launch failure aborts the run; a reset or
//! case failure is recorded and the remaining cases still run.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::artifacts::ArtifactSaver;
use crate::error::Result;
use crate::session::DeviceSession;

/// Body of a test case; runs against an established session
pub type CaseFn = for<'a> fn(&'a DeviceSession) -> BoxFuture<'a, Result<()>>;

/// A named test case
#[derive(Clone)]
pub struct TestCase {
    pub name: &'static str,
    pub run: CaseFn,
}

/// Outcome of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed { error: String },
    /// The pre-case reset failed; the body never ran
    ResetFailed { error: String },
}

impl CaseStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Report for one executed case
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    #[serde(flatten)]
    pub status: CaseStatus,
    pub elapsed_ms: u64,
}

/// Report for a whole suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub package: String,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.status.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Run `cases` in order against a freshly launched session.
///
/// The launch happens once, up front; its failure is fatal and propagates.
/// Each case is preceded by a full app reset. On any non-pass outcome a
/// failure screenshot is captured when an [`ArtifactSaver`] is provided;
/// artifact problems are logged, never escalated.
pub async fn run_suite(
    session: &mut DeviceSession,
    cases: &[TestCase],
    mut artifacts: Option<ArtifactSaver>,
) -> Result<SuiteReport> {
    let started_at = Utc::now();
    session.launch().await?;

    let mut reports = Vec::with_capacity(cases.len());
    for case in cases {
        info!("case: {}", case.name);
        let case_start = Instant::now();

        let status = match session.reset().await {
            Err(e) => {
                warn!("reset before {:?} failed: {}", case.name, e);
                CaseStatus::ResetFailed {
                    error: e.to_string(),
                }
            }
            Ok(()) => match (case.run)(session).await {
                Ok(()) => CaseStatus::Passed,
                Err(e) => CaseStatus::Failed {
                    error: e.to_string(),
                },
            },
        };

        let elapsed_ms = case_start.elapsed().as_millis() as u64;
        if !status.is_pass() {
            capture_failure_artifact(session, &mut artifacts, case.name).await;
        }
        reports.push(CaseReport {
            name: case.name.to_string(),
            status,
            elapsed_ms,
        });
    }

    Ok(SuiteReport {
        started_at,
        package: session.config().package.clone(),
        cases: reports,
    })
}

async fn capture_failure_artifact(
    session: &DeviceSession,
    artifacts: &mut Option<ArtifactSaver>,
    case_name: &str,
) {
    let Some(saver) = artifacts.as_mut() else {
        return;
    };
    match session.screenshot().await {
        Ok(screenshot) => match saver.save_screenshot(case_name, &screenshot).await {
            Ok(path) => info!("failure screenshot: {}", path.display()),
            Err(e) => warn!("could not save failure screenshot: {}", e),
        },
        Err(e) => warn!("could not capture failure screenshot: {}", e),
    }
}
