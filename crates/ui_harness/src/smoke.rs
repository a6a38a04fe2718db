//! Smoke suite for the Playground example app
//!
//! The landing screen shows the app title and the example list in one
//! rendered frame, so the title is waited on and the "Astro Bird" entry
//! is then asserted without a second wait.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{HarnessError, Result};
use crate::locator::Locator;
use crate::session::DeviceSession;
use crate::suite::TestCase;

/// Application id of the Playground example app
pub const PLAYGROUND_PACKAGE: &str = "dev.pytorch.playground";

/// How long the landing screen may take to render after a cold start
pub const LANDING_TIMEOUT_MS: u64 = 5_000;

/// Bound for the negative probe; a handful of polls is enough
const ABSENT_TIMEOUT_MS: u64 = 500;

fn landing_screen_renders(session: &DeviceSession) -> BoxFuture<'_, Result<()>> {
    async move {
        session
            .wait_visible(&Locator::text("Playground"), LANDING_TIMEOUT_MS)
            .await?;
        session.assert_visible_now(&Locator::text("Astro Bird")).await
    }
    .boxed()
}

fn absent_label_times_out(session: &DeviceSession) -> BoxFuture<'_, Result<()>> {
    async move {
        match session
            .wait_visible(&Locator::text("NonexistentLabel"), ABSENT_TIMEOUT_MS)
            .await
        {
            Err(HarnessError::WaitTimeout { elapsed_ms, .. })
                if elapsed_ms >= ABSENT_TIMEOUT_MS =>
            {
                Ok(())
            }
            Err(HarnessError::WaitTimeout { elapsed_ms, .. }) => {
                Err(HarnessError::CommandFailed(format!(
                    "timeout reported after only {}ms",
                    elapsed_ms
                )))
            }
            Err(e) => Err(e),
            Ok(elapsed) => Err(HarnessError::CommandFailed(format!(
                "label unexpectedly visible after {:?}",
                elapsed
            ))),
        }
    }
    .boxed()
}

/// The fixed smoke suite run by the CLI.
///
/// The runner resets the app before every case, so the final case
/// re-checks the landing screen against a reloaded app.
pub fn smoke_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "landing screen renders",
            run: landing_screen_renders,
        },
        TestCase {
            name: "absent label times out",
            run: absent_label_times_out,
        },
        TestCase {
            name: "landing screen renders after reload",
            run: landing_screen_renders,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke_suite_shape() {
        let cases = smoke_cases();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].name, "landing screen renders");
        assert_eq!(cases[1].name, "absent label times out");
        assert_eq!(cases[2].name, "landing screen renders after reload");
    }
}
