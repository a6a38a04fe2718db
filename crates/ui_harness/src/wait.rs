//! Visibility wait engine
//!
//! Polls a UI snapshot until a target node becomes visible or a deadline
//! passes. The poll loop is an explicit state machine driven through an
//! injectable [`Clock`], so the timeout/success race is testable without
//! wall-clock waits.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::TIMING_CONFIG;
use crate::error::Result;

/// Point-in-time state of a located node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// No node matched the locator
    Missing,
    /// A node matched but occupies no on-screen area
    Hidden,
    /// A node matched and is rendered on screen
    Visible,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Missing => "missing",
            Self::Hidden => "hidden",
            Self::Visible => "visible",
        };
        write!(f, "{}", name)
    }
}

/// Options for a single wait operation
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: TIMING_CONFIG.wait.default_timeout_ms,
            poll_interval_ms: TIMING_CONFIG.wait.poll_interval_ms,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval in milliseconds
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Time source for wait loops.
///
/// Production code uses [`TokioClock`]; tests swap in [`FakeClock`] to run
/// timeout scenarios without real sleeps.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Suspend the caller for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by tokio timers
#[derive(Debug)]
pub struct TokioClock {
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock for tests; `sleep` advances time instead of waiting
#[derive(Debug, Default)]
pub struct FakeClock {
    now_ms: AtomicU64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without sleeping
    pub fn advance(&self, duration: Duration) {
        self.now_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Wait state machine. Polling is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Polling,
    Succeeded,
    TimedOut,
}

/// Terminal result of a wait operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitVerdict {
    /// The node became visible after `elapsed`
    Succeeded { elapsed: Duration },
    /// The deadline passed; `last_state` is what the final poll observed
    TimedOut {
        elapsed: Duration,
        last_state: NodeState,
    },
}

impl WaitVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Succeeded { elapsed } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// Poll `probe` until it reports a visible node or `options.timeout()`
/// elapses.
///
/// The first probe runs before any sleep, so an already-visible node
/// succeeds immediately. One final probe is always taken once the deadline
/// passes, which bounds the total wait to the timeout plus at most one
/// poll interval. A probe that reports the node missing or hidden is
/// retried; probe transport errors propagate. Each poll consults a fresh
/// probe result, so a success can only come from the current UI state.
///
/// Dropping the returned future abandons the wait; probes are read-only,
/// so no cleanup is required.
pub async fn poll_until_visible<F, Fut>(
    clock: &dyn Clock,
    options: &WaitOptions,
    mut probe: F,
) -> Result<WaitVerdict>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<NodeState>>,
{
    let start = clock.now();
    let mut state = PollState::Polling;
    let mut last_state = NodeState::Missing;

    loop {
        match state {
            PollState::Polling => {
                last_state = probe().await?;
                if last_state == NodeState::Visible {
                    state = PollState::Succeeded;
                } else if clock.now() - start >= options.timeout() {
                    state = PollState::TimedOut;
                } else {
                    clock.sleep(options.poll_interval()).await;
                }
            }
            PollState::Succeeded => {
                return Ok(WaitVerdict::Succeeded {
                    elapsed: clock.now() - start,
                });
            }
            PollState::TimedOut => {
                return Ok(WaitVerdict::TimedOut {
                    elapsed: clock.now() - start,
                    last_state,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use std::cell::Cell;

    fn options(timeout_ms: u64, poll_interval_ms: u64) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout_ms)
            .with_poll_interval(poll_interval_ms)
    }

    #[test]
    fn test_wait_options_defaults_follow_timing_config() {
        let opts = WaitOptions::default();
        assert_eq!(opts.timeout_ms, TIMING_CONFIG.wait.default_timeout_ms);
        assert_eq!(opts.poll_interval_ms, TIMING_CONFIG.wait.poll_interval_ms);
    }

    #[test]
    fn test_wait_options_builder() {
        let opts = options(5_000, 50);
        assert_eq!(opts.timeout(), Duration::from_millis(5_000));
        assert_eq!(opts.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_fake_clock_advances_on_sleep() {
        let clock = FakeClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_already_visible_succeeds_without_sleeping() {
        let clock = FakeClock::new();
        let verdict = poll_until_visible(&clock, &options(5_000, 50), || async {
            Ok(NodeState::Visible)
        })
        .await
        .unwrap();

        assert_eq!(
            verdict,
            WaitVerdict::Succeeded {
                elapsed: Duration::ZERO
            }
        );
        // No poll interval was consumed
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_early_success_returns_at_detection_time() {
        let clock = FakeClock::new();
        let calls = Cell::new(0u32);
        // Visible on the third poll, i.e. after two 50ms intervals
        let verdict = poll_until_visible(&clock, &options(5_000, 50), || {
            let n = calls.get();
            calls.set(n + 1);
            async move {
                Ok(if n >= 2 {
                    NodeState::Visible
                } else {
                    NodeState::Missing
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(
            verdict,
            WaitVerdict::Succeeded {
                elapsed: Duration::from_millis(100)
            }
        );
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_never_reported_early() {
        let clock = FakeClock::new();
        let verdict = poll_until_visible(&clock, &options(500, 50), || async {
            Ok(NodeState::Missing)
        })
        .await
        .unwrap();

        match verdict {
            WaitVerdict::TimedOut { elapsed, .. } => {
                assert!(elapsed >= Duration::from_millis(500));
                // Bounded overrun: at most one poll interval past the deadline
                assert!(elapsed <= Duration::from_millis(550));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_final_poll_runs_at_the_deadline() {
        let clock = FakeClock::new();
        // Becomes visible exactly when the deadline is reached; the final
        // poll must still observe it rather than timing out blind.
        let verdict = poll_until_visible(&clock, &options(500, 50), || {
            let visible = clock.now() >= Duration::from_millis(500);
            async move {
                Ok(if visible {
                    NodeState::Visible
                } else {
                    NodeState::Missing
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(
            verdict,
            WaitVerdict::Succeeded {
                elapsed: Duration::from_millis(500)
            }
        );
    }

    #[tokio::test]
    async fn test_timeout_reports_last_observed_state() {
        let clock = FakeClock::new();
        let verdict = poll_until_visible(&clock, &options(200, 50), || async {
            Ok(NodeState::Hidden)
        })
        .await
        .unwrap();

        match verdict {
            WaitVerdict::TimedOut { last_state, .. } => {
                assert_eq!(last_state, NodeState::Hidden);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_absence_is_swallowed_and_retried() {
        let clock = FakeClock::new();
        let calls = Cell::new(0u32);
        let states = [
            NodeState::Missing,
            NodeState::Hidden,
            NodeState::Missing,
            NodeState::Visible,
        ];
        let verdict = poll_until_visible(&clock, &options(5_000, 50), || {
            let n = calls.get() as usize;
            calls.set(calls.get() + 1);
            let state = states[n.min(states.len() - 1)];
            async move { Ok(state) }
        })
        .await
        .unwrap();

        assert!(verdict.is_success());
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_probe_transport_error_propagates() {
        let clock = FakeClock::new();
        let result = poll_until_visible(&clock, &options(500, 50), || async {
            Err(HarnessError::CommandFailed("adb died".to_string()))
        })
        .await;

        assert!(matches!(result, Err(HarnessError::CommandFailed(_))));
    }

    #[tokio::test]
    async fn test_zero_timeout_still_polls_once() {
        let clock = FakeClock::new();
        let calls = Cell::new(0u32);
        let verdict = poll_until_visible(&clock, &options(0, 50), || {
            calls.set(calls.get() + 1);
            async { Ok(NodeState::Missing) }
        })
        .await
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(!verdict.is_success());
    }

    #[test]
    fn test_verdict_accessors() {
        let ok = WaitVerdict::Succeeded {
            elapsed: Duration::from_millis(120),
        };
        assert!(ok.is_success());
        assert_eq!(ok.elapsed(), Duration::from_millis(120));

        let timed_out = WaitVerdict::TimedOut {
            elapsed: Duration::from_millis(500),
            last_state: NodeState::Missing,
        };
        assert!(!timed_out.is_success());
        assert_eq!(timed_out.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn test_node_state_display() {
        assert_eq!(NodeState::Missing.to_string(), "missing");
        assert_eq!(NodeState::Hidden.to_string(), "hidden");
        assert_eq!(NodeState::Visible.to_string(), "visible");
    }
}
