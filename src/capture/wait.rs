//! Waiting for lazy content after the scroll.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::{Result, Stage};
use crate::host::Host;
use crate::identifiers::TabId;

// ============================================================================
// Constants
// ============================================================================

/// Default fixed delay between scrolling and measuring.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Script that scrolls the page to the bottom of its content.
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

// ============================================================================
// WaitPolicy
// ============================================================================

/// How long to let the page load after scrolling to the bottom.
///
/// Pages that keep loading past the wait are captured as they are at that
/// moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Measure immediately.
    None,
    /// Sleep for a fixed duration.
    Fixed(Duration),
    /// Poll the page height until it stops changing.
    ///
    /// Each time the height grows the page is scrolled to the new bottom.
    StableHeight {
        /// Delay between samples.
        interval: Duration,
        /// Consecutive unchanged samples required.
        stable_samples: u32,
        /// Give up waiting after this long.
        max_wait: Duration,
    },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_SETTLE_DELAY)
    }
}

impl WaitPolicy {
    /// Stable-height polling with sensible defaults: 500ms interval,
    /// 3 stable samples, at most 30s.
    #[must_use]
    pub fn stable_height() -> Self {
        Self::StableHeight {
            interval: Duration::from_millis(500),
            stable_samples: 3,
            max_wait: Duration::from_secs(30),
        }
    }

    /// Waits according to the policy.
    ///
    /// # Errors
    ///
    /// Host failures while polling are reported as [`Stage::Wait`]
    /// capability failures.
    pub async fn settle<H: Host + ?Sized>(&self, host: &H, tab: &TabId) -> Result<()> {
        match *self {
            Self::None => Ok(()),
            Self::Fixed(delay) => {
                debug!(
                    tab_id = %tab,
                    delay_ms = delay.as_millis() as u64,
                    "Waiting for page to settle"
                );
                sleep(delay).await;
                Ok(())
            }
            Self::StableHeight {
                interval,
                stable_samples,
                max_wait,
            } => poll_stable_height(host, tab, interval, stable_samples, max_wait)
                .await
                .map_err(|e| e.at_stage(Stage::Wait)),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn poll_stable_height<H: Host + ?Sized>(
    host: &H,
    tab: &TabId,
    interval: Duration,
    stable_samples: u32,
    max_wait: Duration,
) -> Result<()> {
    let deadline = Instant::now() + max_wait;
    let mut last = host.page_height(tab).await?;
    let mut stable = 0;

    while stable < stable_samples {
        let now = Instant::now();
        if now >= deadline {
            debug!(tab_id = %tab, height = last, "Page still growing; giving up waiting");
            return Ok(());
        }

        sleep(interval.min(deadline - now)).await;

        let height = host.page_height(tab).await?;
        if height == last {
            stable += 1;
        } else {
            debug!(tab_id = %tab, from = last, to = height, "Page height changed");
            stable = 0;
            last = height;
            host.execute_script(tab, SCROLL_TO_BOTTOM_SCRIPT).await?;
        }
    }

    debug!(tab_id = %tab, height = last, "Page height stable");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
