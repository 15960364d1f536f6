//! Per-tab serialization of captures.
//!
//! Two captures of the same tab would share one debugging target and
//! interleave their scrolls and prints, so they run one after the other.
//! Captures of different tabs do not block each other.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::identifiers::TabId;

/// Map of per-tab async locks.
#[derive(Debug, Default)]
pub struct TabLocks {
    locks: Mutex<FxHashMap<TabId, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one capture.
pub type TabPermit = OwnedMutexGuard<()>;

impl TabLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other capture holds `tab`.
    pub async fn acquire(&self, tab: &TabId) -> TabPermit {
        let lock = {
            let mut locks = self.locks.lock();
            // Entries only the map references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(tab.clone()).or_default())
        };

        if lock.try_lock().is_err() {
            debug!(tab_id = %tab, "Capture already running for tab; queued");
        }

        lock.lock_owned().await
    }

    /// Returns the number of tabs with a capture running or queued.
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn tab(id: &str) -> TabId {
        TabId::new(id).expect("valid tab id")
    }

    #[tokio::test]
    async fn test_same_tab_is_exclusive() {
        let locks = TabLocks::new();
        let permit = locks.acquire(&tab("T1")).await;

        let second =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(&tab("T1"))).await;
        assert!(second.is_err());

        drop(permit);
        let third =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(&tab("T1"))).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_tabs_run_together() {
        let locks = TabLocks::new();
        let _a = locks.acquire(&tab("T1")).await;
        let _b = locks.acquire(&tab("T2")).await;

        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = TabLocks::new();
        drop(locks.acquire(&tab("T1")).await);
        drop(locks.acquire(&tab("T2")).await);

        let _c = locks.acquire(&tab("T3")).await;
        assert_eq!(locks.active(), 1);
        assert_eq!(locks.locks.lock().len(), 1);
    }
}
