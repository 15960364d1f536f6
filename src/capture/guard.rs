//! Scoped debugging session.
//!
//! A [`SessionGuard`] detaches its session exactly once: either through
//! [`SessionGuard::release`] or, if the guard is dropped without it
//! (panic, cancelled future), through a detach spawned on the runtime.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::{Result, Stage};
use crate::host::Host;
use crate::identifiers::{SessionId, TabId};

/// An attached session that is released when the guard goes away.
pub struct SessionGuard<H: Host + ?Sized + 'static> {
    host: Arc<H>,
    tab: TabId,
    session: SessionId,
    released: bool,
}

impl<H: Host + ?Sized + 'static> SessionGuard<H> {
    /// Attaches a session to `tab`.
    ///
    /// # Errors
    ///
    /// Attach failures are reported as [`Stage::Attach`] capability failures.
    pub async fn attach(host: Arc<H>, tab: &TabId, protocol_version: &str) -> Result<Self> {
        let session = host
            .attach(tab, protocol_version)
            .await
            .map_err(|e| e.at_stage(Stage::Attach))?;

        debug!(tab_id = %tab, %session, "Session acquired");

        Ok(Self {
            host,
            tab: tab.clone(),
            session,
            released: false,
        })
    }

    /// Returns the session id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.session
    }

    /// Detaches the session.
    ///
    /// A failed detach is logged; it does not change the capture outcome.
    pub async fn release(mut self) {
        self.released = true;

        match self.host.detach(&self.session).await {
            Ok(()) => debug!(tab_id = %self.tab, session = %self.session, "Session released"),
            Err(e) => warn!(
                tab_id = %self.tab,
                session = %self.session,
                error = %e,
                "Failed to detach session"
            ),
        }
    }
}

impl<H: Host + ?Sized + 'static> Drop for SessionGuard<H> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let Ok(handle) = Handle::try_current() else {
            warn!(session = %self.session, "No runtime to detach session on");
            return;
        };

        let host = Arc::clone(&self.host);
        let session = self.session.clone();
        let tab = self.tab.clone();

        debug!(tab_id = %tab, %session, "Releasing session from drop");
        handle.spawn(async move {
            if let Err(e) = host.detach(&session).await {
                warn!(tab_id = %tab, %session, error = %e, "Failed to detach session");
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
