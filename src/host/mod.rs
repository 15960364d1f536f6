//! Host automation capabilities.
//!
//! The capture workflow never talks to the browser directly; it goes
//! through the [`Host`] trait, one method per capability. [`ChromeHost`]
//! implements it over the DevTools Protocol, tests implement it with fakes.
//!
//! # Capabilities
//!
//! | Capability | Method |
//! |------------|--------|
//! | Inject-and-run script | [`Host::execute_script`] |
//! | Page content height | [`Host::page_height`] |
//! | Attach debugging session | [`Host::attach`] |
//! | Print to PDF | [`Host::print_to_pdf`] |
//! | Detach debugging session | [`Host::detach`] |
//! | Save document | [`Host::download`] |
//! | Tab info lookup | [`Host::tab_url`] |
//! | User notification | [`Notifier::notify`] |

// ============================================================================
// Submodules
// ============================================================================

/// DevTools-backed host.
pub mod chrome;

/// User notifications.
pub mod notify;

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{DownloadId, SessionId, TabId};
use crate::protocol::PrintOptions;

// ============================================================================
// Re-exports
// ============================================================================

pub use chrome::{ChromeHost, TargetInfo};
pub use notify::{ConsoleNotifier, Notification, NotificationKind, Notifier, TracingNotifier};

// ============================================================================
// Download
// ============================================================================

/// A document saved by [`Host::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Host-assigned handle.
    pub id: DownloadId,
    /// Where the file ended up.
    pub path: PathBuf,
}

// ============================================================================
// Host
// ============================================================================

/// Browser capabilities the capture workflow depends on.
///
/// Every method reports failure through [`Result`]; the error message is
/// what the user eventually sees, so implementations should pass the
/// browser's own message through.
#[async_trait]
pub trait Host: Send + Sync {
    /// Runs `script` in the tab's page context and returns its value.
    async fn execute_script(&self, tab: &TabId, script: &str) -> Result<Value>;

    /// Returns the full content height of the page, in CSS pixels.
    async fn page_height(&self, tab: &TabId) -> Result<u64>;

    /// Attaches a debugging session speaking `protocol_version`.
    async fn attach(&self, tab: &TabId, protocol_version: &str) -> Result<SessionId>;

    /// Prints the attached page and returns base64-encoded PDF bytes.
    async fn print_to_pdf(&self, session: &SessionId, options: &PrintOptions) -> Result<String>;

    /// Releases a session returned by [`Host::attach`].
    async fn detach(&self, session: &SessionId) -> Result<()>;

    /// Saves base64 `data` under `filename`.
    ///
    /// `save_as` asks the host to prompt the user for a location.
    async fn download(&self, data: &str, filename: &str, save_as: bool) -> Result<Download>;

    /// Returns the tab's current URL.
    async fn tab_url(&self, tab: &TabId) -> Result<String>;
}
