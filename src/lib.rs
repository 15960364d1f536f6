//! Fullpage PDF - Save a whole web page as one tall PDF sheet.
//!
//! Given a browser tab, the crate scrolls it to the bottom, waits for lazy
//! content, measures the page, and prints it onto a single sheet two A4
//! widths wide and exactly as tall as the content. The file is named after
//! the page's host, path and the current date.
//!
//! # Architecture
//!
//! - **Capture (Rust)**: the [`Capturer`] workflow, pure geometry and
//!   filename logic, per-tab locking
//! - **Host (trait)**: the browser capabilities the workflow needs
//! - **Chrome (DevTools Protocol)**: [`ChromeHost`], one WebSocket with flat
//!   sessions per attached tab
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fullpage_pdf::{CaptureOptions, Capturer, ChromeHost, ConsoleNotifier, Result, TabId};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Chrome started with --remote-debugging-port=9222
//!     let host = Arc::new(ChromeHost::connect("http://127.0.0.1:9222", "./pdfs").await?);
//!     let tab = TabId::new(host.page_targets().await?[0].target_id.clone())?;
//!
//!     let capturer = Capturer::new(host, Arc::new(ConsoleNotifier), CaptureOptions::default());
//!     let saved = capturer.capture(&tab).await?;
//!     println!("Saved to {}", saved.path.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capture`] | Workflow, options, geometry, filenames |
//! | [`host`] | [`Host`] trait, [`ChromeHost`], notifiers |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | DevTools message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Full-page capture workflow.
///
/// - [`Capturer`] - Runs captures and notifies the outcome
/// - [`CaptureOptions`] - Wait policy, DPI, paper width, filename limit
pub mod capture;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Browser capabilities and notifications.
pub mod host;

/// Type-safe identifiers for browser entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// DevTools protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// WebSocket transport layer.
///
/// Internal module handling endpoint discovery and the browser connection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Capture types
pub use capture::{
    CaptureOptions, CaptureOptionsBuilder, Capturer, PageGeometry, SavedPdf, SessionGuard,
    WaitPolicy, derive_filename,
};

// Host types
pub use host::{
    ChromeHost, ConsoleNotifier, Download, Host, Notification, NotificationKind, Notifier,
    TargetInfo, TracingNotifier,
};

// Error types
pub use error::{Error, Result, Stage};

// Identifier types
pub use identifiers::{DownloadId, RequestId, SessionId, TabId};
