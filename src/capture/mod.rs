//! Full-page capture.
//!
//! [`Capturer`] drives one tab from scroll to saved PDF through a
//! [`Host`](crate::host::Host). The pure pieces (paper geometry, filename
//! derivation) live in their own modules so they can be tested without a
//! browser.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `workflow` | [`Capturer`] and the stage sequence |
//! | `options` | [`CaptureOptions`] and its builder |
//! | `wait` | [`WaitPolicy`] applied after scrolling |
//! | `geometry` | Paper size from page height |
//! | `filename` | URL + date to `.pdf` name |
//! | `guard` | [`SessionGuard`] for attached sessions |
//! | `locks` | Per-tab serialization |

// ============================================================================
// Submodules
// ============================================================================

/// Filename derivation.
pub mod filename;

/// Paper geometry.
pub mod geometry;

/// Scoped debugging session.
pub mod guard;

/// Per-tab locks.
pub mod locks;

/// Capture configuration.
pub mod options;

/// Post-scroll wait policies.
pub mod wait;

/// The capture workflow.
pub mod workflow;

// ============================================================================
// Re-exports
// ============================================================================

pub use filename::{DEFAULT_MAX_FILENAME_LEN, derive_filename};
pub use geometry::{DEFAULT_DPI, DEFAULT_PAPER_WIDTH_IN, PageGeometry};
pub use guard::SessionGuard;
pub use locks::{TabLocks, TabPermit};
pub use options::{CaptureOptions, CaptureOptionsBuilder, DEFAULT_PROTOCOL_VERSION};
pub use wait::{DEFAULT_SETTLE_DELAY, WaitPolicy};
pub use workflow::{Capturer, Clock, SavedPdf};
