//! Command definitions organized by CDP domain.
//!
//! Commands follow the DevTools `Domain.methodName` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Browser` | Version |
//! | `Target` | Attach, detach, target info |
//! | `Runtime` | JavaScript evaluation |
//! | `Page` | Print to PDF |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::{SessionId, TabId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Browser domain commands.
    Browser(BrowserCommand),
    /// Target domain commands.
    Target(TargetCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// Page domain commands.
    Page(PageCommand),
}

impl Command {
    /// Returns the `Domain.methodName` of this command.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Browser(BrowserCommand::GetVersion) => "Browser.getVersion",
            Self::Target(TargetCommand::AttachToTarget { .. }) => "Target.attachToTarget",
            Self::Target(TargetCommand::DetachFromTarget { .. }) => "Target.detachFromTarget",
            Self::Target(TargetCommand::GetTargetInfo { .. }) => "Target.getTargetInfo",
            Self::Target(TargetCommand::GetTargets) => "Target.getTargets",
            Self::Runtime(RuntimeCommand::Evaluate { .. }) => "Runtime.evaluate",
            Self::Page(PageCommand::PrintToPdf(_)) => "Page.printToPDF",
        }
    }
}

// ============================================================================
// Browser Commands
// ============================================================================

/// Browser domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowserCommand {
    /// Get browser product and protocol version.
    #[serde(rename = "Browser.getVersion")]
    GetVersion,
}

// ============================================================================
// Target Commands
// ============================================================================

/// Target domain commands for session management.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum TargetCommand {
    /// Attach a flat debugging session to a target.
    #[serde(rename = "Target.attachToTarget")]
    AttachToTarget {
        /// Target to attach to.
        #[serde(rename = "targetId")]
        target_id: TabId,
        /// Multiplex the session over the browser connection.
        flatten: bool,
    },

    /// Detach a debugging session.
    #[serde(rename = "Target.detachFromTarget")]
    DetachFromTarget {
        /// Session to release.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },

    /// Get information about one target.
    #[serde(rename = "Target.getTargetInfo")]
    GetTargetInfo {
        /// Target to describe.
        #[serde(rename = "targetId")]
        target_id: TabId,
    },

    /// List all targets.
    #[serde(rename = "Target.getTargets")]
    GetTargets,
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Evaluate an expression in the page's main world.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// JavaScript expression.
        expression: String,
        /// Return the result as JSON instead of a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
        /// Await the result if it is a promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
    },
}

impl RuntimeCommand {
    /// Creates an evaluate command returning its value by JSON.
    #[must_use]
    pub fn evaluate(expression: impl Into<String>) -> Self {
        Self::Evaluate {
            expression: expression.into(),
            return_by_value: true,
            await_promise: true,
        }
    }
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Print the page to a PDF document.
    #[serde(rename = "Page.printToPDF")]
    PrintToPdf(PrintOptions),
}

/// Page setup for `Page.printToPDF`.
///
/// All dimensions are in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    /// Print background graphics.
    pub print_background: bool,
    /// Paper width.
    pub paper_width: f64,
    /// Paper height.
    pub paper_height: f64,
    /// Landscape orientation.
    pub landscape: bool,
    /// Top margin.
    pub margin_top: f64,
    /// Bottom margin.
    pub margin_bottom: f64,
    /// Left margin.
    pub margin_left: f64,
    /// Right margin.
    pub margin_right: f64,
}

// ============================================================================
// Tests
// ============================================================================
