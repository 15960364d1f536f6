//! Error types for fullpage-pdf.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use fullpage_pdf::{Result, TabId};
//!
//! async fn example(capturer: &Capturer<ChromeHost>) -> Result<()> {
//!     let tab = TabId::new("8D2F1C0A")?;
//!     let saved = capturer.capture(&tab).await?;
//!     println!("{}", saved.filename);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidTab`] |
//! | Capability | [`Error::Capability`], [`Error::UnsupportedProtocolVersion`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::ScriptError`], [`Error::RequestTimeout`] |
//! | Workflow | [`Error::Internal`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`], [`Error::Url`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Stage
// ============================================================================

/// Workflow stage a host-capability failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Scroll injection.
    Scroll,
    /// Waiting for lazy content.
    Wait,
    /// Page height query.
    MeasureHeight,
    /// Debugging session attach.
    Attach,
    /// Print-to-PDF command.
    Print,
    /// Tab info lookup.
    TabLookup,
    /// Saving the document.
    Download,
}

impl Stage {
    /// Returns a short lowercase label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Wait => "wait",
            Self::MeasureHeight => "measure height",
            Self::Attach => "attach",
            Self::Print => "print",
            Self::TabLookup => "tab lookup",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when capture options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Tab identifier is missing or malformed.
    #[error("Invalid tab id: {message}")]
    InvalidTab {
        /// Why the identifier was rejected.
        message: String,
    },

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// A host capability reported a failure.
    ///
    /// `message` is the host's own message and is what the user sees.
    #[error("{stage} failed: {message}")]
    Capability {
        /// Stage that failed.
        stage: Stage,
        /// Host-reported failure message.
        message: String,
    },

    /// Requested debugging protocol version is not supported by the browser.
    #[error("Unsupported protocol version {requested} (browser speaks {supported})")]
    UnsupportedProtocolVersion {
        /// Version requested by the caller.
        requested: String,
        /// Version reported by the browser.
        supported: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the DevTools endpoint cannot be reached.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Error reported by the DevTools endpoint, or a malformed message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// CDP error code, if the browser sent one.
        code: Option<i64>,
        /// Description of the protocol error.
        message: String,
    },

    /// JavaScript evaluation threw in the page.
    #[error("Script error: {message}")]
    ScriptError {
        /// Exception text from the page.
        message: String,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Workflow Errors
    // ========================================================================
    /// Unexpected failure inside the workflow (e.g. a panic).
    #[error("Unexpected error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid tab error.
    #[inline]
    pub fn invalid_tab(message: impl Into<String>) -> Self {
        Self::InvalidTab {
            message: message.into(),
        }
    }

    /// Creates a host-capability failure for `stage`.
    #[inline]
    pub fn capability(stage: Stage, message: impl Into<String>) -> Self {
        Self::Capability {
            stage,
            message: message.into(),
        }
    }

    /// Creates an unsupported protocol version error.
    #[inline]
    pub fn unsupported_protocol_version(
        requested: impl Into<String>,
        supported: impl Into<String>,
    ) -> Self {
        Self::UnsupportedProtocolVersion {
            requested: requested.into(),
            supported: supported.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error without a CDP error code.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            code: None,
            message: message.into(),
        }
    }

    /// Creates a protocol error carrying the browser's error code.
    #[inline]
    pub fn protocol_code(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Accessors
// ============================================================================

impl Error {
    /// Returns the workflow stage for capability failures.
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Capability { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the message to show the user.
    ///
    /// Capability failures show the host's message verbatim; everything
    /// else uses the full display string.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Capability { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Wraps any error that is not already a capability failure as one
    /// belonging to `stage`.
    #[must_use]
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Self::Capability { .. } => self,
            other => Self::capability(stage, other.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_capability_display_and_user_message() {
        let err = Error::capability(Stage::Print, "Printing failed");
        assert_eq!(err.to_string(), "print failed: Printing failed");
        assert_eq!(err.user_message(), "Printing failed");
        assert_eq!(err.stage(), Some(Stage::Print));
    }

    #[test]
    fn test_user_message_for_other_errors() {
        let err = Error::internal("boom");
        assert_eq!(err.user_message(), "Unexpected error: boom");
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_at_stage_wraps_once() {
        let err = Error::ConnectionClosed.at_stage(Stage::MeasureHeight);
        assert_eq!(err.stage(), Some(Stage::MeasureHeight));
        assert_eq!(err.user_message(), "Connection closed");

        let again = err.at_stage(Stage::Download);
        assert_eq!(again.stage(), Some(Stage::MeasureHeight));
    }

    #[test]
    fn test_protocol_code() {
        let err = Error::protocol_code(-32000, "No target with given id found");
        assert!(matches!(err, Error::Protocol { code: Some(-32000), .. }));
        assert_eq!(
            err.to_string(),
            "Protocol error: No target with given id found"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
