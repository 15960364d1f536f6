//! Type-safe identifiers.
//!
//! Newtype wrappers keep tab, session, request and download IDs from being
//! mixed up at compile time.
//!
//! | Type | Wraps | Source |
//! |------|-------|--------|
//! | [`TabId`] | `String` | CDP target id |
//! | [`SessionId`] | `String` | CDP flat session id |
//! | [`RequestId`] | `u64` | Local counter for request/response correlation |
//! | [`DownloadId`] | `u64` | Local counter for saved files |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// TabId
// ============================================================================

/// Identifier of one open page (a CDP target id).
///
/// Deserializing goes through [`TabId::new`], so blank ids are rejected there
/// too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TabId(String);

impl TabId {
    /// Creates a tab ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTab`] if the id is empty or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::invalid_tab("tab id is empty"));
        }

        if id.chars().any(char::is_whitespace) {
            return Err(Error::invalid_tab(format!(
                "tab id contains whitespace: {id:?}"
            )));
        }

        Ok(Self(id))
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TabId {
    type Error = Error;

    fn try_from(id: String) -> Result<Self> {
        Self::new(id)
    }
}

impl From<TabId> for String {
    #[inline]
    fn from(tab: TabId) -> Self {
        tab.0
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Identifier of an attached debugging session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a session id returned by the browser.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// RequestId
// ============================================================================

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Correlation id of a CDP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Generates a process-unique id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// DownloadId
// ============================================================================

/// Handle of a completed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(u64);

impl DownloadId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_valid() {
        let tab = TabId::new("8D2F1C0A9B").expect("valid tab id");
        assert_eq!(tab.as_str(), "8D2F1C0A9B");
        assert_eq!(tab.to_string(), "8D2F1C0A9B");
    }

    #[test]
    fn test_tab_id_rejects_empty() {
        let err = TabId::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidTab { .. }));
    }

    #[test]
    fn test_tab_id_rejects_whitespace() {
        assert!(TabId::new("abc def").is_err());
        assert!(TabId::new(" ").is_err());
    }

    #[test]
    fn test_request_id_generate_is_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_ids_serialize_transparent() {
        let json = serde_json::to_string(&RequestId::new(42)).expect("serialize");
        assert_eq!(json, "42");

        let json = serde_json::to_string(&SessionId::new("S1")).expect("serialize");
        assert_eq!(json, "\"S1\"");

        let json = serde_json::to_string(&TabId::new("T1").expect("valid")).expect("serialize");
        assert_eq!(json, "\"T1\"");
    }

    #[test]
    fn test_tab_id_deserialize_validates() {
        let tab: TabId = serde_json::from_str("\"T1\"").expect("valid tab id");
        assert_eq!(tab.as_str(), "T1");

        for raw in ["\"\"", "\"  \"", "\"a b\""] {
            let result = serde_json::from_str::<TabId>(raw);
            assert!(result.is_err(), "accepted {raw}");
        }
    }
}
