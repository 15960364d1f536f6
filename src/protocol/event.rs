//! Event message types.
//!
//! Events are notifications the browser pushes without a request id.
//! Only the target lifecycle events matter here; everything else is
//! surfaced as [`ParsedEvent::Other`].

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::SessionId;

// ============================================================================
// Event
// ============================================================================

/// An event notification from the browser.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... },
///   "sessionId": "optional"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,

    /// Session the event was emitted on.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

impl Event {
    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        let string_param = |key: &str| {
            self.params
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match self.method.as_str() {
            "Target.detachedFromTarget" => ParsedEvent::DetachedFromTarget {
                session_id: SessionId::new(string_param("sessionId")),
                target_id: string_param("targetId"),
            },
            "Target.targetDestroyed" => ParsedEvent::TargetDestroyed {
                target_id: string_param("targetId"),
            },
            "Target.targetCrashed" => ParsedEvent::TargetCrashed {
                target_id: string_param("targetId"),
            },
            _ => ParsedEvent::Other {
                method: self.method.clone(),
            },
        }
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed view over the events this crate reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// A session was detached (by us, by the user, or by the page closing).
    DetachedFromTarget {
        /// Detached session.
        session_id: SessionId,
        /// Target it was attached to.
        target_id: String,
    },
    /// A target was closed.
    TargetDestroyed {
        /// Destroyed target.
        target_id: String,
    },
    /// A target's renderer crashed.
    TargetCrashed {
        /// Crashed target.
        target_id: String,
    },
    /// Any other event.
    Other {
        /// Event method.
        method: String,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> Event {
        serde_json::from_str(json).expect("parse")
    }

    #[test]
    fn test_parse_detached() {
        let e = event(
            r#"{"method": "Target.detachedFromTarget",
                "params": {"sessionId": "S1", "targetId": "T1"}}"#,
        );
        assert_eq!(
            e.parse(),
            ParsedEvent::DetachedFromTarget {
                session_id: SessionId::new("S1"),
                target_id: "T1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_destroyed() {
        let e = event(r#"{"method": "Target.targetDestroyed", "params": {"targetId": "T9"}}"#);
        assert_eq!(
            e.parse(),
            ParsedEvent::TargetDestroyed {
                target_id: "T9".to_string()
            }
        );
    }

    #[test]
    fn test_parse_other_without_params() {
        let e = event(r#"{"method": "Inspector.detached", "sessionId": "S2"}"#);
        assert_eq!(e.session_id, Some(SessionId::new("S2")));
        assert!(matches!(e.parse(), ParsedEvent::Other { .. }));
    }
}
