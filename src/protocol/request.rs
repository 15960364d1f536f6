//! Request and Response message types.
//!
//! Defines the CDP message format for command requests and responses
//! exchanged over the browser WebSocket.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, SessionId};

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from the client to the browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 7,
///   "method": "Domain.methodName",
///   "params": { ... },
///   "sessionId": "optional flat session id"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Session the command is routed to (browser target if absent).
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a browser-level request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            session_id: None,
            command,
        }
    }

    /// Creates a request routed to a session.
    #[inline]
    #[must_use]
    pub fn for_session(session_id: SessionId, command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            session_id: Some(session_id),
            command,
        }
    }

    /// Returns the method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.command.method()
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from the browser.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 7, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 7, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error payload (if error).
    #[serde(default)]
    pub error: Option<ResponseError>,

    /// Session the response belongs to.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

/// Error payload of a failed command.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    /// CDP error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional extra detail.
    #[serde(default)]
    pub data: Option<String>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] with the browser's code and message.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            None => Ok(self.result.unwrap_or(Value::Null)),
            Some(error) => {
                let message = match error.data {
                    Some(data) if !data.is_empty() => format!("{} ({})", error.message, data),
                    _ => error.message,
                };
                Err(Error::protocol_code(error.code, message))
            }
        }
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::TabId;
    use crate::protocol::{RuntimeCommand, TargetCommand};

    #[test]
    fn test_request_serialization() {
        let command = Command::Target(TargetCommand::GetTargetInfo {
            target_id: TabId::new("T1").expect("valid tab id"),
        });

        let request = Request::new(command);
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["id"], request.id.as_u64());
        assert_eq!(json["method"], "Target.getTargetInfo");
        assert_eq!(json["params"]["targetId"], "T1");
        assert!(json.get("sessionId").is_none());
    }

    #[test]
    fn test_session_request_serialization() {
        let command = Command::Runtime(RuntimeCommand::evaluate("document.title"));
        let request = Request::for_session(SessionId::new("S1"), command);
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["sessionId"], "S1");
        assert_eq!(request.method(), "Runtime.evaluate");
    }

    #[test]
    fn test_success_response() {
        let json_str = r#"{"id": 3, "result": {"sessionId": "ABC"}}"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_success());
        assert!(!response.is_error());
        assert_eq!(response.get_string("sessionId"), "ABC");
        assert_eq!(response.get_string("missing"), "");
    }

    #[test]
    fn test_error_response() {
        let json_str = r#"{
            "id": 4,
            "error": {"code": -32000, "message": "No target with given id found"}
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_error());

        let err = response.into_result().unwrap_err();
        assert!(matches!(err, Error::Protocol { code: Some(-32000), .. }));
        assert!(err.to_string().contains("No target with given id found"));
    }

    #[test]
    fn test_error_response_with_data() {
        let json_str = r#"{
            "id": 5,
            "error": {"code": -32602, "message": "Invalid parameters", "data": "paperHeight"}
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        let err = response.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Protocol error: Invalid parameters (paperHeight)"
        );
    }

    #[test]
    fn test_into_result_empty_success() {
        let response: Response = serde_json::from_str(r#"{"id": 6, "result": {}}"#).expect("parse");
        let value = response.into_result().expect("should succeed");
        assert!(value.as_object().is_some_and(|o| o.is_empty()));
    }

    #[test]
    fn test_event_is_not_a_response() {
        let json_str = r#"{"method": "Target.targetDestroyed", "params": {"targetId": "T1"}}"#;
        assert!(serde_json::from_str::<Response>(json_str).is_err());
    }
}
