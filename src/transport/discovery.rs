//! DevTools endpoint discovery.
//!
//! Chrome started with `--remote-debugging-port=9222` publishes its browser
//! WebSocket URL at `http://127.0.0.1:9222/json/version`. A `ws://` or
//! `wss://` endpoint is used as-is.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// BrowserVersion
// ============================================================================

/// Response of the `/json/version` endpoint.
///
/// Chrome returns PascalCase field names here.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    /// Browser product, e.g. `Chrome/131.0.6778.85`.
    #[serde(rename = "Browser")]
    pub browser: String,
    /// DevTools protocol version, e.g. `1.3`.
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    /// Browser-level WebSocket URL.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

// ============================================================================
// Discovery
// ============================================================================

/// Resolves a user-supplied endpoint to a browser WebSocket URL.
///
/// # Errors
///
/// - [`Error::Url`] if the endpoint is not a URL
/// - [`Error::Config`] if the scheme is not http(s) or ws(s)
/// - [`Error::Http`] if `/json/version` cannot be fetched or parsed
pub async fn resolve_ws_url(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)?;

    match url.scheme() {
        "ws" | "wss" => Ok(url.to_string()),
        "http" | "https" => {
            let version = fetch_version(&url).await?;
            debug!(
                browser = %version.browser,
                protocol = %version.protocol_version,
                "Discovered DevTools endpoint"
            );
            Ok(version.web_socket_debugger_url)
        }
        other => Err(Error::config(format!(
            "Unsupported endpoint scheme {other:?}; use http://host:port or ws://..."
        ))),
    }
}

/// Fetches `/json/version` from an HTTP DevTools endpoint.
async fn fetch_version(base: &Url) -> Result<BrowserVersion> {
    let version_url = version_url(base)?;
    debug!(url = %version_url, "Fetching browser version");

    let version = reqwest::get(version_url)
        .await?
        .error_for_status()?
        .json::<BrowserVersion>()
        .await?;

    Ok(version)
}

/// Builds the `/json/version` URL for a base endpoint.
fn version_url(base: &Url) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("json/version")?)
}

// ============================================================================
// Tests
// ============================================================================
