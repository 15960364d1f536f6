//! DevTools-backed [`Host`].
//!
//! Every capability maps onto one or two CDP commands sent over a single
//! browser-level WebSocket with flat sessions.
//!
//! | Capability | CDP |
//! |------------|-----|
//! | `execute_script`, `page_height` | `Target.attachToTarget` → `Runtime.evaluate` → `Target.detachFromTarget` |
//! | `attach` / `detach` | `Target.attachToTarget` / `Target.detachFromTarget` |
//! | `print_to_pdf` | `Page.printToPDF` |
//! | `tab_url` | `Target.getTargetInfo` |
//! | `download` | written locally into the download directory |

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::Deserialize;
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, Stage};
use crate::identifiers::{DownloadId, SessionId, TabId};
use crate::protocol::{
    BrowserCommand, Command, PageCommand, PrintOptions, Request, RuntimeCommand, TargetCommand,
};
use crate::transport::{Connection, DEFAULT_COMMAND_TIMEOUT, resolve_ws_url};

use super::{Download, Host};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for `Page.printToPDF`; very tall pages print slowly.
pub const DEFAULT_PRINT_TIMEOUT: Duration = Duration::from_secs(120);

/// Expression measuring the page's full content height.
const PAGE_HEIGHT_SCRIPT: &str = "document.documentElement.scrollHeight";

/// How many `name (n).ext` variants to try before giving up.
const MAX_UNIQUIFY_ATTEMPTS: u32 = 100;

// ============================================================================
// TargetInfo
// ============================================================================

/// Description of a browser target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target id (usable as a [`TabId`]).
    pub target_id: String,
    /// Target type: `page`, `iframe`, `service_worker`, ...
    #[serde(rename = "type")]
    pub target_type: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Current URL.
    #[serde(default)]
    pub url: String,
    /// Whether some client is attached.
    #[serde(default)]
    pub attached: bool,
}

impl TargetInfo {
    /// Returns `true` for ordinary tabs.
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

// ============================================================================
// ChromeHost
// ============================================================================

/// [`Host`] implementation talking to Chrome over the DevTools Protocol.
pub struct ChromeHost {
    connection: Connection,
    /// `Protocol-Version` reported by the browser.
    protocol_version: String,
    /// Directory downloads are written into.
    download_dir: PathBuf,
    print_timeout: Duration,
    next_download_id: AtomicU64,
}

impl ChromeHost {
    /// Connects to a DevTools endpoint.
    ///
    /// `endpoint` is either `http://host:port` (discovered through
    /// `/json/version`) or a browser `ws://` URL.
    ///
    /// # Errors
    ///
    /// Returns connection, discovery, or protocol errors.
    pub async fn connect(endpoint: &str, download_dir: impl Into<PathBuf>) -> Result<Self> {
        let ws_url = resolve_ws_url(endpoint).await?;
        let connection = Connection::connect(&ws_url).await?;

        let version = connection
            .send(Request::new(Command::Browser(BrowserCommand::GetVersion)))
            .await?
            .into_result()?;

        let protocol_version = version
            .get("protocolVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("Browser.getVersion missing protocolVersion"))?
            .to_string();

        info!(
            product = version.get("product").and_then(serde_json::Value::as_str).unwrap_or_default(),
            protocol = %protocol_version,
            "Connected to browser"
        );

        Ok(Self::with_connection(connection, protocol_version, download_dir))
    }

    /// Wraps an established connection.
    #[must_use]
    pub fn with_connection(
        connection: Connection,
        protocol_version: impl Into<String>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            connection,
            protocol_version: protocol_version.into(),
            download_dir: download_dir.into(),
            print_timeout: DEFAULT_PRINT_TIMEOUT,
            next_download_id: AtomicU64::new(1),
        }
    }

    /// Sets the `Page.printToPDF` timeout.
    #[must_use]
    pub fn with_print_timeout(mut self, print_timeout: Duration) -> Self {
        self.print_timeout = print_timeout;
        self
    }

    /// Returns the browser's protocol version.
    #[inline]
    #[must_use]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Returns the download directory.
    #[inline]
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Lists open tabs.
    ///
    /// # Errors
    ///
    /// Returns connection or protocol errors.
    pub async fn page_targets(&self) -> Result<Vec<TargetInfo>> {
        let result = self
            .call(None, Command::Target(TargetCommand::GetTargets))
            .await?;

        let targets: Vec<TargetInfo> = serde_json::from_value(
            result.get("targetInfos").cloned().unwrap_or(Value::Null),
        )?;

        Ok(targets.into_iter().filter(TargetInfo::is_page).collect())
    }
}

// ============================================================================
// ChromeHost - Internal
// ============================================================================

impl ChromeHost {
    /// Sends a command with the default timeout.
    async fn call(&self, session: Option<&SessionId>, command: Command) -> Result<Value> {
        self.call_with_timeout(session, command, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a command and unwraps the result.
    async fn call_with_timeout(
        &self,
        session: Option<&SessionId>,
        command: Command,
        timeout: Duration,
    ) -> Result<Value> {
        let request = match session {
            Some(session) => Request::for_session(session.clone(), command),
            None => Request::new(command),
        };

        self.connection
            .send_with_timeout(request, timeout)
            .await?
            .into_result()
    }

    /// Attaches a flat session without a version check.
    async fn attach_session(&self, tab: &TabId) -> Result<SessionId> {
        let result = self
            .call(
                None,
                Command::Target(TargetCommand::AttachToTarget {
                    target_id: tab.clone(),
                    flatten: true,
                }),
            )
            .await?;

        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("Target.attachToTarget missing sessionId"))?;

        Ok(SessionId::new(session_id))
    }

    /// Evaluates `expression` in a short-lived session.
    async fn evaluate(&self, tab: &TabId, expression: &str) -> Result<Value> {
        let session = self.attach_session(tab).await?;

        let result = self
            .call(
                Some(&session),
                Command::Runtime(RuntimeCommand::evaluate(expression)),
            )
            .await;

        if let Err(e) = self.detach(&session).await {
            warn!(%session, error = %e, "Failed to detach evaluation session");
        }

        evaluation_value(result?)
    }
}

// ============================================================================
// Host
// ============================================================================

#[async_trait]
impl Host for ChromeHost {
    async fn execute_script(&self, tab: &TabId, script: &str) -> Result<Value> {
        debug!(tab_id = %tab, script_len = script.len(), "Executing script");
        self.evaluate(tab, script).await
    }

    async fn page_height(&self, tab: &TabId) -> Result<u64> {
        let value = self.evaluate(tab, PAGE_HEIGHT_SCRIPT).await?;

        let height = value
            .as_u64()
            .or_else(|| value.as_f64().filter(|h| *h >= 0.0).map(|h| h.round() as u64))
            .ok_or_else(|| Error::script_error(format!("page height is not a number: {value}")))?;

        debug!(tab_id = %tab, height, "Measured page height");
        Ok(height)
    }

    async fn attach(&self, tab: &TabId, protocol_version: &str) -> Result<SessionId> {
        if !version_supported(protocol_version, &self.protocol_version) {
            return Err(Error::unsupported_protocol_version(
                protocol_version,
                &self.protocol_version,
            ));
        }

        let session = self.attach_session(tab).await?;
        debug!(tab_id = %tab, %session, "Debugging session attached");
        Ok(session)
    }

    async fn print_to_pdf(&self, session: &SessionId, options: &PrintOptions) -> Result<String> {
        debug!(
            %session,
            width = options.paper_width,
            height = options.paper_height,
            "Printing to PDF"
        );

        let result = self
            .call_with_timeout(
                Some(session),
                Command::Page(PageCommand::PrintToPdf(*options)),
                self.print_timeout,
            )
            .await?;

        let data = result
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("Page.printToPDF response missing data field"))?;

        Ok(data.to_string())
    }

    async fn detach(&self, session: &SessionId) -> Result<()> {
        self.call(
            None,
            Command::Target(TargetCommand::DetachFromTarget {
                session_id: session.clone(),
            }),
        )
        .await?;

        debug!(%session, "Debugging session detached");
        Ok(())
    }

    async fn download(&self, data: &str, filename: &str, save_as: bool) -> Result<Download> {
        if save_as {
            return Err(Error::capability(
                Stage::Download,
                "Interactive save dialogs are not supported",
            ));
        }

        if !is_plain_filename(filename) {
            return Err(Error::capability(
                Stage::Download,
                format!("Invalid filename: {filename:?}"),
            ));
        }

        let bytes = Base64Standard.decode(data)?;

        fs::create_dir_all(&self.download_dir).await?;
        let path = write_unique(&self.download_dir, filename, &bytes).await?;

        let id = DownloadId::new(self.next_download_id.fetch_add(1, Ordering::Relaxed));
        info!(%id, path = %path.display(), bytes = bytes.len(), "Download complete");

        Ok(Download { id, path })
    }

    async fn tab_url(&self, tab: &TabId) -> Result<String> {
        let result = self
            .call(
                None,
                Command::Target(TargetCommand::GetTargetInfo {
                    target_id: tab.clone(),
                }),
            )
            .await?;

        let info: TargetInfo =
            serde_json::from_value(result.get("targetInfo").cloned().unwrap_or(Value::Null))?;

        Ok(info.url)
    }
}

impl Drop for ChromeHost {
    fn drop(&mut self) {
        self.connection.shutdown();
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extracts the value of a `Runtime.evaluate` result.
fn evaluation_value(result: Value) -> Result<Value> {
    if let Some(details) = result.get("exceptionDetails") {
        let message = details
            .get("exception")
            .and_then(|e| e.get("description"))
            .and_then(Value::as_str)
            .or_else(|| details.get("text").and_then(Value::as_str))
            .unwrap_or("Uncaught exception");
        return Err(Error::script_error(message));
    }

    Ok(result
        .get("result")
        .and_then(|r| r.get("value"))
        .cloned()
        .unwrap_or(Value::Null))
}

/// Returns `true` if a browser speaking `supported` accepts `requested`.
///
/// Major versions must match and the requested minor must not be newer.
fn version_supported(requested: &str, supported: &str) -> bool {
    fn parse(version: &str) -> Option<(u32, u32)> {
        let (major, minor) = version.trim().split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    }

    match (parse(requested), parse(supported)) {
        (Some((req_major, req_minor)), Some((sup_major, sup_minor))) => {
            req_major == sup_major && req_minor <= sup_minor
        }
        _ => false,
    }
}

/// Returns `true` if `filename` names a file directly inside a directory.
fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
}

/// Returns the `n`-th conflict variant: `name (n).ext`.
fn numbered_filename(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{filename} ({n})"),
    }
}

/// Writes `bytes` to a new file in `dir`, uniquifying the name on conflict.
async fn write_unique(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    for attempt in 0..=MAX_UNIQUIFY_ATTEMPTS {
        let name = if attempt == 0 {
            filename.to_string()
        } else {
            numbered_filename(filename, attempt)
        };
        let path = dir.join(&name);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::capability(
        Stage::Download,
        format!("Too many files named like {filename:?}"),
    ))
}

// ============================================================================
// Tests
// ============================================================================
