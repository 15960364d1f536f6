//! The capture workflow.
//!
//! One invocation walks a tab through five stages:
//!
//! | Stage | Host call | On failure |
//! |-------|-----------|------------|
//! | Scroll | [`Host::execute_script`] | abort |
//! | Wait | [`WaitPolicy::settle`] | abort |
//! | Measure | [`Host::page_height`] | abort, nothing printed |
//! | Generate | [`Host::attach`], [`Host::print_to_pdf`] | detach, abort |
//! | Persist | [`Host::tab_url`], [`Host::download`] | detach, abort |
//!
//! Whatever happens, the user gets exactly one [`Notification`] and any
//! attached session is detached exactly once.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures_util::FutureExt;
use tracing::{debug, error, info};

use crate::error::{Error, Result, Stage};
use crate::host::{Download, Host, Notification, Notifier};
use crate::identifiers::{DownloadId, SessionId, TabId};

use super::filename::derive_filename;
use super::geometry::PageGeometry;
use super::guard::SessionGuard;
use super::locks::TabLocks;
use super::options::CaptureOptions;
use super::wait::SCROLL_TO_BOTTOM_SCRIPT;

// ============================================================================
// Types
// ============================================================================

/// Source of the date stamped into filenames.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Report of a successful capture.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPdf {
    /// Tab that was captured.
    pub tab_id: TabId,
    /// Derived filename.
    pub filename: String,
    /// Where the host saved the document.
    pub path: PathBuf,
    /// Host download handle.
    pub download_id: DownloadId,
    /// Measured page height.
    pub height_px: u64,
    /// Paper size the page was printed on.
    pub geometry: PageGeometry,
}

impl SavedPdf {
    /// Returns the name the file was saved under.
    ///
    /// Differs from [`SavedPdf::filename`] when the host had to avoid an
    /// existing file.
    #[must_use]
    pub fn saved_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }
}

// ============================================================================
// Capturer
// ============================================================================

/// Runs captures against a [`Host`] and reports them to a [`Notifier`].
///
/// Captures of the same tab are serialized; captures of different tabs
/// may run concurrently.
pub struct Capturer<H: Host + ?Sized + 'static> {
    host: Arc<H>,
    notifier: Arc<dyn Notifier>,
    options: CaptureOptions,
    locks: TabLocks,
    clock: Clock,
}

impl<H: Host + ?Sized + 'static> fmt::Debug for Capturer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capturer")
            .field("options", &self.options)
            .field("active_tabs", &self.locks.active())
            .finish_non_exhaustive()
    }
}

impl<H: Host + ?Sized + 'static> Capturer<H> {
    /// Creates a capturer stamping filenames with the local date.
    #[must_use]
    pub fn new(host: Arc<H>, notifier: Arc<dyn Notifier>, options: CaptureOptions) -> Self {
        Self {
            host,
            notifier,
            options,
            locks: TabLocks::new(),
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the date source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the capture options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Handles a user activation.
    ///
    /// Without a tab nothing happens: no host call, no notification.
    pub async fn on_activated(&self, tab: Option<TabId>) -> Option<Result<SavedPdf>> {
        let Some(tab) = tab else {
            debug!("Activation without a tab; ignoring");
            return None;
        };

        Some(self.capture(&tab).await)
    }

    /// Captures `tab` and notifies the user of the outcome.
    ///
    /// # Errors
    ///
    /// Returns the failure that was notified. Host failures are
    /// [`Error::Capability`] tagged with their stage; a panic in the
    /// workflow is [`Error::Internal`].
    pub async fn capture(&self, tab: &TabId) -> Result<SavedPdf> {
        let _permit = self.locks.acquire(tab).await;

        info!(tab_id = %tab, "Capture started");

        let outcome = match AssertUnwindSafe(self.run(tab)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(Error::internal(panic_message(panic.as_ref()))),
        };

        match &outcome {
            Ok(saved) => {
                let name = saved.saved_name();
                info!(
                    tab_id = %tab,
                    filename = %name,
                    path = %saved.path.display(),
                    height_px = saved.height_px,
                    "Capture finished"
                );
                self.notifier
                    .notify(&Notification::success(format!("PDF downloaded: {name}")));
            }
            Err(e) => {
                error!(
                    tab_id = %tab,
                    stage = e.stage().map(|stage| stage.as_str()),
                    error = %e,
                    "Capture failed"
                );
                self.notifier.notify(&Notification::failure(e.user_message()));
            }
        }

        outcome
    }

    async fn run(&self, tab: &TabId) -> Result<SavedPdf> {
        let host = self.host.as_ref();

        debug!(tab_id = %tab, "Scrolling to bottom");
        host.execute_script(tab, SCROLL_TO_BOTTOM_SCRIPT)
            .await
            .map_err(|e| e.at_stage(Stage::Scroll))?;

        self.options.wait_policy().settle(host, tab).await?;

        let height_px = host
            .page_height(tab)
            .await
            .map_err(|e| e.at_stage(Stage::MeasureHeight))?;

        let geometry = PageGeometry::for_page(height_px, self.options.dpi());
        debug!(
            tab_id = %tab,
            height_px,
            width_in = geometry.width_in,
            height_in = geometry.height_in,
            "Page measured"
        );

        let session =
            SessionGuard::attach(Arc::clone(&self.host), tab, self.options.protocol_version())
                .await?;

        let persisted = self.print_and_save(tab, session.id(), &geometry).await;
        session.release().await;
        let (filename, download) = persisted?;

        Ok(SavedPdf {
            tab_id: tab.clone(),
            filename,
            path: download.path,
            download_id: download.id,
            height_px,
            geometry,
        })
    }

    async fn print_and_save(
        &self,
        tab: &TabId,
        session: &SessionId,
        geometry: &PageGeometry,
    ) -> Result<(String, Download)> {
        let host = self.host.as_ref();

        let data = host
            .print_to_pdf(session, &geometry.print_options())
            .await
            .map_err(|e| e.at_stage(Stage::Print))?;

        let url = host
            .tab_url(tab)
            .await
            .map_err(|e| e.at_stage(Stage::TabLookup))?;
        let filename = derive_filename(&url, (self.clock)(), self.options.max_filename_len())
            .map_err(|e| e.at_stage(Stage::TabLookup))?;

        debug!(tab_id = %tab, %filename, bytes = data.len(), "Saving document");
        let download = host
            .download(&data, &filename, self.options.save_as())
            .await
            .map_err(|e| e.at_stage(Stage::Download))?;

        Ok((filename, download))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "capture panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;

    use crate::capture::WaitPolicy;
    use crate::protocol::PrintOptions;

    // ------------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Script,
        Height,
        Attach(String),
        Print(PrintOptions),
        Detach(String),
        TabUrl,
        Download { filename: String, save_as: bool },
    }

    #[derive(Default)]
    struct Failures {
        scroll: bool,
        height: bool,
        attach: bool,
        print: bool,
        download: bool,
        tab_url: bool,
        panic_on_url: bool,
    }

    struct FakeHost {
        url: String,
        height: u64,
        fail: Failures,
        delay: Duration,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeHost {
        fn new(url: &str, height: u64) -> Self {
            Self {
                url: url.to_string(),
                height,
                fail: Failures::default(),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, fail: Failures) -> Self {
            self.fail = fail;
            self
        }

        fn record(&self, call: Call) {
            self.calls.lock().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.lock().iter().filter(|c| pred(c)).count()
        }
    }

    #[async_trait]
    impl Host for FakeHost {
        async fn execute_script(&self, _tab: &TabId, _script: &str) -> Result<Value> {
            self.record(Call::Script);
            if self.fail.scroll {
                return Err(Error::script_error("Tab is showing an error page"));
            }
            Ok(Value::Null)
        }

        async fn page_height(&self, _tab: &TabId) -> Result<u64> {
            self.record(Call::Height);
            if self.fail.height {
                return Err(Error::script_error("Cannot access contents of the page"));
            }
            Ok(self.height)
        }

        async fn attach(&self, _tab: &TabId, version: &str) -> Result<SessionId> {
            self.record(Call::Attach(version.to_string()));
            if self.fail.attach {
                return Err(Error::protocol("Another debugger is already attached"));
            }
            Ok(SessionId::new("S1"))
        }

        async fn print_to_pdf(
            &self,
            _session: &SessionId,
            options: &PrintOptions,
        ) -> Result<String> {
            self.record(Call::Print(*options));
            tokio::time::sleep(self.delay).await;
            if self.fail.print {
                return Err(Error::protocol("Printing failed"));
            }
            Ok("JVBERi0=".to_string())
        }

        async fn detach(&self, session: &SessionId) -> Result<()> {
            self.record(Call::Detach(session.as_str().to_string()));
            Ok(())
        }

        async fn download(&self, _data: &str, filename: &str, save_as: bool) -> Result<Download> {
            self.record(Call::Download {
                filename: filename.to_string(),
                save_as,
            });
            if self.fail.download {
                return Err(Error::capability(Stage::Download, "Disk full"));
            }
            Ok(Download {
                id: DownloadId::new(7),
                path: PathBuf::from("/downloads").join(filename),
            })
        }

        async fn tab_url(&self, _tab: &TabId) -> Result<String> {
            self.record(Call::TabUrl);
            if self.fail.panic_on_url {
                panic!("tab vanished");
            }
            if self.fail.tab_url {
                return Err(Error::protocol("No target with given id found"));
            }
            Ok(self.url.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, notification: &Notification) {
            self.sent.lock().push(notification.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn tab() -> TabId {
        TabId::new("T1").expect("valid tab id")
    }

    fn capturer(host: FakeHost) -> (Capturer<FakeHost>, Arc<FakeHost>, Arc<Recorder>) {
        let host = Arc::new(host);
        let notifier = Arc::new(Recorder::default());
        let options = CaptureOptions::builder()
            .wait_policy(WaitPolicy::None)
            .build()
            .expect("valid options");
        let capturer = Capturer::new(Arc::clone(&host), notifier.clone(), options)
            .with_clock(|| NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"));
        (capturer, host, notifier)
    }

    fn is_detach(call: &Call) -> bool {
        matches!(call, Call::Detach(_))
    }

    fn is_print(call: &Call) -> bool {
        matches!(call, Call::Print(_))
    }

    fn is_download(call: &Call) -> bool {
        matches!(call, Call::Download { .. })
    }

    // ------------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_end_to_end() {
        let (capturer, host, notifier) =
            capturer(FakeHost::new("https://example.com/my-page!", 2000));

        let saved = capturer.capture(&tab()).await.expect("capture");

        assert_eq!(saved.filename, "example_com_my_page_20240305.pdf");
        assert_eq!(saved.height_px, 2000);
        assert_eq!(saved.download_id, DownloadId::new(7));

        let calls = host.calls();
        assert_eq!(calls[0], Call::Script);
        assert_eq!(calls[1], Call::Height);
        assert_eq!(calls[2], Call::Attach("1.3".to_string()));

        let Call::Print(options) = calls[3] else {
            panic!("expected print, got {:?}", calls[3]);
        };
        assert!((options.paper_width - 16.54).abs() < 1e-9);
        assert!((options.paper_height - 20.833_333).abs() < 1e-5);
        assert!(options.print_background);
        assert!(!options.landscape);
        assert_eq!(options.margin_top, 0.0);
        assert_eq!(options.margin_right, 0.0);

        assert_eq!(
            calls[5],
            Call::Download {
                filename: "example_com_my_page_20240305.pdf".to_string(),
                save_as: false,
            }
        );
        assert_eq!(calls.last(), Some(&Call::Detach("S1".to_string())));
        assert_eq!(host.count(is_detach), 1);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_success());
        assert!(sent[0].message.contains("example_com_my_page_20240305.pdf"));
    }

    #[tokio::test]
    async fn test_scroll_failure_stops_before_measuring() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                scroll: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Scroll));
        assert_eq!(host.calls(), vec![Call::Script]);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_success());
        assert!(sent[0].message.contains("error page"));
    }

    #[tokio::test]
    async fn test_height_failure_skips_print_and_download() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                height: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::MeasureHeight));
        assert_eq!(host.count(is_print), 0);
        assert_eq!(host.count(is_download), 0);
        assert_eq!(host.count(is_detach), 0);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_success());
    }

    #[tokio::test]
    async fn test_attach_failure_is_notified() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                attach: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Attach));
        assert_eq!(host.count(is_print), 0);
        assert_eq!(host.count(is_detach), 0);
        assert_eq!(notifier.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_print_failure_detaches_once() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                print: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Print));
        assert_eq!(host.count(is_detach), 1);
        assert_eq!(host.count(is_download), 0);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].message.contains("Printing failed"));
    }

    #[tokio::test]
    async fn test_download_failure_message() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                download: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Download));
        assert_eq!(host.count(is_detach), 1);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "Disk full");
    }

    #[tokio::test]
    async fn test_unparseable_url_is_tab_lookup_failure() {
        let (capturer, host, _notifier) = capturer(FakeHost::new("::not a url::", 100));

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::TabLookup));
        assert_eq!(host.count(is_download), 0);
        assert_eq!(host.count(is_detach), 1);
    }

    #[tokio::test]
    async fn test_tab_url_failure_detaches_without_download() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                tab_url: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::TabLookup));
        assert_eq!(host.count(is_print), 1);
        assert_eq!(host.count(is_download), 0);
        assert_eq!(host.count(is_detach), 1);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_success());
        assert!(sent[0].message.contains("No target with given id found"));
    }

    #[tokio::test]
    async fn test_panic_is_notified_and_detached() {
        let (capturer, host, notifier) = capturer(
            FakeHost::new("https://example.com/", 100).failing(Failures {
                panic_on_url: true,
                ..Default::default()
            }),
        );

        let err = capturer.capture(&tab()).await.unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
        assert!(err.to_string().contains("tab vanished"));

        // Drop-time detach runs on a spawned task.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(host.count(is_detach), 1);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_success());
    }

    #[tokio::test]
    async fn test_activation_without_tab_does_nothing() {
        let (capturer, host, notifier) = capturer(FakeHost::new("https://example.com/", 100));

        assert!(capturer.on_activated(None).await.is_none());
        assert!(host.calls().is_empty());
        assert!(notifier.sent.lock().is_empty());

        let outcome = capturer.on_activated(Some(tab())).await;
        assert!(matches!(outcome, Some(Ok(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_tab_captures_do_not_overlap() {
        let mut host = FakeHost::new("https://example.com/", 100);
        host.delay = Duration::from_secs(1);
        let (capturer, host, notifier) = capturer(host);

        let (tab_a, tab_b) = (tab(), tab());
        let (a, b) = tokio::join!(capturer.capture(&tab_a), capturer.capture(&tab_b));
        assert!(a.is_ok());
        assert!(b.is_ok());

        // Each capture's detach lands before the next scroll.
        let calls = host.calls();
        let first_detach = calls.iter().position(is_detach).expect("detach");
        let second_script = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Call::Script)
            .nth(1)
            .map(|(i, _)| i)
            .expect("second scroll");
        assert!(first_detach < second_script);
        assert_eq!(notifier.sent.lock().len(), 2);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&"boom".to_string()), "boom");
        assert_eq!(panic_message(&42), "capture panicked");
    }
}
