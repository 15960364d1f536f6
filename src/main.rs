//! `fullpage-pdf` command line.
//!
//! Connects to a Chrome started with `--remote-debugging-port` and saves
//! one tab as a full-page PDF.
//!
//! ```text
//! fullpage-pdf --list
//! fullpage-pdf --tab 3F2A... --out ~/pdfs --wait-stable
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use fullpage_pdf::capture::{DEFAULT_DPI, DEFAULT_MAX_FILENAME_LEN};
use fullpage_pdf::host::chrome::DEFAULT_PRINT_TIMEOUT;
use fullpage_pdf::{
    CaptureOptions, Capturer, ChromeHost, ConsoleNotifier, Error, Result, TabId, WaitPolicy,
};

// ============================================================================
// Cli
// ============================================================================

/// Save a browser tab as a single tall PDF.
#[derive(Debug, Parser)]
#[command(name = "fullpage-pdf")]
#[command(version)]
struct Cli {
    /// DevTools endpoint: `http://host:port` or a browser `ws://` URL
    #[arg(long, env = "FULLPAGE_PDF_ENDPOINT", default_value = "http://127.0.0.1:9222")]
    endpoint: String,

    /// Target id of the tab to capture (default: first open tab)
    #[arg(long, conflicts_with = "list")]
    tab: Option<String>,

    /// List open tabs and exit
    #[arg(long)]
    list: bool,

    /// Directory PDFs are saved into
    #[arg(long, env = "FULLPAGE_PDF_OUT", default_value = ".")]
    out: PathBuf,

    /// Seconds to wait after scrolling
    #[arg(long, conflicts_with = "wait_stable")]
    wait_secs: Option<u64>,

    /// Wait until the page height stops changing instead of a fixed delay
    #[arg(long)]
    wait_stable: bool,

    /// Pixels per inch used to size the paper
    #[arg(long, default_value_t = DEFAULT_DPI)]
    dpi: f64,

    /// Maximum filename length before `.pdf`
    #[arg(long, default_value_t = DEFAULT_MAX_FILENAME_LEN)]
    max_filename_len: usize,

    /// Seconds to wait for the browser to render the PDF
    #[arg(long, default_value_t = DEFAULT_PRINT_TIMEOUT.as_secs())]
    print_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn wait_policy(&self) -> WaitPolicy {
        match (self.wait_stable, self.wait_secs) {
            (true, _) => WaitPolicy::stable_height(),
            (false, Some(0)) => WaitPolicy::None,
            (false, Some(secs)) => WaitPolicy::Fixed(Duration::from_secs(secs)),
            (false, None) => WaitPolicy::default(),
        }
    }

    fn capture_options(&self) -> Result<CaptureOptions> {
        CaptureOptions::builder()
            .wait_policy(self.wait_policy())
            .dpi(self.dpi)
            .max_filename_len(self.max_filename_len)
            .build()
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "fullpage-pdf failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug {
            "fullpage_pdf=debug"
        } else {
            "fullpage_pdf=info"
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether the capture succeeded; the outcome itself is reported by
/// the notifier.
async fn run(cli: Cli) -> Result<bool> {
    let options = cli.capture_options()?;
    if cli.print_timeout_secs == 0 {
        return Err(Error::config("Print timeout must be at least 1 second"));
    }

    let host = ChromeHost::connect(&cli.endpoint, &cli.out)
        .await?
        .with_print_timeout(Duration::from_secs(cli.print_timeout_secs));
    let host = Arc::new(host);

    if cli.list {
        for target in host.page_targets().await? {
            println!("{}\t{}\t{}", target.target_id, target.title, target.url);
        }
        return Ok(true);
    }

    let tab = match cli.tab {
        Some(id) => TabId::new(id)?,
        None => first_tab(&host).await?,
    };

    let capturer = Capturer::new(host, Arc::new(ConsoleNotifier), options);
    Ok(capturer
        .on_activated(Some(tab))
        .await
        .is_some_and(|outcome| outcome.is_ok()))
}

async fn first_tab(host: &ChromeHost) -> Result<TabId> {
    let target = host
        .page_targets()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::invalid_tab("No open tabs to capture"))?;

    TabId::new(target.target_id)
}
