//! CLI binary for trackfetch.
//!
//! A thin shim over the library crate: maps flags to `ClientConfig`, binds
//! the controller's view to the terminal, and turns Ctrl-C into `cancel()`.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use trackfetch::{
    download_entries, CancelNotice, ClientConfig, ControllerView, Controller, ConversionResult,
    DownloadSelection, Entry, SubmitOutcome, ViewHandle,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal view ────────────────────────────────────────────────────────────

/// Renders controller state on the terminal: a spinner while busy, status
/// lines on stderr, the result list on stdout.
struct TerminalView {
    bar: ProgressBar,
    quiet: bool,
    print_entries: bool,
}

impl TerminalView {
    fn new(quiet: bool, print_entries: bool) -> Arc<Self> {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);

        Arc::new(Self {
            bar,
            quiet,
            print_entries,
        })
    }

    fn print_entry(entry: &Entry) {
        match entry {
            Entry::Archive { href } => println!("{}  {}", bold(&entry.to_string()), href),
            Entry::Track { href, .. } => println!("{} {}  {}", green("⬇"), entry, dim(href)),
            Entry::SkippedHeader => println!("{}", red(&format!("⚠ {entry}"))),
            Entry::Skipped { .. } => println!("{}", dim(&entry.to_string())),
        }
    }
}

impl ControllerView for TerminalView {
    fn set_cancel_visible(&self, visible: bool) {
        if visible {
            self.bar.set_prefix("Converting");
        }
    }

    fn set_busy(&self, message: &str) {
        self.bar.set_message(format!("{message}  {}", dim("(Ctrl-C to cancel)")));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn set_status(&self, text: &str) {
        self.bar.finish_and_clear();
        if self.quiet {
            return;
        }
        let marker = if text.starts_with("Error") || text.starts_with("Server") {
            red("✘")
        } else if text.contains("ready") {
            green("✔")
        } else {
            cyan("◆")
        };
        eprintln!("{marker} {text}");
    }

    fn show_results(&self, entries: &[Entry]) {
        if self.print_entries {
            entries.iter().for_each(Self::print_entry);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a playlist and list the download links
  trackfetch "https://www.youtube.com/playlist?list=PL..."

  # Convert and download every track into ./music
  trackfetch "https://youtu.be/..." -o music

  # Download only the zip archive
  trackfetch "https://youtu.be/..." -o music --zip

  # Talk to a local backend, JSON output
  trackfetch --backend http://localhost:8000 --json "https://youtu.be/..."

Press Ctrl-C while a conversion is running to cancel it; the backend is
asked to stop as well.

ENVIRONMENT VARIABLES:
  TRACKFETCH_BACKEND       Backend base URL
  TRACKFETCH_TIMEOUT       Conversion request timeout in seconds
  RUST_LOG                 Override log filtering (e.g. trackfetch=debug)
"#;

/// Convert media URLs to audio tracks via a conversion backend.
#[derive(Parser, Debug)]
#[command(
    name = "trackfetch",
    version,
    about = "Convert media URLs to audio tracks via a conversion backend",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Media URL (video, playlist, …) to convert.
    url: String,

    /// Backend base URL.
    #[arg(long, env = "TRACKFETCH_BACKEND", default_value = trackfetch::DEFAULT_BACKEND_URL)]
    backend: String,

    /// Download the results into this directory.
    #[arg(short, long, env = "TRACKFETCH_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// With --output-dir: fetch only the zip archive when one is offered.
    #[arg(long)]
    zip: bool,

    /// Parallel downloads.
    #[arg(short, long, env = "TRACKFETCH_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Conversion request timeout in seconds.
    #[arg(long, env = "TRACKFETCH_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// Cancel-notify timeout in seconds.
    #[arg(long, env = "TRACKFETCH_CANCEL_TIMEOUT", default_value_t = 10)]
    cancel_timeout: u64,

    /// Per-file download timeout in seconds.
    #[arg(long, env = "TRACKFETCH_DOWNLOAD_TIMEOUT", default_value_t = 300)]
    download_timeout: u64,

    /// Output the outcome as JSON instead of a list.
    #[arg(long, env = "TRACKFETCH_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRACKFETCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRACKFETCH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and status lines cover normal feedback; library logs
    // only show up with -v or RUST_LOG.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.url.trim().is_empty() {
        anyhow::bail!("Nothing to convert: the URL is empty");
    }

    // ── Build controller ─────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let view = TerminalView::new(cli.quiet || cli.json, !cli.json);
    let controller = Arc::new(
        Controller::http(config.clone())
            .context("Failed to create HTTP client")?
            .with_view(view as ViewHandle),
    );

    // Ctrl-C during the conversion cancels it.
    let interrupt = tokio::spawn(cancel_on_interrupt(
        Arc::clone(&controller),
        tokio::signal::ctrl_c,
    ));

    // ── Run conversion ───────────────────────────────────────────────────
    let outcome = controller.submit(&cli.url).await;

    if matches!(outcome, SubmitOutcome::Aborted { .. }) {
        // Let the backend hear about the cancel before the runtime goes away.
        if let Ok(Some(notice)) = interrupt.await {
            notice.finished().await;
        }
    } else {
        interrupt.abort();
    }

    if cli.json {
        print_json(&outcome)?;
    }

    let entries = match outcome {
        SubmitOutcome::Settled {
            result: ConversionResult::Success { .. },
            entries,
            ..
        } => entries,
        SubmitOutcome::Aborted { .. } => return Ok(ExitCode::from(130)),
        _ => return Ok(ExitCode::FAILURE),
    };

    // ── Optional download ────────────────────────────────────────────────
    if let Some(ref dir) = cli.output_dir {
        let selection = if cli.zip {
            DownloadSelection::Archive
        } else {
            DownloadSelection::Tracks
        };
        let download = download_entries(&entries, dir, selection, cli.concurrency, &config);
        let Some(report) = unless_interrupted(download, tokio::signal::ctrl_c()).await else {
            if !cli.quiet {
                eprintln!("{} Download interrupted", cyan("◆"));
            }
            return Ok(ExitCode::from(130));
        };
        let report = report.context("Download failed")?;

        if !cli.quiet {
            for path in &report.saved {
                eprintln!("  {} {}", green("✓"), path.display());
            }
            for (href, err) in &report.failed {
                eprintln!("  {} {}  {}", red("✗"), href, red(&err.to_string()));
            }
            eprintln!(
                "{} {}/{} file(s) saved to {}",
                if report.is_complete() { green("✔") } else { cyan("⚠") },
                report.saved.len(),
                report.saved.len() + report.failed.len(),
                bold(&dir.display().to_string()),
            );
        }
        if !report.is_complete() {
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Cancel the conversion on the first interrupt that finds one cancellable.
/// Returns `None` once the signal source fails.
async fn cancel_on_interrupt<S, F>(
    controller: Arc<Controller>,
    mut signal: S,
) -> Option<CancelNotice>
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
{
    loop {
        signal().await.ok()?;
        match controller.cancel() {
            Some(notice) => return Some(notice),
            None => debug!("Interrupt with no cancellable conversion"),
        }
    }
}

/// Run `work` unless `interrupt` resolves first.
async fn unless_interrupted<T>(work: impl Future<Output = T>, interrupt: impl Future) -> Option<T> {
    tokio::select! {
        v = work => Some(v),
        _ = interrupt => None,
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    ClientConfig::builder()
        .backend_url(&cli.backend)
        .request_timeout_secs(cli.timeout)
        .cancel_timeout_secs(cli.cancel_timeout)
        .download_timeout_secs(cli.download_timeout)
        .build()
        .context("Invalid configuration")
}

fn print_json(outcome: &SubmitOutcome) -> Result<()> {
    let value = match outcome {
        SubmitOutcome::Settled {
            session_id,
            result,
            entries,
        } => serde_json::json!({
            "session_id": session_id,
            "result": result,
            "entries": entries,
        }),
        SubmitOutcome::Aborted { session_id } => serde_json::json!({
            "session_id": session_id,
            "result": { "status": "cancelled" },
        }),
        SubmitOutcome::Failed { session_id, error } => serde_json::json!({
            "session_id": session_id,
            "result": { "status": "error", "message": error.to_string() },
        }),
        SubmitOutcome::Ignored | SubmitOutcome::Rejected { .. } => serde_json::json!({}),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&value).context("Failed to serialise output")?
    );
    Ok(())
}
