//! CLI binary for patent-fetch.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `FetchConfig` and prints results.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use patent_fetch::config::{DEFAULT_BASE_URL, DEFAULT_PDF_BASE_URL};
use patent_fetch::{
    run_from, FetchConfig, FetchProgressCallback, IdentifierSource, ProgressCallback, RunOutcome,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the patents of the run, with the
/// current PDF download shown in the message.
struct CliProgressCallback {
    bar: ProgressBar,
    output_dir: PathBuf,
}

impl CliProgressCallback {
    fn new(output_dir: PathBuf) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} patents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Fetching");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            output_dir,
        })
    }
}

impl FetchProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total} patents…"))
        ));
    }

    fn on_patent_start(&self, patent: &str, _index: usize, _total: usize) {
        self.bar.set_message(patent.to_string());
    }

    fn on_cache_hit(&self, patent: &str) {
        self.bar.println(format!(
            "  {} {:<16} {}",
            cyan("↺"),
            patent,
            dim("cached, no download")
        ));
    }

    fn on_download_progress(&self, patent: &str, downloaded: u64, total: Option<u64>) {
        let msg = match total {
            Some(t) if t > 0 => {
                format!("{patent}  PDF {:.1}%", downloaded as f64 / t as f64 * 100.0)
            }
            _ => format!("{patent}  PDF {} KiB", downloaded / 1024),
        };
        self.bar.set_message(msg);
    }

    fn on_patent_complete(&self, patent: &str, title: &str) {
        self.bar.println(format!(
            "  {} {:<16} {}",
            green("✓"),
            patent,
            title
        ));
        self.bar.println(dim(&format!(
            "      {dir}/{patent}.pdf  {dir}/{patent}_info.txt",
            dir = self.output_dir.display()
        )));
        self.bar.inc(1);
    }

    fn on_patent_error(&self, patent: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar
            .println(format!("  {} {:<16} {}", red("✗"), patent, red(&msg)));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} patents ready",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} patents ready  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download two patents (2 s between downloads)
  patent-fetch US7654321B2 EP1234567A1

  # Read patent numbers from a file, one per line
  patent-fetch --file patents.txt

  # Faster, into a custom directory, no CSV summary
  patent-fetch --delay 0 --output-dir out --no-report US7654321B2

  # Machine-readable run outcome
  patent-fetch --json --file patents.txt > outcome.json

FILES:
  <output-dir>/<id>.pdf        Patent PDF (re-downloaded when under 1024 bytes)
  <output-dir>/<id>_info.txt   Title, dates, inventors and abstract
  <report>                     CSV: Patent Number, Publication Date, Abstract

  Patents whose two files already exist are not downloaded again.

ENVIRONMENT VARIABLES:
  PATENT_FETCH_FILE         Identifier file (instead of arguments)
  PATENT_FETCH_DELAY        Seconds between upstream fetches
  PATENT_FETCH_OUTPUT_DIR   Cache directory
  PATENT_FETCH_REPORT       Summary CSV path
  RUST_LOG                  Override log filter (e.g. patent_fetch=debug)
"#;

/// Download patent metadata and PDFs, reusing what is already on disk.
#[derive(Parser, Debug)]
#[command(
    name = "patent-fetch",
    version,
    about = "Download patent metadata and PDFs, reusing what is already on disk",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("input").required(true).args(["patents", "file"]))
)]
struct Cli {
    /// One or more patent numbers.
    patents: Vec<String>,

    /// Text file with one patent number per line.
    #[arg(short, long, env = "PATENT_FETCH_FILE")]
    file: Option<PathBuf>,

    /// Seconds to wait between upstream fetches.
    #[arg(short, long, env = "PATENT_FETCH_DELAY", default_value_t = 2)]
    delay: u64,

    /// Directory for PDFs and metadata files.
    #[arg(short, long, env = "PATENT_FETCH_OUTPUT_DIR", default_value = "patents")]
    output_dir: PathBuf,

    /// Summary CSV path (overwritten each run).
    #[arg(
        long,
        env = "PATENT_FETCH_REPORT",
        default_value = "patent_reports/patent_summary.csv"
    )]
    report: PathBuf,

    /// Do not write the summary CSV.
    #[arg(long, env = "PATENT_FETCH_NO_REPORT")]
    no_report: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PATENT_FETCH_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Landing page base URL; the patent number is appended.
    #[arg(long, env = "PATENT_FETCH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Fallback PDF base URL; `<number>.pdf` is appended.
    #[arg(long, env = "PATENT_FETCH_PDF_BASE_URL", default_value = DEFAULT_PDF_BASE_URL)]
    pdf_base_url: String,

    /// Print the run outcome as JSON on stdout.
    #[arg(long, env = "PATENT_FETCH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PATENT_FETCH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PATENT_FETCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PATENT_FETCH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new(cli.output_dir.clone());
        Some(cb as Arc<dyn FetchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    let input = match cli.file {
        Some(ref path) => IdentifierSource::File(path.clone()),
        None => IdentifierSource::List(cli.patents.clone()),
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = run_from(&input, &config).await.context("Patent run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&outcome, show_progress);
    }

    if outcome.stats.total > 0 && outcome.records.is_empty() {
        anyhow::bail!("All {} patents failed", outcome.stats.total);
    }
    Ok(())
}

/// Map CLI args to `FetchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<FetchConfig> {
    let mut builder = FetchConfig::builder()
        .output_dir(&cli.output_dir)
        .report_path(&cli.report)
        .delay_secs(cli.delay)
        .request_timeout_secs(cli.timeout)
        .base_url(&cli.base_url)
        .pdf_base_url(&cli.pdf_base_url);

    if cli.no_report {
        builder = builder.no_report();
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(outcome: &RunOutcome, show_progress: bool) {
    let stats = &outcome.stats;
    if stats.total == 0 {
        eprintln!("No patent numbers to process.");
        return;
    }

    // The progress callback already printed the per-patent lines.
    if !show_progress {
        for record in &outcome.records {
            eprintln!("Successfully downloaded patent {}: {}", record.patent_number, record.title);
        }
        for failure in &outcome.failures {
            eprintln!("  {}", red(&failure.to_string()));
        }
    }

    eprintln!(
        "   {} cached  /  {} fetched  /  {} failed  —  {}ms total",
        dim(&stats.cache_hits.to_string()),
        dim(&stats.fetched.to_string()),
        dim(&stats.failed.to_string()),
        stats.duration_ms,
    );
    match (&outcome.report_path, &outcome.report_error) {
        (Some(path), _) => eprintln!("   report  →  {}", bold(&path.display().to_string())),
        (None, Some(err)) => eprintln!("   {}", red(err)),
        (None, None) => {}
    }
}
