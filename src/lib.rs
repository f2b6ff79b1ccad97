//! # patent-fetch
//!
//! Download patent metadata and PDFs into a local cache directory, and
//! summarise each run in a CSV file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! patent numbers
//!  │
//!  ├─ 1. Input    CLI arguments or a text file, one number per line
//!  ├─ 2. Cache    reuse <id>.pdf + <id>_info.txt when both are valid
//!  ├─ 3. Fetch    landing page → metadata fields + PDF link (on a miss)
//!  ├─ 4. Persist  stream PDF to a temp file, write metadata, rename PDF
//!  └─ 5. Report   one CSV row per patent collected in the run
//! ```
//!
//! A stored PDF under 1024 bytes is treated as an interrupted download: it
//! is deleted and fetched again. Consecutive upstream fetches are spaced by
//! a configurable delay; cache hits are not.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use patent_fetch::{run, FetchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FetchConfig::builder().delay_secs(2).build()?;
//!     let ids = vec!["US7654321B2".to_string()];
//!     let outcome = run(&ids, &config).await?;
//!     for record in &outcome.records {
//!         println!("{}: {}", record.patent_number, record.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `patent-fetch` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod report;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{Resolved, Resolver, Source};
pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::{PatentError, PatentFetchError};
pub use pipeline::input::{load_identifiers, IdentifierSource};
pub use pipeline::source::{HttpSource, PatentSource};
pub use progress::{FetchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{parse_metadata, MetadataRecord, NOT_AVAILABLE};
pub use report::write_report;
pub use run::{run, run_from, run_sync, run_with_source, RunOutcome, RunStats};
