//! Run entry points: resolve a list of identifiers, then write the report.
//!
//! A run is strictly sequential. The records it collects are returned in a
//! [`RunOutcome`] rather than held anywhere else, so two runs never share
//! state.

use crate::cache::{Resolver, Source};
use crate::config::FetchConfig;
use crate::error::{PatentError, PatentFetchError};
use crate::pipeline::input::{load_identifiers, IdentifierSource};
use crate::pipeline::source::{HttpSource, PatentSource};
use crate::record::MetadataRecord;
use crate::report::write_report;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub cache_hits: usize,
    pub fetched: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Records in identifier order, one per successfully resolved identifier.
    pub records: Vec<MetadataRecord>,
    /// Identifiers that could not be resolved.
    pub failures: Vec<PatentError>,
    pub stats: RunStats,
    /// The summary file, when one was written.
    pub report_path: Option<PathBuf>,
    /// Why the summary could not be written, if it failed.
    pub report_error: Option<String>,
}

impl RunOutcome {
    /// True when every identifier resolved.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve `ids` over HTTP and write the configured report.
///
/// # Errors
/// Fatal errors only: an unusable output directory or HTTP client. Failures
/// of single identifiers are collected in [`RunOutcome::failures`].
pub async fn run(ids: &[String], config: &FetchConfig) -> Result<RunOutcome, PatentFetchError> {
    let source = HttpSource::new(config)?;
    run_with_source(source, ids, config).await
}

/// Load identifiers from `input`, then [`run`] them.
///
/// A missing identifier file fails before any directory is created or any
/// request is made.
pub async fn run_from(
    input: &IdentifierSource,
    config: &FetchConfig,
) -> Result<RunOutcome, PatentFetchError> {
    let ids = load_identifiers(input).await?;
    run(&ids, config).await
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(ids: &[String], config: &FetchConfig) -> Result<RunOutcome, PatentFetchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PatentFetchError::InvalidConfig(format!("tokio runtime: {e}")))?
        .block_on(run(ids, config))
}

/// Resolve `ids` against `source`.
pub async fn run_with_source<S: PatentSource>(
    source: S,
    ids: &[String],
    config: &FetchConfig,
) -> Result<RunOutcome, PatentFetchError> {
    let start = Instant::now();
    let total = ids.len();

    if ids.is_empty() {
        info!("No patent numbers given; nothing to do");
        return Ok(RunOutcome::default());
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| PatentFetchError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    info!("Processing {} patents into {}", total, config.output_dir.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut resolver = Resolver::new(source, config.clone());
    let mut outcome = RunOutcome::default();
    outcome.stats.total = total;

    for (i, id) in ids.iter().enumerate() {
        info!("Processing patent {} of {}: {}", i + 1, total, id);
        if let Some(ref cb) = config.progress_callback {
            cb.on_patent_start(id, i + 1, total);
        }

        match resolver.resolve(id).await {
            Ok(resolved) => {
                match resolved.source {
                    Source::Cache => outcome.stats.cache_hits += 1,
                    Source::Upstream => outcome.stats.fetched += 1,
                }
                if let Some(ref cb) = config.progress_callback {
                    cb.on_patent_complete(id, &resolved.record.title);
                }
                outcome.records.push(resolved.record);
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_patent_error(id, &e.to_string());
                }
                outcome.stats.failed += 1;
                outcome.failures.push(e);
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, outcome.records.len());
    }

    if let Some(ref report_path) = config.report_path {
        match write_report(&outcome.records, report_path).await {
            Ok(path) => outcome.report_path = path,
            Err(e) => {
                error!("{}", e);
                outcome.report_error = Some(e.to_string());
            }
        }
    }

    outcome.stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Run complete: {}/{} patents ({} cached, {} fetched), {}ms",
        outcome.records.len(),
        total,
        outcome.stats.cache_hits,
        outcome.stats.fetched,
        outcome.stats.duration_ms
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::PatentPage;
    use crate::pipeline::source::DocumentDownload;
    use reqwest::Url;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Upstream that must never be called.
    struct Unreachable(Arc<AtomicUsize>);

    impl PatentSource for Unreachable {
        async fn fetch_page(&self, id: &str) -> Result<PatentPage, PatentError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(PatentError::RequestFailed {
                patent: id.into(),
                url: "http://unreachable/".into(),
                detail: "offline".into(),
            })
        }

        async fn open_document(&self, id: &str, url: &Url) -> Result<DocumentDownload, PatentError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(PatentError::RequestFailed {
                patent: id.into(),
                url: url.to_string(),
                detail: "offline".into(),
            })
        }
    }

    fn config(dir: &std::path::Path) -> FetchConfig {
        FetchConfig::builder()
            .output_dir(dir.join("patents"))
            .report_path(dir.join("reports/summary.csv"))
            .delay(Duration::ZERO)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn empty_list_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let cfg = config(dir.path());

        let outcome = run_with_source(Unreachable(calls.clone()), &[], &cfg)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(outcome.records.is_empty());
        assert!(outcome.report_path.is_none());
        assert!(!dir.path().join("reports/summary.csv").exists());
    }

    #[tokio::test]
    async fn failures_are_collected_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let cfg = config(dir.path());
        let ids = vec!["US1".to_string(), "US2".to_string()];

        let outcome = run_with_source(Unreachable(calls.clone()), &ids, &cfg)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.stats.failed, 2);
        assert!(!outcome.is_complete());
        assert!(outcome.report_path.is_none());
    }

    #[tokio::test]
    async fn cached_patents_are_reported_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let cfg = config(dir.path());
        std::fs::create_dir_all(&cfg.output_dir).unwrap();
        for id in ["US1", "US2"] {
            std::fs::write(cfg.document_path(id), vec![0u8; 2048]).unwrap();
            std::fs::write(
                cfg.metadata_path(id),
                format!("Patent Number: {id}\nPublication Date: 2020\n\nAbstract:\nLine a\nLine b\n"),
            )
            .unwrap();
        }
        let ids = vec!["US1".to_string(), "US2".to_string()];

        let outcome = run_with_source(Unreachable(calls.clone()), &ids, &cfg)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.stats.cache_hits, 2);
        let report = std::fs::read_to_string(outcome.report_path.unwrap()).unwrap();
        assert_eq!(
            report.lines().collect::<Vec<_>>(),
            vec![
                "Patent Number,Publication Date,Abstract",
                "US1,2020,Line a Line b",
                "US2,2020,Line a Line b",
            ]
        );
    }

    #[tokio::test]
    async fn missing_identifier_file_halts_before_work() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let input = IdentifierSource::File(dir.path().join("missing.txt"));

        let err = run_from(&input, &cfg).await.unwrap_err();

        assert!(matches!(err, PatentFetchError::InputNotFound { .. }));
        assert!(!cfg.output_dir.exists());
    }
}
