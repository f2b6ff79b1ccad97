//! Fetch-or-reuse cache keyed by patent number.
//!
//! [`Resolver::resolve`] guarantees that when it returns `Ok`, both the
//! document and the metadata file for the identifier exist on storage.
//!
//! ```text
//! document < min size? ──▶ delete
//! document + metadata present? ──▶ parse metadata ──ok──▶ hit (no network)
//!                                        │ io error
//!                                        ▼
//! fetch page ──▶ stage PDF (if missing) ──▶ write metadata (if missing) ──▶ commit PDF
//! ```
//!
//! No artifact is persisted until every upstream request for the identifier
//! succeeded, so an upstream failure leaves no new files behind (only a
//! truncated document may have been removed). The output directory itself
//! is created once the landing page has been fetched.
//!
//! Identifiers are checked with [`check_identifier`] before any path is
//! derived from them, so an id can never name a file outside the output
//! directory.
//!
//! The resolver takes `&mut self`: one resolver is one writer. Running two
//! resolvers against the same directory races between the existence check
//! and the write.

use crate::config::FetchConfig;
use crate::error::{PatentError, PatentFetchError};
use crate::pipeline::input::check_identifier;
use crate::pipeline::source::{HttpSource, PatentSource};
use crate::pipeline::store;
use crate::record::MetadataRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Both artifacts were reused from storage.
    Cache,
    /// The upstream was contacted.
    Upstream,
}

/// Result of resolving one identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolved {
    pub record: MetadataRecord,
    pub source: Source,
    pub document_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Spaces upstream fetches at least `delay` apart.
#[derive(Debug)]
struct Throttle {
    delay: Duration,
    last_fetch: Option<Instant>,
}

impl Throttle {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fetch: None,
        }
    }

    async fn wait(&self) {
        if let Some(last) = self.last_fetch {
            let ready_at = last + self.delay;
            if ready_at > Instant::now() {
                info!(
                    "Waiting {:.1}s before next download",
                    (ready_at - Instant::now()).as_secs_f64()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    fn mark(&mut self) {
        self.last_fetch = Some(Instant::now());
    }
}

/// Resolves identifiers against storage, falling back to a [`PatentSource`].
pub struct Resolver<S> {
    source: S,
    config: FetchConfig,
    throttle: Throttle,
}

impl Resolver<HttpSource> {
    /// A resolver that fetches over HTTP as configured.
    pub fn from_config(config: &FetchConfig) -> Result<Self, PatentFetchError> {
        Ok(Self::new(HttpSource::new(config)?, config.clone()))
    }
}

impl<S: PatentSource> Resolver<S> {
    pub fn new(source: S, config: FetchConfig) -> Self {
        let throttle = Throttle::new(config.delay);
        Self {
            source,
            config,
            throttle,
        }
    }

    /// The upstream this resolver falls back to.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the metadata for `id`, fetching and persisting artifacts on a miss.
    pub async fn resolve(&mut self, id: &str) -> Result<Resolved, PatentError> {
        check_identifier(id)?;
        let document_path = self.config.document_path(id);
        let metadata_path = self.config.metadata_path(id);

        let has_document =
            store::document_is_valid(&document_path, self.config.min_document_bytes).await;
        let has_metadata = tokio::fs::try_exists(&metadata_path).await.unwrap_or(false);

        if has_document && has_metadata {
            match store::read_metadata(&metadata_path, id).await {
                Ok(record) => {
                    info!("{}: using cached files", id);
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_cache_hit(id);
                    }
                    return Ok(Resolved {
                        record,
                        source: Source::Cache,
                        document_path,
                        metadata_path,
                    });
                }
                Err(e) => {
                    warn!(
                        "{}: cannot read cached metadata {}: {}; fetching again",
                        id,
                        metadata_path.display(),
                        e
                    );
                }
            }
        }

        self.throttle.wait().await;
        let result = self
            .fetch(id, &document_path, &metadata_path, has_document, has_metadata)
            .await;
        self.throttle.mark();

        result.map(|record| Resolved {
            record,
            source: Source::Upstream,
            document_path,
            metadata_path,
        })
    }

    async fn fetch(
        &self,
        id: &str,
        document_path: &Path,
        metadata_path: &Path,
        has_document: bool,
        has_metadata: bool,
    ) -> Result<MetadataRecord, PatentError> {
        let page = self.source.fetch_page(id).await?;
        let record = page.record.normalised();

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| PatentError::WriteFailed {
                patent: id.to_string(),
                path: self.config.output_dir.clone(),
                detail: e.to_string(),
            })?;

        let staged = if has_document {
            debug!("{}: document already stored, skipping download", id);
            None
        } else {
            let download = self.source.open_document(id, &page.pdf_url).await?;
            let cb = self.config.progress_callback.clone();
            let staged = store::stage_document(
                id,
                document_path,
                download,
                self.config.min_document_bytes,
                |downloaded, total| {
                    if let Some(ref cb) = cb {
                        cb.on_download_progress(id, downloaded, total);
                    }
                },
            )
            .await?;
            Some(staged)
        };

        // A metadata file that failed to parse is rewritten.
        let metadata_usable = has_metadata && store::read_metadata(metadata_path, id).await.is_ok();
        if !metadata_usable {
            store::write_metadata(metadata_path, &record).await?;
        }

        if let Some(staged) = staged {
            staged.commit()?;
        }

        Ok(record)
    }
}
