//! Progress-callback trait for per-patent run events.
//!
//! Inject an [`Arc<dyn FetchProgressCallback>`] via
//! [`crate::config::FetchConfigBuilder::progress_callback`] to receive events
//! as the run resolves each identifier. The CLI uses it to drive an
//! `indicatif` bar; library users can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use patent_fetch::{FetchConfig, FetchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     hits: AtomicUsize,
//! }
//!
//! impl FetchProgressCallback for CountingCallback {
//!     fn on_cache_hit(&self, _patent: &str) {
//!         self.hits.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = FetchConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { hits: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by a run as it resolves each identifier.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait FetchProgressCallback: Send + Sync {
    /// Called once before the first identifier.
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before an identifier is resolved.
    ///
    /// # Arguments
    /// * `index`  — 1-indexed position in the run
    /// * `total`  — number of identifiers in the run
    fn on_patent_start(&self, patent: &str, index: usize, total: usize) {
        let _ = (patent, index, total);
    }

    /// Called when both artifacts were reused from storage.
    fn on_cache_hit(&self, patent: &str) {
        let _ = patent;
    }

    /// Called for every chunk written while downloading a document.
    ///
    /// `total` is the `content-length` announced by the upstream, if any.
    fn on_download_progress(&self, patent: &str, downloaded: u64, total: Option<u64>) {
        let _ = (patent, downloaded, total);
    }

    /// Called when an identifier resolved successfully.
    fn on_patent_complete(&self, patent: &str, title: &str) {
        let _ = (patent, title);
    }

    /// Called when an identifier failed; the run continues.
    fn on_patent_error(&self, patent: &str, error: &str) {
        let _ = (patent, error);
    }

    /// Called once after every identifier was attempted.
    fn on_run_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FetchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FetchConfig`].
pub type ProgressCallback = Arc<dyn FetchProgressCallback>;
