//! Configuration types for a patent fetch run.
//!
//! All run behaviour is controlled through [`FetchConfig`], built via its
//! [`FetchConfigBuilder`]. The builder clamps numeric knobs to sane ranges and
//! [`FetchConfigBuilder::build`] rejects combinations that cannot work.

use crate::error::PatentFetchError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default landing page for a patent number.
pub const DEFAULT_BASE_URL: &str = "https://patents.google.com/patent/";

/// Where PDFs live when the landing page does not link one.
pub const DEFAULT_PDF_BASE_URL: &str = "https://patentimages.storage.googleapis.com/pdfs/";

/// Browser-like User-Agent; the upstream serves a stripped page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Documents smaller than this are treated as interrupted downloads.
pub const MIN_DOCUMENT_BYTES: u64 = 1024;

/// Configuration for a fetch run.
///
/// # Example
/// ```rust
/// use patent_fetch::FetchConfig;
///
/// let config = FetchConfig::builder()
///     .output_dir("patents")
///     .delay_secs(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.delay.as_secs(), 2);
/// ```
#[derive(Clone)]
pub struct FetchConfig {
    /// Directory holding `<id>.pdf` and `<id>_info.txt`. Default: `patents`.
    pub output_dir: PathBuf,

    /// Summary CSV path, overwritten on every run. `None` disables the report.
    /// Default: `patent_reports/patent_summary.csv`.
    pub report_path: Option<PathBuf>,

    /// Minimum spacing between two upstream fetches. Cache hits are not delayed.
    /// Default: 2 s.
    pub delay: Duration,

    /// Patent landing page base; the identifier is appended. Must end in `/`.
    pub base_url: String,

    /// Fallback PDF location base; `<id>.pdf` is appended. Must end in `/`.
    pub pdf_base_url: String,

    /// User-Agent sent with every request.
    pub user_agent: String,

    /// Per-request timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Validity threshold for stored documents. Default: 1024 bytes.
    pub min_document_bytes: u64,

    /// Optional per-patent progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("patents"),
            report_path: Some(PathBuf::from("patent_reports/patent_summary.csv")),
            delay: Duration::from_secs(2),
            base_url: DEFAULT_BASE_URL.to_string(),
            pdf_base_url: DEFAULT_PDF_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 60,
            min_document_bytes: MIN_DOCUMENT_BYTES,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("output_dir", &self.output_dir)
            .field("report_path", &self.report_path)
            .field("delay", &self.delay)
            .field("base_url", &self.base_url)
            .field("pdf_base_url", &self.pdf_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("min_document_bytes", &self.min_document_bytes)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn FetchProgressCallback>"),
            )
            .finish()
    }
}

impl FetchConfig {
    /// Create a new builder for `FetchConfig`.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the stored document for `id`.
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}.pdf"))
    }

    /// Path of the stored metadata file for `id`.
    pub fn metadata_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}_info.txt"))
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_path = Some(path.into());
        self
    }

    pub fn no_report(mut self) -> Self {
        self.config.report_path = None;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    pub fn delay_secs(self, secs: u64) -> Self {
        self.delay(Duration::from_secs(secs))
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = with_trailing_slash(url.into());
        self
    }

    pub fn pdf_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.pdf_base_url = with_trailing_slash(url.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn min_document_bytes(mut self, bytes: u64) -> Self {
        self.config.min_document_bytes = bytes;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FetchConfig, PatentFetchError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(PatentFetchError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        for (name, url) in [("base URL", &c.base_url), ("PDF base URL", &c.pdf_base_url)] {
            if reqwest::Url::parse(url).is_err() {
                return Err(PatentFetchError::InvalidConfig(format!(
                    "{name} is not a valid URL: '{url}'"
                )));
            }
        }
        Ok(self.config)
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream() {
        let c = FetchConfig::default();
        assert_eq!(c.delay, Duration::from_secs(2));
        assert_eq!(c.min_document_bytes, 1024);
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            c.report_path.as_deref(),
            Some(std::path::Path::new("patent_reports/patent_summary.csv"))
        );
    }

    #[test]
    fn artifact_paths_are_derived_from_id() {
        let c = FetchConfig::builder().output_dir("out").build().unwrap();
        assert_eq!(c.document_path("US1"), PathBuf::from("out/US1.pdf"));
        assert_eq!(c.metadata_path("US1"), PathBuf::from("out/US1_info.txt"));
    }

    #[test]
    fn base_urls_get_trailing_slash() {
        let c = FetchConfig::builder()
            .base_url("http://127.0.0.1:9000/patent")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://127.0.0.1:9000/patent/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = FetchConfig::builder().base_url("not a url").build();
        assert!(matches!(err, Err(PatentFetchError::InvalidConfig(_))));
    }

    #[test]
    fn empty_output_dir_is_rejected() {
        let err = FetchConfig::builder().output_dir("").build();
        assert!(matches!(err, Err(PatentFetchError::InvalidConfig(_))));
    }

    #[test]
    fn no_report_clears_path() {
        let c = FetchConfig::builder().no_report().build().unwrap();
        assert!(c.report_path.is_none());
    }
}
