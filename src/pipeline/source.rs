//! Upstream access: the landing page and the PDF bytes.
//!
//! [`PatentSource`] is the seam between the cache and the network. The
//! production implementation is [`HttpSource`]; tests substitute an
//! in-memory source to count or forbid upstream calls.

use crate::config::FetchConfig;
use crate::error::{PatentError, PatentFetchError};
use crate::pipeline::extract::{extract_page, PatentPage};
use futures::stream::{BoxStream, StreamExt};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// A document response whose body has not been read yet.
pub struct DocumentDownload {
    /// `content-length`, when the upstream announced one.
    pub content_length: Option<u64>,
    pub chunks: BoxStream<'static, Result<Vec<u8>, PatentError>>,
}

/// Where patent pages and documents come from.
pub trait PatentSource {
    /// Fetch the landing page for `id` and extract its fields.
    fn fetch_page(&self, id: &str) -> impl Future<Output = Result<PatentPage, PatentError>> + Send;

    /// Start downloading the document at `url`.
    ///
    /// Resolves once the response headers arrived with a success status.
    fn open_document(
        &self,
        id: &str,
        url: &Url,
    ) -> impl Future<Output = Result<DocumentDownload, PatentError>> + Send;
}

/// [`PatentSource`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
    pdf_base_url: Url,
    timeout_secs: u64,
}

impl HttpSource {
    pub fn new(config: &FetchConfig) -> Result<Self, PatentFetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PatentFetchError::HttpClient(e.to_string()))?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| PatentFetchError::InvalidConfig(format!("base URL: {e}")))?;
        let pdf_base_url = Url::parse(&config.pdf_base_url)
            .map_err(|e| PatentFetchError::InvalidConfig(format!("PDF base URL: {e}")))?;
        Ok(Self {
            client,
            base_url,
            pdf_base_url,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn join(base: &Url, id: &str, suffix: &str) -> Result<Url, PatentError> {
        base.join(&format!("{id}{suffix}"))
            .map_err(|_| PatentError::InvalidIdentifier {
                patent: id.to_string(),
                base: base.to_string(),
            })
    }

    async fn get(&self, id: &str, url: &Url) -> Result<reqwest::Response, PatentError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.request_error(id, url, e))?;

        if !response.status().is_success() {
            return Err(PatentError::HttpStatus {
                patent: id.to_string(),
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    fn request_error(&self, id: &str, url: &Url, e: reqwest::Error) -> PatentError {
        if e.is_timeout() {
            PatentError::Timeout {
                patent: id.to_string(),
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            PatentError::RequestFailed {
                patent: id.to_string(),
                url: url.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

impl PatentSource for HttpSource {
    async fn fetch_page(&self, id: &str) -> Result<PatentPage, PatentError> {
        let page_url = Self::join(&self.base_url, id, "")?;
        let pdf_fallback = Self::join(&self.pdf_base_url, id, ".pdf")?;
        info!("Fetching information for patent {}", id);

        let body = self
            .get(id, &page_url)
            .await?
            .text()
            .await
            .map_err(|e| self.request_error(id, &page_url, e))?;
        debug!("{}: page is {} bytes", id, body.len());

        Ok(extract_page(&body, id, &page_url, pdf_fallback))
    }

    async fn open_document(&self, id: &str, url: &Url) -> Result<DocumentDownload, PatentError> {
        info!("Downloading PDF for {} from {}", id, url);
        let response = self.get(id, url).await?;
        let content_length = response.content_length();

        let patent = id.to_string();
        let url_text = url.to_string();
        let timeout_secs = self.timeout_secs;
        let chunks = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map(|b| b.to_vec()).map_err(|e| {
                    if e.is_timeout() {
                        PatentError::Timeout {
                            patent: patent.clone(),
                            url: url_text.clone(),
                            secs: timeout_secs,
                        }
                    } else {
                        PatentError::RequestFailed {
                            patent: patent.clone(),
                            url: url_text.clone(),
                            detail: e.to_string(),
                        }
                    }
                })
            })
            .boxed();

        Ok(DocumentDownload {
            content_length,
            chunks,
        })
    }
}
