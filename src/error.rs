//! Error types for the patent-fetch library.
//!
//! Two error types match the two ways a run can fail:
//!
//! * [`PatentFetchError`]: **fatal**. The run cannot start or cannot finish
//!   (missing identifier file, unusable output directory, report not
//!   writable). Returned as `Err` from [`crate::run::run`].
//!
//! * [`PatentError`]: **non-fatal**. One identifier failed (network error,
//!   HTTP error status, write failure). It is recorded in
//!   [`crate::run::RunOutcome::failures`] and the run moves on to the next
//!   identifier.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the patent-fetch library.
#[derive(Debug, Error)]
pub enum PatentFetchError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The identifier list file does not exist.
    #[error("Identifier file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// The identifier list file exists but could not be read.
    #[error("Failed to read identifier file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run summary could not be written.
    #[error("Failed to write report '{path}': {detail}")]
    ReportWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A non-fatal error for a single patent.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PatentError {
    /// The upstream request failed before a response arrived.
    #[error("{patent}: request to '{url}' failed: {detail}")]
    RequestFailed {
        patent: String,
        url: String,
        detail: String,
    },

    /// The upstream answered with a non-success status.
    #[error("{patent}: '{url}' returned HTTP {status}")]
    HttpStatus {
        patent: String,
        url: String,
        status: u16,
    },

    /// The upstream request timed out.
    #[error("{patent}: request to '{url}' timed out after {secs}s")]
    Timeout {
        patent: String,
        url: String,
        secs: u64,
    },

    /// The identifier cannot be turned into a URL.
    #[error("{patent}: cannot build a URL from base '{base}'")]
    InvalidIdentifier { patent: String, base: String },

    /// The identifier is not usable as a file name and URL path segment.
    #[error("{patent:?}: not a valid patent number (letters, digits, '-', '_' and '.' only)")]
    MalformedIdentifier { patent: String },

    /// The downloaded document is smaller than the validity threshold.
    #[error("{patent}: document is only {bytes} bytes (minimum {min})")]
    DocumentTooSmall { patent: String, bytes: u64, min: u64 },

    /// An artifact could not be written to storage.
    #[error("{patent}: failed to write '{path}': {detail}")]
    WriteFailed {
        patent: String,
        path: PathBuf,
        detail: String,
    },
}

impl PatentError {
    /// The identifier this error belongs to.
    pub fn patent(&self) -> &str {
        match self {
            PatentError::RequestFailed { patent, .. }
            | PatentError::HttpStatus { patent, .. }
            | PatentError::Timeout { patent, .. }
            | PatentError::InvalidIdentifier { patent, .. }
            | PatentError::MalformedIdentifier { patent }
            | PatentError::DocumentTooSmall { patent, .. }
            | PatentError::WriteFailed { patent, .. } => patent,
        }
    }
}
