//! Identifier input: command-line list or a text file with one id per line.

use crate::error::{PatentError, PatentFetchError};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Where the identifiers of a run come from.
#[derive(Debug, Clone)]
pub enum IdentifierSource {
    /// Identifiers given directly, e.g. as CLI arguments.
    List(Vec<String>),
    /// A text file, one identifier per line.
    File(PathBuf),
}

/// Load the identifiers of a run.
///
/// Identifiers are trimmed; blank lines and `#` comment lines are skipped
/// and repeats are dropped, keeping the first occurrence. A missing file is
/// fatal: the run must not start.
pub async fn load_identifiers(source: &IdentifierSource) -> Result<Vec<String>, PatentFetchError> {
    match source {
        IdentifierSource::List(ids) => Ok(normalise(ids.iter().map(String::as_str))),
        IdentifierSource::File(path) => {
            let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    PatentFetchError::InputNotFound { path: path.clone() }
                } else {
                    PatentFetchError::InputReadFailed {
                        path: path.clone(),
                        source: e,
                    }
                }
            })?;
            let ids = parse_identifier_lines(&text);
            debug!("Read {} identifiers from {}", ids.len(), path.display());
            Ok(ids)
        }
    }
}

/// Check that `id` can name files in the output directory and a URL path
/// segment.
///
/// Only ASCII letters, digits, `-`, `_` and `.` are accepted, and the id
/// may not start with `.`. This rules out path separators, `..` and the URL
/// delimiters `?`, `#` and `%`.
pub fn check_identifier(id: &str) -> Result<(), PatentError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if id.is_empty() || id.starts_with('.') || !id.chars().all(allowed) {
        return Err(PatentError::MalformedIdentifier {
            patent: id.to_string(),
        });
    }
    Ok(())
}

/// Parse the contents of an identifier file.
pub fn parse_identifier_lines(text: &str) -> Vec<String> {
    normalise(text.lines())
}

fn normalise<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.map(str::trim)
        .filter(|id| !id.is_empty() && !id.starts_with('#'))
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}
