//! Batch reporter: one CSV summary per run.

use crate::error::PatentFetchError;
use crate::record::MetadataRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column headers of the summary file.
pub const REPORT_HEADER: [&str; 3] = ["Patent Number", "Publication Date", "Abstract"];

static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\r\n]\s*").unwrap());

/// Collapse every line break, and the whitespace around it, into one space.
pub fn flatten_abstract(text: &str) -> String {
    RE_LINE_BREAKS.replace_all(text.trim(), " ").into_owned()
}

/// Render the summary CSV for `records`.
pub fn render_report(records: &[MetadataRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;
    for record in records {
        writer.write_record([
            record.patent_number.as_str(),
            record.publication_date.as_str(),
            flatten_abstract(&record.abstract_text).as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Write the summary for `records` to `path`, replacing any previous file.
///
/// With no records nothing is written and `Ok(None)` is returned.
pub async fn write_report(
    records: &[MetadataRecord],
    path: &Path,
) -> Result<Option<PathBuf>, PatentFetchError> {
    if records.is_empty() {
        info!("No patents were collected; skipping report {}", path.display());
        return Ok(None);
    }

    let fail = |detail: String| PatentFetchError::ReportWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let body = render_report(records).map_err(|e| fail(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| fail(e.to_string()))?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, &body)
        .await
        .map_err(|e| fail(e.to_string()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| fail(e.to_string()))?;

    info!("Report with {} patents saved to {}", records.len(), path.display());
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, abstract_text: &str) -> MetadataRecord {
        MetadataRecord {
            patent_number: id.into(),
            title: "T".into(),
            filing_date: "2019-01-01".into(),
            publication_date: "2020-02-02".into(),
            inventors: vec![],
            abstract_text: abstract_text.into(),
        }
    }

    #[test]
    fn flatten_collapses_line_breaks() {
        assert_eq!(flatten_abstract("one\ntwo"), "one two");
        assert_eq!(flatten_abstract("one  \r\n\r\n   two\nthree\n"), "one two three");
        assert_eq!(flatten_abstract("no breaks  here"), "no breaks  here");
    }

    #[tokio::test]
    async fn empty_run_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/summary.csv");

        assert!(write_report(&[], &path).await.unwrap().is_none());
        assert!(!path.exists());
        assert!(!dir.path().join("reports").exists());
    }

    #[tokio::test]
    async fn one_row_per_record_plus_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/summary.csv");
        let records = vec![
            record("US1", "First line\nsecond line"),
            record("US2", "Plain"),
            record("US3", "Has, a comma"),
        ];

        let written = write_report(&records, &path).await.unwrap();

        assert_eq!(written.as_deref(), Some(path.as_path()));
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Patent Number,Publication Date,Abstract");
        assert_eq!(lines[1], "US1,2020-02-02,First line second line");
        assert_eq!(lines[2], "US2,2020-02-02,Plain");
        assert_eq!(lines[3], "US3,2020-02-02,\"Has, a comma\"");
    }

    #[tokio::test]
    async fn existing_report_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        std::fs::write(&path, "stale\nstale\nstale\nstale\n").unwrap();

        write_report(&[record("US1", "x")], &path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
