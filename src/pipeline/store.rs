//! On-disk artifact storage for the fetch cache.
//!
//! Writes never leave a half-written artifact under its final name. The
//! metadata file goes through a `.tmp` sibling and a rename. The document
//! is staged into a [`NamedTempFile`] inside the output directory and only
//! renamed into place by [`StagedDocument::commit`]. Dropping an uncommitted
//! stage deletes the temp file.

use crate::error::PatentError;
use crate::pipeline::source::DocumentDownload;
use crate::record::{parse_metadata, MetadataRecord};
use futures::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Whether a usable document exists at `path`.
///
/// A file smaller than `min_bytes` is deleted so the next fetch replaces it.
/// Any metadata error other than "not found" is logged and treated as absent.
pub async fn document_is_valid(path: &Path, min_bytes: u64) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() >= min_bytes => true,
        Ok(meta) if meta.is_file() => {
            warn!(
                "Removing truncated document {} ({} bytes < {})",
                path.display(),
                meta.len(),
                min_bytes
            );
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
            false
        }
        Ok(_) => false,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Cannot stat {}: {}", path.display(), e);
            false
        }
    }
}

/// Read and tolerantly parse a stored metadata file.
///
/// Only fails when the file cannot be read as UTF-8 text.
pub async fn read_metadata(path: &Path, id: &str) -> io::Result<MetadataRecord> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_metadata(&text, id))
}

/// Atomically write `record` to `path`.
pub async fn write_metadata(path: &Path, record: &MetadataRecord) -> Result<(), PatentError> {
    let write_err = |e: io::Error| PatentError::WriteFailed {
        patent: record.patent_number.clone(),
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, record.to_metadata_text())
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    debug!("Patent information saved to {}", path.display());
    Ok(())
}

/// A fully downloaded document waiting to be moved to its final path.
#[derive(Debug)]
pub struct StagedDocument {
    temp: NamedTempFile,
    patent: String,
    path: PathBuf,
    bytes: u64,
}

impl StagedDocument {
    /// Bytes downloaded.
    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Rename the staged file to its final path, replacing any existing file.
    pub fn commit(self) -> Result<u64, PatentError> {
        let Self {
            temp,
            patent,
            path,
            bytes,
        } = self;
        temp.persist(&path).map_err(|e| PatentError::WriteFailed {
            patent,
            path: path.clone(),
            detail: e.error.to_string(),
        })?;
        debug!("PDF saved to {} ({} bytes)", path.display(), bytes);
        Ok(bytes)
    }
}

/// Stream `download` into a temp file next to `path`.
///
/// `on_chunk` receives the running byte count and the announced total.
/// Fails with [`PatentError::DocumentTooSmall`] when fewer than `min_bytes`
/// arrived, since such a file would be discarded on the next run anyway.
pub async fn stage_document(
    id: &str,
    path: &Path,
    mut download: DocumentDownload,
    min_bytes: u64,
    mut on_chunk: impl FnMut(u64, Option<u64>),
) -> Result<StagedDocument, PatentError> {
    let write_err = |e: io::Error| PatentError::WriteFailed {
        patent: id.to_string(),
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(write_err)?;
    let mut file = tokio::fs::File::from_std(temp.reopen().map_err(write_err)?);

    let mut bytes = 0u64;
    while let Some(chunk) = download.chunks.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(write_err)?;
        bytes += chunk.len() as u64;
        on_chunk(bytes, download.content_length);
    }
    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    if bytes < min_bytes {
        return Err(PatentError::DocumentTooSmall {
            patent: id.to_string(),
            bytes,
            min: min_bytes,
        });
    }

    Ok(StagedDocument {
        temp,
        patent: id.to_string(),
        path: path.to_path_buf(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn download(chunks: Vec<Vec<u8>>) -> DocumentDownload {
        let total = chunks.iter().map(|c| c.len() as u64).sum();
        DocumentDownload {
            content_length: Some(total),
            chunks: stream::iter(chunks.into_iter().map(Ok)).boxed(),
        }
    }

    #[tokio::test]
    async fn small_document_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1.pdf");
        std::fs::write(&path, b"0123456789").unwrap();

        assert!(!document_is_valid(&path, 1024).await);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn large_document_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1.pdf");
        std::fs::write(&path, vec![b'x'; 1024]).unwrap();

        assert!(document_is_valid(&path, 1024).await);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn missing_document_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!document_is_valid(&dir.path().join("nope.pdf"), 1024).await);
    }

    #[tokio::test]
    async fn staged_document_appears_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1.pdf");
        let mut seen = Vec::new();

        let staged = stage_document(
            "US1",
            &path,
            download(vec![vec![1; 600], vec![2; 600]]),
            1024,
            |n, total| seen.push((n, total)),
        )
        .await
        .unwrap();

        assert_eq!(staged.len(), 1200);
        assert!(!path.exists());
        assert_eq!(seen, vec![(600, Some(1200)), (1200, Some(1200))]);

        assert_eq!(staged.commit().unwrap(), 1200);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1200);
    }

    #[tokio::test]
    async fn dropped_stage_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1.pdf");

        let staged = stage_document("US1", &path, download(vec![vec![0; 2048]]), 1024, |_, _| {})
            .await
            .unwrap();
        drop(staged);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn short_download_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1.pdf");

        let err = stage_document("US1", &path, download(vec![vec![0; 10]]), 1024, |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, PatentError::DocumentTooSmall { bytes: 10, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn metadata_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1_info.txt");
        let record = parse_metadata("Patent Number: US1\nTitle: Gadget\n", "US1");

        write_metadata(&path, &record).await.unwrap();

        assert_eq!(read_metadata(&path, "US1").await.unwrap(), record);
        assert!(!path.with_extension("txt.tmp").exists());
    }

    #[tokio::test]
    async fn unreadable_metadata_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US1_info.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert!(read_metadata(&path, "US1").await.is_err());
    }
}
