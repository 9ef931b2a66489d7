#![forbid(unsafe_code)]

//! Per-request temp files: naming, discovery and removal.
//!
//! yt-dlp picks the final extension itself, so the tool is handed a template
//! (`<id>.%(ext)s`) and the file is found again by recomputing the extension
//! the requested format always converts to.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::request::MediaFormat;

/// Placeholder yt-dlp substitutes with the chosen extension.
pub const EXT_PLACEHOLDER: &str = "%(ext)s";

#[derive(Debug, Clone)]
pub struct TempArtifact {
    id: Uuid,
    dir: PathBuf,
    format: MediaFormat,
}

impl TempArtifact {
    pub fn new(dir: impl Into<PathBuf>, format: MediaFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            dir: dir.into(),
            format,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn format(&self) -> MediaFormat {
        self.format
    }

    pub fn output_template(&self) -> PathBuf {
        self.dir.join(format!("{}.{EXT_PLACEHOLDER}", self.id))
    }

    pub fn expected_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.id, self.format.extension()))
    }

    /// Takes ownership of the converted file. A clean exit without the file
    /// on disk is an inconsistency and is reported, not retried.
    pub async fn locate(&self) -> Result<TempFile> {
        let path = self.expected_path();
        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        tracing::info!(path = %path.display(), exists, "looked for output file");
        if exists {
            Ok(TempFile::new(path))
        } else {
            Err(Error::OutputMissing { path })
        }
    }

    /// Removes anything the tool left under this id (`.part` files, unmerged
    /// streams). Best-effort and synchronous so it can run from `Drop`.
    pub fn discard_leftovers(&self) {
        let prefix = format!("{}.", self.id);
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = %self.dir.display(), error = %err, "could not scan temp dir");
                return;
            }
        };
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            let path = entry.path();
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed leftover"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to remove leftover")
                }
            }
        }
    }
}

/// Owns a file on disk and deletes it when dropped.
///
/// Travels with the response body, so the file goes away when the stream
/// closes, whether the client read it all or hung up.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Drop cannot await; a single unlink is fine on a runtime thread.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed temp file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to clean up temp file")
            }
        }
    }
}
