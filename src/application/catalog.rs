//! File-backed memo catalog

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::memo::{is_memo_file, kilobytes, memo_file_name, Recording};

use super::metadata::MetadataExtractor;
use super::ports::{DurationDecoder, Filesystem, StorageError};

/// Catalog of memos stored as one file each in a flat directory
pub struct CatalogStore<F, D> {
    fs: Arc<F>,
    extractor: MetadataExtractor<F, D>,
    dir: PathBuf,
}

impl<F: Filesystem, D: DurationDecoder> CatalogStore<F, D> {
    /// Create a catalog over `dir`
    pub fn new(fs: Arc<F>, decoder: D, dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor: MetadataExtractor::new(Arc::clone(&fs), decoder),
            fs,
            dir: dir.into(),
        }
    }

    /// Storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if missing
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        self.fs.create_dir_all(&self.dir).await
    }

    /// Scan the storage directory.
    ///
    /// # Returns
    /// One recording per memo file, newest first. Files whose metadata
    /// cannot be extracted are skipped.
    pub async fn list_all(&self) -> Result<Vec<Recording>, StorageError> {
        self.ensure_dir().await?;
        let entries = self.fs.list_directory(&self.dir).await?;

        let mut recordings = Vec::new();
        for path in entries.into_iter().filter(|p| is_memo_file(p)) {
            match self.extractor.extract(&path).await {
                Ok(meta) => recordings.push(Recording::new(path, meta.created_at, meta.duration)),
                Err(e) => {
                    debug!(location = %path.display(), error = %e, "Skipping memo");
                }
            }
        }

        recordings.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        info!(dir = %self.dir.display(), count = recordings.len(), "Catalog loaded");
        Ok(recordings)
    }

    /// Remove the memo's backing file
    pub async fn delete(&self, recording: &Recording) -> Result<(), StorageError> {
        self.fs.remove(recording.location()).await.inspect_err(|e| {
            warn!(location = %recording.location().display(), error = %e, "Delete failed");
        })?;
        info!(location = %recording.location().display(), "Memo deleted");
        Ok(())
    }

    /// Allocate a file location named after the current unix second.
    /// Not deduplicated: two allocations in the same second collide.
    pub fn new_location(&self) -> PathBuf {
        self.dir.join(memo_file_name(Utc::now().timestamp()))
    }

    /// Size of a memo file in bytes
    pub async fn size_bytes(&self, location: &Path) -> Result<u64, StorageError> {
        self.fs.stat_size(location).await
    }

    /// Size in whole kilobytes; 0 if the file is missing or unreadable
    pub async fn size_kb(&self, recording: &Recording) -> u64 {
        self.size_bytes(recording.location())
            .await
            .map(kilobytes)
            .unwrap_or(0)
    }
}
