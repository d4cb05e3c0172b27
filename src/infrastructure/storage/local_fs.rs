//! Local filesystem adapter

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::application::ports::{Filesystem, MemoReader, StorageError};

/// Filesystem backed by `tokio::fs`
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

fn stat_failed(path: &Path, e: impl ToString) -> StorageError {
    StorageError::StatFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
        {
            // Entries whose type can't be read are skipped like vanished files
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::CreateDirFailed(e.to_string()))
    }

    async fn remove(&self, path: &Path) -> Result<(), StorageError> {
        fs::remove_file(path)
            .await
            .map_err(|e| StorageError::RemoveFailed(e.to_string()))
    }

    async fn stat_size(&self, path: &Path) -> Result<u64, StorageError> {
        let metadata = fs::metadata(path).await.map_err(|e| stat_failed(path, e))?;
        Ok(metadata.len())
    }

    async fn stat_creation_time(&self, path: &Path) -> Result<DateTime<Utc>, StorageError> {
        let metadata = fs::metadata(path).await.map_err(|e| stat_failed(path, e))?;
        // Not every filesystem records birth time
        let time = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| stat_failed(path, e))?;
        Ok(DateTime::<Utc>::from(time))
    }

    async fn open(&self, path: &Path) -> Result<MemoReader, StorageError> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| StorageError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Box::new(file.into_std().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn lists_only_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memo_1.flac"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = LocalFilesystem::new().list_directory(dir.path()).await.unwrap();
        assert_eq!(files, vec![dir.path().join("memo_1.flac")]);
    }

    #[tokio::test]
    async fn listing_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFilesystem::new()
            .list_directory(&dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ListFailed(_)));
    }

    #[tokio::test]
    async fn stat_open_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo_1.flac");
        std::fs::write(&path, vec![7u8; 2048]).unwrap();
        let fs = LocalFilesystem::new();

        assert_eq!(fs.stat_size(&path).await.unwrap(), 2048);
        let mut body = Vec::new();
        fs.open(&path).await.unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body.len(), 2048);
        assert!(fs.stat_creation_time(&path).await.unwrap() <= Utc::now());

        fs.remove(&path).await.unwrap();
        assert!(!path.exists());
        assert!(matches!(
            fs.remove(&path).await.unwrap_err(),
            StorageError::RemoveFailed(_)
        ));
    }

    #[tokio::test]
    async fn opening_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFilesystem::new()
            .open(&dir.path().join("memo_1.flac"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn create_dir_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let fs = LocalFilesystem::new();

        fs.create_dir_all(&nested).await.unwrap();
        fs.create_dir_all(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
