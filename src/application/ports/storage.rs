//! Filesystem port interface

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to load recordings: {0}")]
    ListFailed(String),

    #[error("Delete failed: {0}")]
    RemoveFailed(String),

    #[error("Failed to stat {path}: {message}")]
    StatFailed { path: String, message: String },

    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to create storage directory: {0}")]
    CreateDirFailed(String),
}

/// Streaming handle on a stored memo
pub type MemoReader = Box<dyn Read + Send + Sync>;

/// Port for the filesystem the memo catalog lives on
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// List the entries of a directory (full paths)
    async fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;

    /// Create a directory and its parents if missing
    async fn create_dir_all(&self, dir: &Path) -> Result<(), StorageError>;

    /// Remove a file
    async fn remove(&self, path: &Path) -> Result<(), StorageError>;

    /// Size of a file in bytes
    async fn stat_size(&self, path: &Path) -> Result<u64, StorageError>;

    /// Creation time of a file
    async fn stat_creation_time(&self, path: &Path) -> Result<DateTime<Utc>, StorageError>;

    /// Open a file for reading. Callers pull only the bytes they need.
    async fn open(&self, path: &Path) -> Result<MemoReader, StorageError>;
}
