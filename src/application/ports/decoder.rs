//! Container decoding port interface

use thiserror::Error;

use crate::domain::memo::Duration;

use super::storage::MemoReader;

/// Metadata extraction errors. Never fatal for a listing.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error("Memo unreadable: {0}")]
    Unreadable(String),

    #[error("Failed to decode container: {0}")]
    Decode(String),
}

/// Port for reading the declared duration out of an audio container
pub trait DurationDecoder: Send + Sync {
    /// Duration declared by the container header.
    /// Reads no further into `source` than the header requires.
    fn declared_duration(&self, source: MemoReader) -> Result<Duration, MetadataError>;
}
