//! Memo metadata extraction

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::memo::Duration;

use super::ports::{DurationDecoder, Filesystem, MetadataError};

/// Metadata derived from a stored memo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoMetadata {
    pub created_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Derives creation time and duration from a stored memo.
///
/// Lenient: a missing creation time falls back to now and an undecodable
/// container yields a zero duration. Only an unreadable file is an error.
pub struct MetadataExtractor<F, D> {
    fs: Arc<F>,
    decoder: D,
}

impl<F: Filesystem, D: DurationDecoder> MetadataExtractor<F, D> {
    pub fn new(fs: Arc<F>, decoder: D) -> Self {
        Self { fs, decoder }
    }

    /// Extract metadata for the memo at `location`
    pub async fn extract(&self, location: &Path) -> Result<MemoMetadata, MetadataError> {
        let source = self
            .fs
            .open(location)
            .await
            .map_err(|e| MetadataError::Unreadable(e.to_string()))?;

        let created_at = self
            .fs
            .stat_creation_time(location)
            .await
            .unwrap_or_else(|_| Utc::now());

        let duration = self.decoder.declared_duration(source).unwrap_or_else(|e| {
            debug!(location = %location.display(), error = %e, "Undecodable memo, using zero duration");
            Duration::ZERO
        });

        Ok(MemoMetadata {
            created_at,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeDecoder, MemoryFilesystem};
    use chrono::TimeZone;

    #[tokio::test]
    async fn extracts_creation_time_and_duration() {
        let fs = Arc::new(MemoryFilesystem::new());
        let created = Utc.timestamp_opt(1_000, 0).single().unwrap();
        fs.insert_at("/memos/memo_1.flac", b"2500", created);

        let extractor = MetadataExtractor::new(Arc::clone(&fs), FakeDecoder);
        let meta = extractor.extract(Path::new("/memos/memo_1.flac")).await.unwrap();

        assert_eq!(meta.created_at, created);
        assert_eq!(meta.duration, Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn corrupt_container_has_zero_duration() {
        let fs = Arc::new(MemoryFilesystem::new());
        fs.insert("/memos/memo_1.flac", b"garbage");

        let extractor = MetadataExtractor::new(Arc::clone(&fs), FakeDecoder);
        let meta = extractor.extract(Path::new("/memos/memo_1.flac")).await.unwrap();

        assert_eq!(meta.duration, Duration::ZERO);
    }

    #[tokio::test]
    async fn missing_creation_time_falls_back_to_now() {
        let fs = Arc::new(MemoryFilesystem::new());
        fs.insert("/memos/memo_1.flac", b"1000");
        fs.forget_creation_time("/memos/memo_1.flac");

        let before = Utc::now();
        let extractor = MetadataExtractor::new(Arc::clone(&fs), FakeDecoder);
        let meta = extractor.extract(Path::new("/memos/memo_1.flac")).await.unwrap();

        assert!(meta.created_at >= before);
    }

    #[tokio::test]
    async fn large_memo_is_not_read_in_full() {
        let fs = Arc::new(MemoryFilesystem::new());
        let mut body = b"2500".to_vec();
        body.resize(20 * 1024 * 1024, 0);
        fs.insert("/memos/memo_1.flac", &body);

        let extractor = MetadataExtractor::new(Arc::clone(&fs), FakeDecoder);
        let meta = extractor.extract(Path::new("/memos/memo_1.flac")).await.unwrap();

        assert_eq!(meta.duration, Duration::from_millis(2500));
        assert!(fs.bytes_read() < 1024);
    }

    #[tokio::test]
    async fn unreadable_file_is_an_error() {
        let fs = Arc::new(MemoryFilesystem::new());
        let extractor = MetadataExtractor::new(Arc::clone(&fs), FakeDecoder);

        let err = extractor
            .extract(Path::new("/memos/missing.flac"))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Unreadable(_)));
    }
}
