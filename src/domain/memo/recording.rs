//! Recording entity

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone, Utc};
use uuid::Uuid;

use super::duration::Duration;

/// File extension of stored memos
pub const MEMO_EXTENSION: &str = "flac";

/// Filename prefix of stored memos
pub const MEMO_PREFIX: &str = "memo_";

/// Build the file name for a memo allocated at the given unix time.
/// Two allocations within the same second produce the same name.
pub fn memo_file_name(unix_secs: i64) -> String {
    format!("{}{}.{}", MEMO_PREFIX, unix_secs, MEMO_EXTENSION)
}

/// Whether a path looks like a memo the catalog should pick up:
/// recognized extension and not hidden.
pub fn is_memo_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));

    !hidden
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == MEMO_EXTENSION)
}

/// Whole kilobytes for a byte count (floor)
pub const fn kilobytes(bytes: u64) -> u64 {
    bytes / 1024
}

/// Opaque recording identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId(Uuid);

impl RecordingId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A saved voice memo. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    id: RecordingId,
    location: PathBuf,
    created_at: DateTime<Utc>,
    duration: Duration,
}

impl Recording {
    /// Create a recording with a fresh identifier
    pub fn new(location: impl Into<PathBuf>, created_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id: RecordingId::new(),
            location: location.into(),
            created_at,
            duration,
        }
    }

    pub fn id(&self) -> RecordingId {
        self.id
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// File name without extension
    pub fn name(&self) -> String {
        self.location
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Short date and time in the local timezone
    pub fn date_string(&self) -> String {
        self.date_string_in(&Local)
    }

    /// Short date and time in the given timezone, e.g. `2/8/26, 3:04 PM`
    pub fn date_string_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        self.created_at
            .with_timezone(tz)
            .format("%-m/%-d/%y, %-I:%M %p")
            .to_string()
    }

    /// Duration as `m:ss`
    pub fn duration_string(&self) -> String {
        self.duration.to_string()
    }
}
