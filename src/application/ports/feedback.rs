//! Feedback port for tactile/audible cues
//!
//! Fire-and-forget: callers ignore failures.

use async_trait::async_trait;
use thiserror::Error;

/// Moments that get a feedback cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCue {
    RecordingStarted,
    RecordingStopped,
    ItemSelected,
}

/// Errors that can occur while delivering a cue
#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Cue playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Feedback device not available: {0}")]
    DeviceNotAvailable(String),
}

/// Port trait for feedback delivery
#[async_trait]
pub trait Feedback: Send + Sync {
    /// Deliver a cue
    async fn notify(&self, cue: FeedbackCue) -> Result<(), FeedbackError>;
}
