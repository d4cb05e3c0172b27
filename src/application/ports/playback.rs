//! Audio playback port interfaces

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("No audio output device available: {0}")]
    NoOutputDevice(String),

    #[error("Failed to open memo: {0}")]
    OpenFailed(String),

    #[error("Failed to decode memo: {0}")]
    DecodeFailed(String),

    #[error("Failed to start playback: {0}")]
    PlayFailed(String),
}

/// Resolves once when playback reaches end-of-media.
/// The sender is dropped without sending if playback is stopped first.
pub type PlaybackCompletion = oneshot::Receiver<()>;

/// An opened memo, ready to play
#[async_trait]
pub trait PlaybackHandle: Send {
    /// Begin playback
    async fn play(&mut self) -> Result<PlaybackCompletion, PlaybackError>;

    /// Stop playback and release the output device.
    /// Returns once no more audio from this handle will be produced.
    async fn stop(&mut self) -> Result<(), PlaybackError>;
}

/// Port for the physical audio output device
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    /// Configure the device for output of the memo at `location`
    async fn open(&self, location: &Path) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}
