//! Audio capture port interfaces

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("Failed to open input device: {0}")]
    OpenFailed(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Failed to stop capture: {0}")]
    StopFailed(String),

    #[error("Failed to encode audio: {0}")]
    EncodeFailed(String),

    #[error("Failed to write memo file: {0}")]
    WriteFailed(String),
}

/// Encoder quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// Stored audio format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureFormat {
    /// Compressed, lossless
    #[default]
    Flac,
}

/// Fixed capture settings for memos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub channels: u16,
    pub sample_rate: u32,
    pub format: CaptureFormat,
    pub quality: EncoderQuality,
}

impl CaptureSettings {
    /// Mono, 44.1kHz, FLAC, medium quality
    pub const fn memo() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
            format: CaptureFormat::Flac,
            quality: EncoderQuality::Medium,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::memo()
    }
}

/// An opened capture session bound to one output file
#[async_trait]
pub trait CaptureHandle: Send {
    /// Begin capturing audio
    async fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing and finalize the file.
    ///
    /// # Returns
    /// The location of the written memo
    async fn stop(&mut self) -> Result<PathBuf, CaptureError>;
}

/// Port for the physical audio input device
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Configure the device for capture into `location`.
    async fn open(
        &self,
        location: &Path,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}
