//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod decoder;
pub mod feedback;
pub mod permission;
pub mod playback;
pub mod storage;

// Re-export common types
pub use capture::{
    CaptureDevice, CaptureError, CaptureFormat, CaptureHandle, CaptureSettings, EncoderQuality,
};
pub use config::ConfigStore;
pub use decoder::{DurationDecoder, MetadataError};
pub use feedback::{Feedback, FeedbackCue, FeedbackError};
pub use permission::PermissionAuthority;
pub use playback::{PlaybackCompletion, PlaybackDevice, PlaybackError, PlaybackHandle};
pub use storage::{Filesystem, MemoReader, StorageError};
