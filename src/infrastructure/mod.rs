//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio devices, the filesystem and the terminal.

pub mod capture;
pub mod config;
pub mod feedback;
pub mod metadata;
pub mod permission;
pub mod playback;
pub mod storage;
pub mod terminal;

// Re-export adapters
pub use capture::CpalCaptureDevice;
pub use config::XdgConfigStore;
pub use feedback::{create_feedback, NoOpFeedback, RodioFeedback};
pub use metadata::SymphoniaDecoder;
pub use permission::{create_permission_authority, FixedPermission, PromptPermission};
pub use playback::RodioPlaybackDevice;
pub use storage::LocalFilesystem;
pub use terminal::LineInput;
