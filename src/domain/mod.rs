//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod memo;
pub mod session;

// Re-export common types
pub use config::{AppConfig, PermissionPolicy};
pub use error::*;
pub use memo::{Duration, Recording, RecordingId};
pub use session::{InvalidStateTransition, Session, SessionMode, SessionState};
