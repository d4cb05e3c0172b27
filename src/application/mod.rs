//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod catalog;
pub mod metadata;
pub mod ports;
pub mod session;

#[cfg(test)]
pub mod testing;

// Re-export use cases
pub use catalog::CatalogStore;
pub use metadata::{MemoMetadata, MetadataExtractor};
pub use session::{SessionConfig, SessionError, SessionManager, SessionSnapshot};
