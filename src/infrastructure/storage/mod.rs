//! Storage adapters

mod local_fs;

pub use local_fs::LocalFilesystem;
