//! Memo values and the recording entity

pub mod duration;
pub mod recording;

pub use duration::Duration;
pub use recording::{is_memo_file, kilobytes, memo_file_name, Recording, RecordingId, MEMO_EXTENSION};
