//! Microphone capture adapters
//!
//! cpal for input, rubato to reach the memo rate, flacenc for storage.

mod cpal_capture;
mod flac_encoder;

pub use cpal_capture::{CpalCapture, CpalCaptureDevice};
pub use flac_encoder::{encode_to_flac, EncodingError};
