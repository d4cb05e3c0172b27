//! Declared-duration probe using symphonia

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{DurationDecoder, MemoReader, MetadataError};
use crate::domain::memo::{Duration, MEMO_EXTENSION};

/// Reads the duration a container declares in its headers.
/// No audio is decoded.
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationDecoder for SymphoniaDecoder {
    fn declared_duration(&self, source: MemoReader) -> Result<Duration, MetadataError> {
        // Probing stops after the metadata blocks and the first frame header
        let source = MediaSourceStream::new(Box::new(ReadOnlySource::new(source)), Default::default());
        let mut hint = Hint::new();
        hint.with_extension(MEMO_EXTENSION);

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| MetadataError::Decode(e.to_string()))?;

        let track = probed
            .format
            .default_track()
            .ok_or_else(|| MetadataError::Decode("no audio track".to_string()))?;
        let params = &track.codec_params;

        let frames = params
            .n_frames
            .ok_or_else(|| MetadataError::Decode("length not declared".to_string()))?;
        let rate = params
            .sample_rate
            .filter(|&r| r > 0)
            .ok_or_else(|| MetadataError::Decode("sample rate not declared".to_string()))?;

        Ok(Duration::from_millis(frames * 1000 / rate as u64))
    }
}
