//! FLAC encoder for stored memos
//!
//! Lossless, 16-bit, mono. The STREAMINFO block carries the total sample
//! count, which is where a memo's declared duration is read from later.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::application::ports::EncoderQuality;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// Frame size for an encoder quality setting
fn block_size(quality: EncoderQuality) -> usize {
    match quality {
        EncoderQuality::Low => 1152,
        EncoderQuality::Medium => 4096,
        EncoderQuality::High => 4608,
    }
}

/// Encode mono PCM samples at `sample_rate` to FLAC bytes
pub fn encode_to_flac(
    pcm_samples: &[i16],
    sample_rate: u32,
    quality: EncoderQuality,
) -> Result<Vec<u8>, EncodingError> {
    if pcm_samples.is_empty() {
        return Err(EncodingError::Empty);
    }

    // flacenc works on i32
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let mut config = config::Encoder::default();
    config.block_size = block_size(quality);
    let config = config
        .into_verified()
        .map_err(|(_, e)| EncodingError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        CHANNELS,
        BITS_PER_SAMPLE,
        sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncodingError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("No audio data captured")]
    Empty,

    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),
}
