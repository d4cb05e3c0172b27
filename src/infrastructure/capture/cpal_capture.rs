//! Cross-platform microphone capture using cpal
//!
//! Samples are buffered in memory as mono i16 at the device rate. On stop
//! they are resampled to the memo rate, FLAC-encoded and written to the
//! memo's location.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex as StdMutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::fs;
use tracing::{debug, info, warn};

use super::flac_encoder::encode_to_flac;
use crate::application::ports::{CaptureDevice, CaptureError, CaptureHandle, CaptureSettings};

/// Opens capture sessions on the default input device
pub struct CpalCaptureDevice;

impl CpalCaptureDevice {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for CpalCaptureDevice {
    async fn open(
        &self,
        location: &Path,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        // Fail early if there is nothing to capture from
        tokio::task::spawn_blocking(|| get_input_device().map(|_| ()))
            .await
            .map_err(|e| CaptureError::OpenFailed(format!("Task join error: {}", e)))??;

        Ok(Box::new(CpalCapture::new(location.to_path_buf(), *settings)))
    }
}

/// One capture into one memo file.
///
/// The cpal stream lives on its own thread because `cpal::Stream` is not `Send`.
pub struct CpalCapture {
    location: PathBuf,
    settings: CaptureSettings,
    /// Mono samples at the device rate
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    is_recording: Arc<AtomicBool>,
    device_sample_rate: u32,
    thread: Option<JoinHandle<()>>,
}

impl CpalCapture {
    fn new(location: PathBuf, settings: CaptureSettings) -> Self {
        Self {
            location,
            settings,
            audio_buffer: Arc::new(StdMutex::new(Vec::new())),
            is_recording: Arc::new(AtomicBool::new(false)),
            device_sample_rate: 0,
            thread: None,
        }
    }

    /// Encode and write the buffered samples
    async fn finish(&mut self) -> Result<PathBuf, CaptureError> {
        let samples = {
            let mut buffer = self
                .audio_buffer
                .lock()
                .map_err(|_| CaptureError::StopFailed("Audio buffer poisoned".into()))?;
            std::mem::take(&mut *buffer)
        };
        debug!(samples = samples.len(), rate = self.device_sample_rate, "Capture buffer drained");

        let source_rate = self.device_sample_rate;
        let settings = self.settings;
        let encoded = tokio::task::spawn_blocking(move || {
            let resampled = resample(&samples, source_rate, settings.sample_rate)?;
            encode_to_flac(&resampled, settings.sample_rate, settings.quality)
                .map_err(|e| CaptureError::EncodeFailed(e.to_string()))
        })
        .await
        .map_err(|e| CaptureError::EncodeFailed(format!("Encode task error: {}", e)))??;

        if let Some(parent) = self.location.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CaptureError::WriteFailed(e.to_string()))?;
        }
        fs::write(&self.location, &encoded)
            .await
            .map_err(|e| CaptureError::WriteFailed(e.to_string()))?;

        info!(location = %self.location.display(), bytes = encoded.len(), "Memo written");
        Ok(self.location.clone())
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.is_recording.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaptureHandle for CpalCapture {
    async fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(CaptureError::StartFailed(
                "Recording already in progress".to_string(),
            ));
        }
        self.is_recording.store(true, Ordering::SeqCst);

        let audio_buffer = Arc::clone(&self.audio_buffer);
        let is_recording = Arc::clone(&self.is_recording);
        let target_rate = self.settings.sample_rate;
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, CaptureError>>();

        let thread = std::thread::spawn(move || {
            let stream = match open_stream(audio_buffer, Arc::clone(&is_recording), target_rate) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    stream
                }
                Err(e) => {
                    is_recording.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Keep the stream alive until stopped
            while is_recording.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(20));
            }
            drop(stream);
        });

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| CaptureError::StartFailed(format!("Task join error: {}", e)))?
            .map_err(|_| CaptureError::StartFailed("Capture thread exited".into()));

        match ready {
            Ok(Ok(rate)) => {
                self.device_sample_rate = rate;
                self.thread = Some(thread);
                debug!(rate, "Capture stream running");
                Ok(())
            }
            Ok(Err(e)) | Err(e) => {
                self.is_recording.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> Result<PathBuf, CaptureError> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| CaptureError::StopFailed("No recording in progress".to_string()))?;
        self.is_recording.store(false, Ordering::SeqCst);

        tokio::task::spawn_blocking(move || thread.join())
            .await
            .map_err(|e| CaptureError::StopFailed(format!("Task join error: {}", e)))?
            .map_err(|_| CaptureError::StopFailed("Capture thread panicked".into()))?;

        self.finish().await
    }
}

/// Get the default input device
fn get_input_device() -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();
    host.default_input_device()
        .ok_or(CaptureError::NoInputDevice)
}

/// Pick a supported input configuration, preferring fewer channels and the memo rate
fn get_input_config(
    device: &cpal::Device,
    target_rate: u32,
) -> Result<(StreamConfig, SampleFormat), CaptureError> {
    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| CaptureError::OpenFailed(format!("Failed to get configs: {}", e)))?;

    let includes = |c: &cpal::SupportedStreamConfigRange| {
        c.min_sample_rate().0 <= target_rate && c.max_sample_rate().0 >= target_rate
    };

    let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;
    for config in supported_configs {
        if config.sample_format() != SampleFormat::I16
            && config.sample_format() != SampleFormat::F32
        {
            continue;
        }

        let is_better = match &best_config {
            None => true,
            Some(current) => {
                let fewer_channels = config.channels() < current.channels();
                let better_rate = includes(&config) && !includes(current);
                fewer_channels || better_rate
            }
        };
        if is_better {
            best_config = Some(config);
        }
    }

    let config_range = best_config.ok_or(CaptureError::OpenFailed(
        "No suitable config found".into(),
    ))?;

    let sample_rate = if includes(&config_range) {
        SampleRate(target_rate)
    } else {
        config_range.min_sample_rate()
    };

    let sample_format = config_range.sample_format();
    let config = StreamConfig {
        channels: config_range.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    Ok((config, sample_format))
}

/// Build and start an input stream feeding `audio_buffer`
fn open_stream(
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    is_recording: Arc<AtomicBool>,
    target_rate: u32,
) -> Result<(cpal::Stream, u32), CaptureError> {
    let device = get_input_device()?;
    let (config, sample_format) = get_input_config(&device, target_rate)?;
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;

    let on_error = |err: cpal::StreamError| warn!(error = %err, "Audio stream error");

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if is_recording.load(Ordering::SeqCst) {
                    let mono = downmix(data, channels);
                    if let Ok(mut buffer) = audio_buffer.lock() {
                        buffer.extend_from_slice(&mono);
                    }
                }
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if is_recording.load(Ordering::SeqCst) {
                    let i16_data: Vec<i16> = data.iter().map(|&s| (s * 32767.0) as i16).collect();
                    let mono = downmix(&i16_data, channels);
                    if let Ok(mut buffer) = audio_buffer.lock() {
                        buffer.extend_from_slice(&mono);
                    }
                }
            },
            on_error,
            None,
        ),
        _ => {
            return Err(CaptureError::OpenFailed(
                "Unsupported sample format".into(),
            ))
        }
    }
    .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

    Ok((stream, sample_rate))
}

/// Average interleaved channels down to mono
fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Resample mono audio from `source_rate` to `target_rate`
fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Result<Vec<i16>, CaptureError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| CaptureError::EncodeFailed(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());
        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        // Zero-pad the final chunk
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| CaptureError::EncodeFailed(format!("Resampling failed: {}", e)))?;

        output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}
