//! Rodio-based feedback adapter
//!
//! Plays short synthesized chimes on state changes.

use std::time::Duration;

use async_trait::async_trait;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};

use crate::application::ports::{Feedback, FeedbackCue, FeedbackError};

/// Feedback implementation using rodio
pub struct RodioFeedback;

impl RodioFeedback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioFeedback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Feedback for RodioFeedback {
    async fn notify(&self, cue: FeedbackCue) -> Result<(), FeedbackError> {
        tokio::task::spawn_blocking(move || play_cue_sync(cue))
            .await
            .map_err(|e| FeedbackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

/// Sine tone with a short fade in
fn gentle_tone(freq: f32, duration_ms: u64, amplitude: f32) -> impl Source<Item = f32> + Send {
    let fade_ms = (duration_ms / 5).min(30);
    SineWave::new(freq)
        .take_duration(Duration::from_millis(duration_ms))
        .fade_in(Duration::from_millis(fade_ms))
        .amplify(amplitude)
}

fn play_cue_sync(cue: FeedbackCue) -> Result<(), FeedbackError> {
    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| FeedbackError::DeviceNotAvailable(e.to_string()))?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| FeedbackError::PlaybackFailed(e.to_string()))?;

    const AMP: f32 = 0.3;

    match cue {
        FeedbackCue::RecordingStarted => {
            // C5 -> E5
            sink.append(gentle_tone(523.0, 80, AMP));
            sink.append(gentle_tone(659.0, 120, AMP));
        }
        FeedbackCue::RecordingStopped => {
            // E5 -> C5
            sink.append(gentle_tone(659.0, 80, AMP));
            sink.append(gentle_tone(523.0, 120, AMP));
        }
        FeedbackCue::ItemSelected => {
            // A single soft G5 tick
            sink.append(gentle_tone(784.0, 40, AMP * 0.6));
        }
    }

    sink.sleep_until_end();
    Ok(())
}
