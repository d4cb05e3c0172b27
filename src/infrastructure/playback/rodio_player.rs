//! Memo playback using rodio
//!
//! Each playback owns an output stream on a dedicated thread, since
//! `rodio::OutputStream` is not `Send`. The thread signals the completion
//! channel when the sink drains on its own; an explicit stop does not.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::debug;

use crate::application::ports::{
    PlaybackCompletion, PlaybackDevice, PlaybackError, PlaybackHandle,
};

/// How often the playback thread checks for stop or end-of-media
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Opens memos on the default output device
pub struct RodioPlaybackDevice;

impl RodioPlaybackDevice {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlaybackDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackDevice for RodioPlaybackDevice {
    async fn open(&self, location: &Path) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let path = location.to_path_buf();
        // Probe the container up front so a bad file fails before the device is touched
        tokio::task::spawn_blocking(move || open_decoder(&path).map(|_| ()))
            .await
            .map_err(|e| PlaybackError::OpenFailed(format!("Task join error: {}", e)))??;

        Ok(Box::new(RodioPlayer {
            location: location.to_path_buf(),
            stop_requested: Arc::new(AtomicBool::new(false)),
            thread: None,
        }))
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
    let file = File::open(path).map_err(|e| PlaybackError::OpenFailed(e.to_string()))?;
    Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::DecodeFailed(e.to_string()))
}

/// One playback of one memo
pub struct RodioPlayer {
    location: PathBuf,
    stop_requested: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlaybackHandle for RodioPlayer {
    async fn play(&mut self) -> Result<PlaybackCompletion, PlaybackError> {
        if self.thread.is_some() {
            return Err(PlaybackError::PlayFailed("Already playing".to_string()));
        }

        let (done_tx, done_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();
        let location = self.location.clone();
        let stop_requested = Arc::clone(&self.stop_requested);

        let thread = std::thread::spawn(move || {
            let (_stream, sink) = match start_sink(&location) {
                Ok(playing) => {
                    let _ = ready_tx.send(Ok(()));
                    playing
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                if stop_requested.load(Ordering::SeqCst) {
                    sink.stop();
                    break;
                }
                if sink.empty() {
                    debug!(location = %location.display(), "End of media");
                    let _ = done_tx.send(());
                    break;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        });

        tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| PlaybackError::PlayFailed(format!("Task join error: {}", e)))?
            .map_err(|_| PlaybackError::PlayFailed("Playback thread exited".to_string()))??;

        self.thread = Some(thread);
        Ok(done_rx)
    }

    async fn stop(&mut self) -> Result<(), PlaybackError> {
        self.stop_requested.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| PlaybackError::PlayFailed(format!("Task join error: {}", e)))?
                .map_err(|_| PlaybackError::PlayFailed("Playback thread panicked".to_string()))?;
        }
        Ok(())
    }
}

/// Open the output device and queue the memo
fn start_sink(location: &Path) -> Result<(OutputStream, Sink), PlaybackError> {
    let (stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::NoOutputDevice(e.to_string()))?;
    let sink =
        Sink::try_new(&stream_handle).map_err(|e| PlaybackError::PlayFailed(e.to_string()))?;
    sink.append(open_decoder(location)?);
    Ok((stream, sink))
}
