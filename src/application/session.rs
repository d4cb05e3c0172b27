//! Recording/playback session use case
//!
//! Owns the session state machine and the single physical audio device.
//! Every transition runs under one lock: user commands, recording ticks and
//! playback completion all serialize on it, so a tick or a completion that
//! races a stop finds the session already moved on and does nothing.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::memo::{Duration, Recording, RecordingId};
use crate::domain::session::{InvalidStateTransition, Session, SessionMode, SessionState, TICK};

use super::catalog::CatalogStore;
use super::ports::{
    CaptureDevice, CaptureError, CaptureHandle, CaptureSettings, DurationDecoder, Feedback,
    FeedbackCue, Filesystem, PermissionAuthority, PlaybackCompletion, PlaybackDevice,
    PlaybackError, PlaybackHandle, StorageError,
};

/// Errors from session commands. The display string is what lands in `last_error`.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Microphone permission required")]
    PermissionDenied,

    #[error("Recording failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Playback failed: {0}")]
    Playback(#[from] PlaybackError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Recording not found: {0}")]
    NotFound(RecordingId),
}

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Auto-stop a recording once it reaches this length
    pub max_duration: Option<Duration>,
    /// Capture device settings
    pub capture: CaptureSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration: Some(Duration::default_max_duration()),
            capture: CaptureSettings::memo(),
        }
    }
}

/// Read-only view of the session for the presentation layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub mode: SessionMode,
    pub recordings: Vec<Recording>,
    pub has_permission: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    fn of(session: &Session) -> Self {
        Self {
            mode: session.mode().clone(),
            recordings: session.recordings().to_vec(),
            has_permission: session.has_permission(),
            last_error: session.last_error().map(str::to_string),
        }
    }

    pub fn state(&self) -> SessionState {
        self.mode.state()
    }

    /// Elapsed recording time; zero outside recording
    pub fn elapsed(&self) -> Duration {
        match &self.mode {
            SessionMode::Recording { elapsed, .. } => *elapsed,
            _ => Duration::ZERO,
        }
    }

    pub fn active_target(&self) -> Option<RecordingId> {
        match &self.mode {
            SessionMode::Playing { target } => Some(*target),
            _ => None,
        }
    }
}

/// Session state plus the device handles only valid in some states
struct Inner {
    session: Session,
    capture: Option<Box<dyn CaptureHandle>>,
    playback: Option<Box<dyn PlaybackHandle>>,
    ticker: Option<JoinHandle<()>>,
    /// Bumped on every recording/playback start and stop; background
    /// events carry the epoch they were spawned under.
    epoch: u64,
}

struct Shared<C, P, F, D> {
    inner: Mutex<Inner>,
    capture_device: C,
    playback_device: P,
    catalog: CatalogStore<F, D>,
    feedback: Arc<dyn Feedback>,
    updates: watch::Sender<SessionSnapshot>,
    config: SessionConfig,
}

/// Session manager: the recording/playback use case
pub struct SessionManager<C, P, F, D, A> {
    shared: Arc<Shared<C, P, F, D>>,
    permission: A,
}

impl<C, P, F, D, A> SessionManager<C, P, F, D, A>
where
    C: CaptureDevice + 'static,
    P: PlaybackDevice + 'static,
    F: Filesystem + 'static,
    D: DurationDecoder + 'static,
    A: PermissionAuthority,
{
    /// Create an idle session. Call [`load_recordings`](Self::load_recordings)
    /// to populate the catalog.
    pub fn new(
        capture_device: C,
        playback_device: P,
        catalog: CatalogStore<F, D>,
        permission: A,
        feedback: Arc<dyn Feedback>,
        config: SessionConfig,
    ) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: Session::new(),
                    capture: None,
                    playback: None,
                    ticker: None,
                    epoch: 0,
                }),
                capture_device,
                playback_device,
                catalog,
                feedback,
                updates,
                config,
            }),
            permission,
        }
    }

    /// Current state without taking the session lock
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.updates.borrow().clone()
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Storage directory of the catalog
    pub fn storage_dir(&self) -> &std::path::Path {
        self.shared.catalog.dir()
    }

    /// Size of a memo in whole kilobytes; 0 if missing
    pub async fn size_kb(&self, recording: &Recording) -> u64 {
        self.shared.catalog.size_kb(recording).await
    }

    /// Ask for microphone access.
    ///
    /// The session lock is not held while waiting, so snapshots and other
    /// commands stay available.
    pub async fn request_permission(&self) -> bool {
        let granted = self.permission.request_microphone_access().await;
        let mut inner = self.shared.inner.lock().await;
        inner.session.set_permission(granted);
        info!(granted, "Microphone permission resolved");
        self.shared.publish(&inner);
        granted
    }

    /// Scan storage and replace the recordings list
    pub async fn load_recordings(&self) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = self.shared.load_locked(&mut inner).await;
        self.shared.settle(&mut inner, &result);
        result
    }

    /// IDLE -> RECORDING
    pub async fn start_recording(&self) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = self.shared.start_recording_locked(&mut inner).await;
        self.shared.settle(&mut inner, &result);
        result
    }

    /// RECORDING -> IDLE, adding the new memo at the head of the list
    pub async fn stop_recording(&self) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = self.shared.stop_recording_locked(&mut inner).await;
        self.shared.settle(&mut inner, &result);
        result
    }

    /// IDLE/PLAYING -> PLAYING. Any current playback is stopped first.
    pub async fn play(&self, id: RecordingId) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = self.shared.play_locked(&mut inner, id).await;
        self.shared.settle(&mut inner, &result);
        result
    }

    /// PLAYING -> IDLE
    pub async fn stop_playback(&self) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = self.shared.stop_playback_locked(&mut inner).await;
        self.shared.settle(&mut inner, &result);
        result
    }

    /// Remove a memo and its file. Fails without touching the list if the
    /// file cannot be removed.
    pub async fn delete_recording(&self, id: RecordingId) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = self.shared.delete_locked(&mut inner, id).await;
        self.shared.settle(&mut inner, &result);
        result
    }

    /// Dismiss the last error
    pub async fn clear_error(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.session.clear_error();
        self.shared.publish(&inner);
    }

    /// Return to IDLE: saves an in-progress recording, stops playback
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        let result = match inner.session.state() {
            SessionState::Idle => return Ok(()),
            SessionState::Recording => self.shared.stop_recording_locked(&mut inner).await,
            SessionState::Playing => self.shared.stop_playback_locked(&mut inner).await,
        };
        self.shared.settle(&mut inner, &result);
        result
    }
}

impl<C, P, F, D> Shared<C, P, F, D>
where
    C: CaptureDevice + 'static,
    P: PlaybackDevice + 'static,
    F: Filesystem + 'static,
    D: DurationDecoder + 'static,
{
    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(SessionSnapshot::of(&inner.session));
    }

    /// Record the outcome of a command and publish the new state
    fn settle(&self, inner: &mut Inner, result: &Result<(), SessionError>) {
        match result {
            Ok(()) => inner.session.clear_error(),
            Err(e) => {
                warn!(state = %inner.session.state(), error = %e, "Command failed");
                inner.session.set_error(e.to_string());
            }
        }
        self.publish(inner);
    }

    fn cue(&self, cue: FeedbackCue) {
        let feedback = Arc::clone(&self.feedback);
        tokio::spawn(async move {
            if let Err(e) = feedback.notify(cue).await {
                debug!(?cue, error = %e, "Feedback cue failed");
            }
        });
    }

    async fn load_locked(&self, inner: &mut Inner) -> Result<(), SessionError> {
        inner.session.ensure_idle("reload recordings")?;
        let recordings = self.catalog.list_all().await?;
        inner.session.replace_recordings(recordings);
        Ok(())
    }

    async fn start_recording_locked(self: &Arc<Self>, inner: &mut Inner) -> Result<(), SessionError> {
        inner.session.ensure_idle("start recording")?;
        if !inner.session.has_permission() {
            return Err(SessionError::PermissionDenied);
        }

        self.catalog.ensure_dir().await?;
        let location = self.catalog.new_location();
        let mut handle = self
            .capture_device
            .open(&location, &self.config.capture)
            .await?;
        handle.start().await?;

        inner.session.start_recording(location.clone())?;
        inner.capture = Some(handle);
        inner.epoch += 1;
        inner.ticker = Some(self.spawn_ticker(inner.epoch));

        info!(location = %location.display(), "Recording started");
        self.cue(FeedbackCue::RecordingStarted);
        Ok(())
    }

    async fn stop_recording_locked(&self, inner: &mut Inner) -> Result<(), SessionError> {
        let (location, elapsed) = inner.session.finish_recording()?;
        inner.epoch += 1;
        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }
        self.cue(FeedbackCue::RecordingStopped);

        // From here the session is idle whatever happens; failures drop the memo.
        let mut handle = inner.capture.take().ok_or_else(|| {
            CaptureError::StopFailed("no active capture".to_string())
        })?;
        let written = handle.stop().await?;
        self.catalog.size_bytes(&written).await?;

        let recording = Recording::new(written, Utc::now(), elapsed);
        info!(
            location = %location.display(),
            elapsed = %elapsed,
            id = %recording.id(),
            "Recording saved"
        );
        inner.session.insert_recording(recording);
        Ok(())
    }

    async fn play_locked(
        self: &Arc<Self>,
        inner: &mut Inner,
        id: RecordingId,
    ) -> Result<(), SessionError> {
        if inner.session.is_recording() {
            return Err(inner.session.reject("play").into());
        }
        let recording = inner
            .session
            .find(id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;

        if inner.session.is_playing() {
            self.stop_playback_locked(inner).await?;
        }

        let mut handle = self.playback_device.open(recording.location()).await?;
        let completion = handle.play().await?;

        inner.session.start_playback(id)?;
        inner.playback = Some(handle);
        inner.epoch += 1;
        self.watch_completion(completion, inner.epoch);

        info!(id = %id, location = %recording.location().display(), "Playback started");
        self.cue(FeedbackCue::ItemSelected);
        Ok(())
    }

    async fn stop_playback_locked(&self, inner: &mut Inner) -> Result<(), SessionError> {
        let target = inner.session.finish_playback()?;
        inner.epoch += 1;
        self.release_playback(inner).await;
        info!(id = %target, "Playback stopped");
        Ok(())
    }

    async fn release_playback(&self, inner: &mut Inner) {
        if let Some(mut handle) = inner.playback.take() {
            if let Err(e) = handle.stop().await {
                warn!(error = %e, "Failed to release output device");
            }
        }
    }

    async fn delete_locked(&self, inner: &mut Inner, id: RecordingId) -> Result<(), SessionError> {
        let recording = inner
            .session
            .find(id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;
        inner.session.ensure_deletable(id)?;

        self.catalog.delete(&recording).await?;
        inner.session.remove_recording(id);
        self.cue(FeedbackCue::ItemSelected);
        Ok(())
    }

    fn spawn_ticker(self: &Arc<Self>, epoch: u64) -> JoinHandle<()> {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let period = TICK.as_std();
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !shared.on_tick(epoch).await {
                    break;
                }
            }
        })
    }

    /// One ticker step. Returns false once the ticker should end.
    async fn on_tick(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return false;
        }
        let Some(elapsed) = inner.session.tick() else {
            return false;
        };
        debug!(elapsed = %elapsed, "Recording tick");

        if let Some(max) = self.config.max_duration {
            if elapsed >= max {
                warn!(max = %max, "Max duration reached, auto-stopping");
                // Detach rather than abort: this task is the ticker.
                inner.ticker.take();
                let result = self.stop_recording_locked(&mut inner).await;
                self.settle(&mut inner, &result);
                return false;
            }
        }

        self.publish(&inner);
        true
    }

    fn watch_completion(self: &Arc<Self>, completion: PlaybackCompletion, epoch: u64) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            if completion.await.is_ok() {
                shared.on_playback_finished(epoch).await;
            }
        });
    }

    /// End-of-media from the output device
    async fn on_playback_finished(&self, epoch: u64) {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!("Ignoring completion of a replaced playback");
            return;
        }
        if let Ok(target) = inner.session.finish_playback() {
            inner.epoch += 1;
            self.release_playback(&mut inner).await;
            info!(id = %target, "Playback finished");
            self.publish(&inner);
        }
    }
}
