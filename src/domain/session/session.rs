//! Session state machine

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::memo::{Duration, Recording, RecordingId};

/// Length of one ticker step while recording
pub const TICK: Duration = Duration::from_secs(1);

/// Session states, without associated data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Playing,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing => "playing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current exclusive activity, with the data that is only valid in it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Idle,
    Recording {
        elapsed: Duration,
        location: PathBuf,
    },
    Playing {
        target: RecordingId,
    },
}

impl SessionMode {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Idle => SessionState::Idle,
            Self::Recording { .. } => SessionState::Recording,
            Self::Playing { .. } => SessionState::Playing,
        }
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Session entity.
///
/// State machine:
///   IDLE -> RECORDING (start_recording)
///   RECORDING -> IDLE (finish_recording)
///   IDLE -> PLAYING (start_playback)
///   PLAYING -> IDLE (finish_playback)
///
/// Switching from one memo to another is PLAYING -> IDLE -> PLAYING.
#[derive(Debug, Default)]
pub struct Session {
    mode: SessionMode,
    has_permission: bool,
    recordings: Vec<Recording>,
    last_error: Option<String>,
}

impl Session {
    /// Create an idle session with no recordings and no permission
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn state(&self) -> SessionState {
        self.mode.state()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.state() == SessionState::Playing
    }

    pub fn has_permission(&self) -> bool {
        self.has_permission
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.has_permission = granted;
    }

    /// Recordings, newest first
    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn find(&self, id: RecordingId) -> Option<&Recording> {
        self.recordings.iter().find(|r| r.id() == id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Elapsed recording time; zero outside RECORDING
    pub fn elapsed(&self) -> Duration {
        match &self.mode {
            SessionMode::Recording { elapsed, .. } => *elapsed,
            _ => Duration::ZERO,
        }
    }

    /// Memo currently playing, if any
    pub fn active_target(&self) -> Option<RecordingId> {
        match &self.mode {
            SessionMode::Playing { target } => Some(*target),
            _ => None,
        }
    }

    /// Location being captured to, if recording
    pub fn recording_location(&self) -> Option<&Path> {
        match &self.mode {
            SessionMode::Recording { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Fail unless the session is idle
    pub fn ensure_idle(&self, action: &str) -> Result<(), InvalidStateTransition> {
        if !self.is_idle() {
            return Err(self.reject(action));
        }
        Ok(())
    }

    /// Transition from IDLE to RECORDING. Elapsed time starts at zero.
    pub fn start_recording(&mut self, location: PathBuf) -> Result<(), InvalidStateTransition> {
        self.ensure_idle("start recording")?;
        self.mode = SessionMode::Recording {
            elapsed: Duration::ZERO,
            location,
        };
        Ok(())
    }

    /// Advance the elapsed time by one tick.
    /// Returns the new elapsed time, or `None` (no-op) outside RECORDING.
    pub fn tick(&mut self) -> Option<Duration> {
        match &mut self.mode {
            SessionMode::Recording { elapsed, .. } => {
                *elapsed = Duration::from_millis(elapsed.as_millis() + TICK.as_millis());
                Some(*elapsed)
            }
            _ => None,
        }
    }

    /// Transition from RECORDING to IDLE.
    /// Returns the capture location and the elapsed time at the moment of stop.
    pub fn finish_recording(&mut self) -> Result<(PathBuf, Duration), InvalidStateTransition> {
        match std::mem::take(&mut self.mode) {
            SessionMode::Recording { elapsed, location } => Ok((location, elapsed)),
            other => {
                self.mode = other;
                Err(self.reject("stop recording"))
            }
        }
    }

    /// Transition from IDLE to PLAYING
    pub fn start_playback(&mut self, target: RecordingId) -> Result<(), InvalidStateTransition> {
        self.ensure_idle("play")?;
        self.mode = SessionMode::Playing { target };
        Ok(())
    }

    /// Transition from PLAYING to IDLE, returning the memo that was playing
    pub fn finish_playback(&mut self) -> Result<RecordingId, InvalidStateTransition> {
        match self.mode {
            SessionMode::Playing { target } => {
                self.mode = SessionMode::Idle;
                Ok(target)
            }
            _ => Err(self.reject("stop playback")),
        }
    }

    /// Insert a freshly stopped recording at the head of the list
    pub fn insert_recording(&mut self, recording: Recording) {
        self.recordings.insert(0, recording);
    }

    /// Replace the whole list (catalog reload)
    pub fn replace_recordings(&mut self, recordings: Vec<Recording>) {
        self.recordings = recordings;
    }

    /// Fail if the memo is the active playback target
    pub fn ensure_deletable(&self, id: RecordingId) -> Result<(), InvalidStateTransition> {
        if self.active_target() == Some(id) {
            return Err(self.reject("delete the memo that is playing"));
        }
        Ok(())
    }

    /// Remove a memo from the list
    pub fn remove_recording(&mut self, id: RecordingId) -> Option<Recording> {
        let index = self.recordings.iter().position(|r| r.id() == id)?;
        Some(self.recordings.remove(index))
    }

    /// Build the rejection for an action not allowed in the current state
    pub fn reject(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state(),
            action: action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn memo(name: &str) -> Recording {
        Recording::new(format!("/memos/{}.flac", name), Utc::now(), Duration::from_secs(2))
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::new();
        assert!(session.is_idle());
        assert!(!session.has_permission());
        assert!(session.recordings().is_empty());
        assert!(session.last_error().is_none());
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn start_recording_from_idle() {
        let mut session = Session::new();
        session.start_recording("/memos/a.flac".into()).unwrap();
        assert!(session.is_recording());
        assert_eq!(session.elapsed(), Duration::ZERO);
        assert_eq!(session.recording_location(), Some(Path::new("/memos/a.flac")));
    }

    #[test]
    fn start_recording_from_recording_fails() {
        let mut session = Session::new();
        session.start_recording("/memos/a.flac".into()).unwrap();

        let err = session.start_recording("/memos/b.flac".into()).unwrap_err();
        assert_eq!(err.current_state, SessionState::Recording);
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn start_recording_from_playing_fails() {
        let mut session = Session::new();
        let rec = memo("a");
        let id = rec.id();
        session.insert_recording(rec);
        session.start_playback(id).unwrap();

        let err = session.start_recording("/memos/b.flac".into()).unwrap_err();
        assert_eq!(err.current_state, SessionState::Playing);
        assert!(session.is_playing());
    }

    #[test]
    fn ticks_accumulate_only_while_recording() {
        let mut session = Session::new();
        assert_eq!(session.tick(), None);

        session.start_recording("/memos/a.flac".into()).unwrap();
        session.tick();
        session.tick();
        assert_eq!(session.tick(), Some(Duration::from_secs(3)));

        let (location, elapsed) = session.finish_recording().unwrap();
        assert_eq!(location, PathBuf::from("/memos/a.flac"));
        assert_eq!(elapsed, Duration::from_secs(3));

        // Late tick after stop is a no-op
        assert_eq!(session.tick(), None);
        assert!(session.is_idle());
    }

    #[test]
    fn elapsed_resets_on_new_recording() {
        let mut session = Session::new();
        session.start_recording("/memos/a.flac".into()).unwrap();
        session.tick();
        session.finish_recording().unwrap();

        session.start_recording("/memos/b.flac".into()).unwrap();
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn finish_recording_from_idle_fails() {
        let mut session = Session::new();
        let err = session.finish_recording().unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
        assert!(session.is_idle());
    }

    #[test]
    fn finish_recording_from_playing_keeps_playing() {
        let mut session = Session::new();
        let rec = memo("a");
        let id = rec.id();
        session.insert_recording(rec);
        session.start_playback(id).unwrap();

        assert!(session.finish_recording().is_err());
        assert_eq!(session.active_target(), Some(id));
    }

    #[test]
    fn playback_cycle() {
        let mut session = Session::new();
        let rec = memo("a");
        let id = rec.id();
        session.insert_recording(rec);

        session.start_playback(id).unwrap();
        assert!(session.is_playing());
        assert_eq!(session.active_target(), Some(id));

        assert_eq!(session.finish_playback().unwrap(), id);
        assert!(session.is_idle());
        assert_eq!(session.active_target(), None);
    }

    #[test]
    fn finish_playback_from_idle_fails() {
        let mut session = Session::new();
        let err = session.finish_playback().unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
    }

    #[test]
    fn insert_puts_newest_first() {
        let mut session = Session::new();
        let a = memo("a");
        let b = memo("b");
        let b_id = b.id();
        session.insert_recording(a);
        session.insert_recording(b);
        assert_eq!(session.recordings()[0].id(), b_id);
    }

    #[test]
    fn cannot_delete_active_target() {
        let mut session = Session::new();
        let a = memo("a");
        let b = memo("b");
        let (a_id, b_id) = (a.id(), b.id());
        session.insert_recording(a);
        session.insert_recording(b);
        session.start_playback(a_id).unwrap();

        assert!(session.ensure_deletable(a_id).is_err());
        assert!(session.ensure_deletable(b_id).is_ok());
        assert!(session.remove_recording(b_id).is_some());
        assert_eq!(session.recordings().len(), 1);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut session = Session::new();
        assert!(session.remove_recording(RecordingId::new()).is_none());
    }

    #[test]
    fn error_is_set_and_cleared() {
        let mut session = Session::new();
        session.set_error("boom");
        assert_eq!(session.last_error(), Some("boom"));
        session.clear_error();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Recording.to_string(), "recording");
        assert_eq!(SessionState::Playing.to_string(), "playing");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: SessionState::Playing,
            action: "start recording".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start recording"));
        assert!(msg.contains("playing"));
    }
}
