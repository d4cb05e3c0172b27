//! In-memory capabilities for exercising the application layer

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::domain::memo::Duration;

use super::ports::{
    CaptureDevice, CaptureError, CaptureHandle, CaptureSettings, DurationDecoder, Feedback,
    FeedbackCue, FeedbackError, Filesystem, MemoReader, MetadataError, PermissionAuthority,
    PlaybackCompletion, PlaybackDevice, PlaybackError, PlaybackHandle, StorageError,
};

struct MemoryFile {
    bytes: Vec<u8>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct FsState {
    files: BTreeMap<PathBuf, MemoryFile>,
    unreadable: HashSet<PathBuf>,
    fail_listing: bool,
    fail_removes: bool,
}

/// Filesystem held in a map
#[derive(Default)]
pub struct MemoryFilesystem {
    state: Mutex<FsState>,
    bytes_read: Arc<AtomicUsize>,
}

/// Reader that tallies the bytes pulled out of a memory file
struct CountingReader {
    inner: Cursor<Vec<u8>>,
    count: Arc<AtomicUsize>,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: &[u8]) {
        self.insert_at(path, bytes, Utc::now());
    }

    pub fn insert_at(&self, path: impl Into<PathBuf>, bytes: &[u8], created_at: DateTime<Utc>) {
        self.state.lock().unwrap().files.insert(
            path.into(),
            MemoryFile {
                bytes: bytes.to_vec(),
                created_at: Some(created_at),
            },
        );
    }

    pub fn forget_creation_time(&self, path: impl AsRef<Path>) {
        if let Some(file) = self.state.lock().unwrap().files.get_mut(path.as_ref()) {
            file.created_at = None;
        }
    }

    pub fn fail_reads_of(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().unreadable.insert(path.into());
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }

    pub fn fail_removes(&self) {
        self.state.lock().unwrap().fail_removes = true;
    }

    /// Total bytes handed out by readers from `open`
    pub fn bytes_read(&self) -> usize {
        self.bytes_read.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().unwrap().files.contains_key(path.as_ref())
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(StorageError::ListFailed("permission denied".to_string()));
        }
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    async fn create_dir_all(&self, _dir: &Path) -> Result<(), StorageError> {
        Ok(())
    }

    async fn remove(&self, path: &Path) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_removes {
            return Err(StorageError::RemoveFailed("permission denied".to_string()));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::RemoveFailed("no such file".to_string()))
    }

    async fn stat_size(&self, path: &Path) -> Result<u64, StorageError> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(path)
            .map(|f| f.bytes.len() as u64)
            .ok_or_else(|| StorageError::StatFailed {
                path: path.display().to_string(),
                message: "no such file".to_string(),
            })
    }

    async fn stat_creation_time(&self, path: &Path) -> Result<DateTime<Utc>, StorageError> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(path)
            .and_then(|f| f.created_at)
            .ok_or_else(|| StorageError::StatFailed {
                path: path.display().to_string(),
                message: "creation time unavailable".to_string(),
            })
    }

    async fn open(&self, path: &Path) -> Result<MemoReader, StorageError> {
        let state = self.state.lock().unwrap();
        let read_failed = || StorageError::ReadFailed {
            path: path.display().to_string(),
            message: "unreadable".to_string(),
        };
        if state.unreadable.contains(path) {
            return Err(read_failed());
        }
        state
            .files
            .get(path)
            .map(|f| -> MemoReader {
                Box::new(CountingReader {
                    inner: Cursor::new(f.bytes.clone()),
                    count: Arc::clone(&self.bytes_read),
                })
            })
            .ok_or_else(read_failed)
    }
}

/// Reads a leading decimal millisecond count from a short header
pub struct FakeDecoder;

const FAKE_HEADER_LEN: u64 = 32;

impl DurationDecoder for FakeDecoder {
    fn declared_duration(&self, source: MemoReader) -> Result<Duration, MetadataError> {
        let mut header = Vec::new();
        source
            .take(FAKE_HEADER_LEN)
            .read_to_end(&mut header)
            .map_err(|e| MetadataError::Unreadable(e.to_string()))?;

        let digits: String = header
            .iter()
            .map(|&b| b as char)
            .take_while(char::is_ascii_digit)
            .collect();
        digits
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| MetadataError::Decode("not a fake memo".to_string()))
    }
}

/// Capture device that writes the captured length (ms) as the file body
#[derive(Clone)]
pub struct FakeCaptureDevice {
    fs: Arc<MemoryFilesystem>,
    fail_open: Arc<AtomicBool>,
    fail_stop: Arc<AtomicBool>,
    skip_write: Arc<AtomicBool>,
}

impl FakeCaptureDevice {
    pub fn new(fs: Arc<MemoryFilesystem>) -> Self {
        Self {
            fs,
            fail_open: Arc::new(AtomicBool::new(false)),
            fail_stop: Arc::new(AtomicBool::new(false)),
            skip_write: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    /// Report success on stop without producing a file
    pub fn skip_write(&self) {
        self.skip_write.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaptureDevice for FakeCaptureDevice {
    async fn open(
        &self,
        location: &Path,
        _settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(CaptureError::OpenFailed("device busy".to_string()));
        }
        Ok(Box::new(FakeCapture {
            location: location.to_path_buf(),
            fs: Arc::clone(&self.fs),
            started_at: None,
            fail_stop: Arc::clone(&self.fail_stop),
            skip_write: Arc::clone(&self.skip_write),
        }))
    }
}

struct FakeCapture {
    location: PathBuf,
    fs: Arc<MemoryFilesystem>,
    started_at: Option<Instant>,
    fail_stop: Arc<AtomicBool>,
    skip_write: Arc<AtomicBool>,
}

#[async_trait]
impl CaptureHandle for FakeCapture {
    async fn start(&mut self) -> Result<(), CaptureError> {
        self.started_at = Some(Instant::now());
        Ok(())
    }

    async fn stop(&mut self) -> Result<PathBuf, CaptureError> {
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(CaptureError::StopFailed("device lost".to_string()));
        }
        if !self.skip_write.load(Ordering::SeqCst) {
            let captured_ms = self
                .started_at
                .map(|t| t.elapsed().as_millis())
                .unwrap_or(0);
            self.fs.insert(&self.location, captured_ms.to_string().as_bytes());
        }
        Ok(self.location.clone())
    }
}

/// What the fake output device did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started(PathBuf),
    Stopped(PathBuf),
}

#[derive(Default)]
struct PlaybackState {
    events: Vec<PlaybackEvent>,
    completions: HashMap<PathBuf, oneshot::Sender<()>>,
    unplayable: HashSet<PathBuf>,
}

/// Output device whose end-of-media is triggered by the test
#[derive(Clone, Default)]
pub struct FakePlaybackDevice {
    state: Arc<Mutex<PlaybackState>>,
}

impl FakePlaybackDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn fail_open_of(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().unplayable.insert(path.into());
    }

    /// Signal end-of-media for the memo at `path`. Returns false if it is not playing.
    pub fn finish(&self, path: impl AsRef<Path>) -> bool {
        let sender = self.state.lock().unwrap().completions.remove(path.as_ref());
        sender.map(|tx| tx.send(()).is_ok()).unwrap_or(false)
    }
}

#[async_trait]
impl PlaybackDevice for FakePlaybackDevice {
    async fn open(&self, location: &Path) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        if self.state.lock().unwrap().unplayable.contains(location) {
            return Err(PlaybackError::OpenFailed("unsupported file".to_string()));
        }
        Ok(Box::new(FakePlayer {
            location: location.to_path_buf(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakePlayer {
    location: PathBuf,
    state: Arc<Mutex<PlaybackState>>,
}

#[async_trait]
impl PlaybackHandle for FakePlayer {
    async fn play(&mut self) -> Result<PlaybackCompletion, PlaybackError> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().unwrap();
        state.events.push(PlaybackEvent::Started(self.location.clone()));
        state.completions.insert(self.location.clone(), tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(PlaybackEvent::Stopped(self.location.clone()));
        state.completions.remove(&self.location);
        Ok(())
    }
}

/// Feedback that remembers the cues it was asked for
#[derive(Clone, Default)]
pub struct RecordingFeedback {
    cues: Arc<Mutex<Vec<FeedbackCue>>>,
}

impl RecordingFeedback {
    pub fn cues(&self) -> Vec<FeedbackCue> {
        self.cues.lock().unwrap().clone()
    }
}

#[async_trait]
impl Feedback for RecordingFeedback {
    async fn notify(&self, cue: FeedbackCue) -> Result<(), FeedbackError> {
        self.cues.lock().unwrap().push(cue);
        Ok(())
    }
}

/// Permission answered only when the test releases it
#[derive(Clone, Default)]
pub struct GatedPermission {
    answer: Arc<tokio::sync::Mutex<Option<oneshot::Receiver<bool>>>>,
}

impl GatedPermission {
    /// Returns the sender that resolves the pending request
    pub fn new() -> (Self, oneshot::Sender<bool>) {
        let (tx, rx) = oneshot::channel();
        let gate = Self {
            answer: Arc::new(tokio::sync::Mutex::new(Some(rx))),
        };
        (gate, tx)
    }
}

#[async_trait]
impl PermissionAuthority for GatedPermission {
    async fn request_microphone_access(&self) -> bool {
        let rx = self.answer.lock().await.take();
        match rx {
            Some(rx) => rx.await.unwrap_or(false),
            None => false,
        }
    }
}

/// Permission with a fixed answer
pub struct StaticPermission(pub bool);

#[async_trait]
impl PermissionAuthority for StaticPermission {
    async fn request_microphone_access(&self) -> bool {
        self.0
    }
}
