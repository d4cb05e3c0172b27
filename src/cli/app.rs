//! App runners: interactive shell and one-shot commands

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::ports::{ConfigStore, PermissionAuthority};
use crate::application::{
    CatalogStore, SessionConfig, SessionError, SessionManager, SessionSnapshot,
};
use crate::domain::config::AppConfig;
use crate::domain::memo::{Duration, RecordingId};
use crate::domain::session::{SessionMode, SessionState};
use crate::infrastructure::{
    create_feedback, create_permission_authority, CpalCaptureDevice, FixedPermission, LineInput,
    LocalFilesystem, RodioPlaybackDevice, SymphoniaDecoder, XdgConfigStore,
};

use super::presenter::Presenter;
use super::shell::{resolve_target, ShellCommand, HELP};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Session wired to the real devices
pub type MemoSession = SessionManager<
    CpalCaptureDevice,
    RodioPlaybackDevice,
    LocalFilesystem,
    SymphoniaDecoder,
    Box<dyn PermissionAuthority>,
>;

/// Load and merge configuration from file and CLI.
/// `VOICE_MEMO_DIR` arrives through the `--dir` flag's env fallback.
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        debug!(error = %e, "Ignoring unreadable config file");
        AppConfig::empty()
    });

    // Merge: defaults < file < env/cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Build a session over the configured storage directory
pub fn build_session(config: &AppConfig, permission: Box<dyn PermissionAuthority>) -> MemoSession {
    let catalog = CatalogStore::new(
        Arc::new(LocalFilesystem::new()),
        SymphoniaDecoder::new(),
        config.storage_dir_or_default(),
    );
    SessionManager::new(
        CpalCaptureDevice::new(),
        RodioPlaybackDevice::new(),
        catalog,
        permission,
        create_feedback(config.feedback_or_default()),
        SessionConfig {
            max_duration: Some(config.max_duration_or_default()),
            ..SessionConfig::default()
        },
    )
}

/// Print the catalog and exit
pub async fn run_list(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let session = build_session(config, Box::new(FixedPermission::new(false)));

    if let Err(e) = session.load_recordings().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    print_list(&session, &presenter).await;
    ExitCode::from(EXIT_SUCCESS)
}

/// Delete one memo and exit
pub async fn run_delete(config: &AppConfig, target: &str) -> ExitCode {
    let presenter = Presenter::new();
    let session = build_session(config, Box::new(FixedPermission::new(false)));

    if let Err(e) = session.load_recordings().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    let Some(id) = resolve_target(&session.snapshot().recordings, target) else {
        presenter.error(&format!("No memo matching '{}'", target));
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    match session.delete_recording(id).await {
        Ok(()) => {
            presenter.success(&format!("Deleted {}", target));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the interactive shell until `quit`, end of input or Ctrl-C
pub async fn run_shell(config: &AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let input = LineInput::stdin();
    let session = build_session(
        config,
        create_permission_authority(config.permission_or_default(), input.clone()),
    );
    let max_duration = Some(config.max_duration_or_default());

    if let Err(e) = session.load_recordings().await {
        presenter.error(&e.to_string());
    }
    presenter.info(&format!(
        "{} memo(s) in {}",
        session.snapshot().recordings.len(),
        session.storage_dir().display()
    ));

    if !session.request_permission().await {
        presenter.warn("Microphone access not granted. Playback still works; type 'permission' to ask again.");
    }
    presenter.info("Type 'help' for commands.");

    let mut updates = session.subscribe();
    let mut view = ShellView::new(session.snapshot());
    presenter.prompt();

    loop {
        tokio::select! {
            line = input.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        presenter.error(&format!("Failed to read input: {}", e));
                        break;
                    }
                };
                if line.trim().is_empty() {
                    presenter.prompt();
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => execute(&session, &presenter, command).await,
                    Err(e) => presenter.error(&e.to_string()),
                }
                if !presenter.is_spinner_active() {
                    presenter.prompt();
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                view.render(&mut presenter, snapshot, max_duration);
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                presenter.warn("Interrupted");
                break;
            }
        }
    }

    let was_recording = session.snapshot().state() == SessionState::Recording;
    let result = session.shutdown().await;
    view.render(&mut presenter, session.snapshot(), max_duration);
    match result {
        Ok(()) => {
            if was_recording {
                presenter.success("In-progress recording saved");
            }
            info!("Shell exited");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run one shell command against the session
async fn execute(session: &MemoSession, presenter: &Presenter, command: ShellCommand) {
    let result = match command {
        ShellCommand::Record => session.start_recording().await,
        ShellCommand::Stop => session.stop_recording().await,
        ShellCommand::Play(target) => match lookup(session, &target) {
            Some(id) => session.play(id).await,
            None => return presenter.error(&format!("No memo matching '{}'", target)),
        },
        ShellCommand::StopPlay => session.stop_playback().await,
        ShellCommand::Delete(target) => match lookup(session, &target) {
            Some(id) => {
                let result = session.delete_recording(id).await;
                if result.is_ok() {
                    presenter.success(&format!("Deleted {}", target));
                }
                result
            }
            None => return presenter.error(&format!("No memo matching '{}'", target)),
        },
        ShellCommand::List => {
            print_list(session, presenter).await;
            Ok(())
        }
        ShellCommand::Status => {
            presenter.status(&session.snapshot());
            Ok(())
        }
        ShellCommand::Permission => {
            if session.request_permission().await {
                presenter.success("Microphone access granted");
            } else {
                presenter.warn("Microphone access denied");
            }
            Ok(())
        }
        ShellCommand::Clear => {
            session.clear_error().await;
            Ok(())
        }
        ShellCommand::Help => {
            presenter.output(HELP);
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    };

    if let Err(e) = result {
        presenter.error(&e.to_string());
        if matches!(e, SessionError::PermissionDenied) {
            presenter.info("Type 'permission' to grant microphone access.");
        }
    }
}

fn lookup(session: &MemoSession, target: &str) -> Option<RecordingId> {
    resolve_target(&session.snapshot().recordings, target)
}

async fn print_list(session: &MemoSession, presenter: &Presenter) {
    let snapshot = session.snapshot();
    let mut rows = Vec::with_capacity(snapshot.recordings.len());
    for recording in snapshot.recordings.iter() {
        let size_kb = session.size_kb(recording).await;
        rows.push((recording.clone(), size_kb));
    }
    let playing = snapshot
        .active_target()
        .and_then(|id| snapshot.recordings.iter().find(|r| r.id() == id));
    presenter.memo_list(&rows, playing);
}

/// Turns snapshot changes into spinner and status lines
struct ShellView {
    last: SessionSnapshot,
}

impl ShellView {
    fn new(initial: SessionSnapshot) -> Self {
        Self { last: initial }
    }

    fn render(
        &mut self,
        presenter: &mut Presenter,
        snapshot: SessionSnapshot,
        max_duration: Option<Duration>,
    ) {
        match (&self.last.mode, &snapshot.mode) {
            (_, SessionMode::Recording { elapsed, .. }) => {
                presenter.show_recording(*elapsed, max_duration);
            }
            (SessionMode::Recording { .. }, _) => {
                let saved = snapshot.recordings.len() > self.last.recordings.len();
                match (saved, snapshot.recordings.first()) {
                    (true, Some(memo)) => presenter.spinner_success(&format!(
                        "Saved {} ({})",
                        memo.name(),
                        memo.duration_string()
                    )),
                    _ => presenter.spinner_fail(
                        snapshot.last_error.as_deref().unwrap_or("Recording discarded"),
                    ),
                }
                presenter.prompt();
            }
            (SessionMode::Playing { target: old }, SessionMode::Playing { target: new })
                if old != new =>
            {
                self.announce_playing(presenter, &snapshot, *new);
            }
            (SessionMode::Idle, SessionMode::Playing { target }) => {
                self.announce_playing(presenter, &snapshot, *target);
            }
            (SessionMode::Playing { .. }, SessionMode::Idle) => {
                eprintln!();
                presenter.info("Playback ended");
                presenter.prompt();
            }
            _ => {}
        }
        self.last = snapshot;
    }

    fn announce_playing(
        &self,
        presenter: &Presenter,
        snapshot: &SessionSnapshot,
        target: RecordingId,
    ) {
        if let Some(memo) = snapshot.recordings.iter().find(|r| r.id() == target) {
            presenter.info(&format!("Playing {} ({})", memo.name(), memo.duration_string()));
        }
    }
}
