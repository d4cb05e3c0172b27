//! Interactive shell command parsing

use std::str::FromStr;

use thiserror::Error;

use crate::domain::memo::{Recording, RecordingId};

/// One line typed into the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Record,
    Stop,
    Play(String),
    StopPlay,
    Delete(String),
    List,
    Status,
    Permission,
    Clear,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}'. Type 'help' for commands.")]
    Unknown(String),

    #[error("'{0}' needs a memo number or name")]
    MissingTarget(&'static str),
}

impl FromStr for ShellCommand {
    type Err = ShellParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let target = |name: &'static str| {
            if rest.is_empty() {
                Err(ShellParseError::MissingTarget(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb.to_lowercase().as_str() {
            "" => Err(ShellParseError::Empty),
            "record" | "rec" | "r" => Ok(Self::Record),
            "stop" | "s" => Ok(Self::Stop),
            "play" | "p" => target("play").map(Self::Play),
            "stop-play" | "sp" => Ok(Self::StopPlay),
            "delete" | "del" | "rm" => target("delete").map(Self::Delete),
            "list" | "ls" | "l" => Ok(Self::List),
            "status" => Ok(Self::Status),
            "permission" => Ok(Self::Permission),
            "clear" => Ok(Self::Clear),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ShellParseError::Unknown(other.to_string())),
        }
    }
}

/// Shell help text
pub const HELP: &str = "\
Commands:
  record              start recording a memo
  stop                stop recording and save
  play <n|name>       play a memo (stops any current playback)
  stop-play           stop playback
  delete <n|name>     delete a memo
  list                list memos, newest first
  status              show the current state
  permission          ask for microphone access again
  clear               dismiss the last error
  help                show this help
  quit                exit (saves an in-progress recording)";

/// Resolve a 1-based list number or a memo name to an id
pub fn resolve_target(recordings: &[Recording], target: &str) -> Option<RecordingId> {
    let target = target.trim();
    if let Ok(n) = target.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| recordings.get(i))
            .map(Recording::id);
    }
    recordings
        .iter()
        .find(|r| r.name() == target)
        .map(Recording::id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memo::Duration;
    use chrono::Utc;

    fn memos() -> Vec<Recording> {
        vec![
            Recording::new("/memos/memo_200.flac", Utc::now(), Duration::from_secs(4)),
            Recording::new("/memos/memo_100.flac", Utc::now(), Duration::from_secs(9)),
        ]
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!("record".parse::<ShellCommand>(), Ok(ShellCommand::Record));
        assert_eq!("  STOP ".parse::<ShellCommand>(), Ok(ShellCommand::Stop));
        assert_eq!("stop-play".parse::<ShellCommand>(), Ok(ShellCommand::StopPlay));
        assert_eq!("ls".parse::<ShellCommand>(), Ok(ShellCommand::List));
        assert_eq!("q".parse::<ShellCommand>(), Ok(ShellCommand::Quit));
    }

    #[test]
    fn parses_targets() {
        assert_eq!("play 2".parse::<ShellCommand>(), Ok(ShellCommand::Play("2".into())));
        assert_eq!(
            "delete   memo_100".parse::<ShellCommand>(),
            Ok(ShellCommand::Delete("memo_100".into()))
        );
    }

    #[test]
    fn missing_target_is_an_error() {
        assert_eq!(
            "play".parse::<ShellCommand>(),
            Err(ShellParseError::MissingTarget("play"))
        );
    }

    #[test]
    fn unknown_and_empty() {
        assert_eq!("".parse::<ShellCommand>(), Err(ShellParseError::Empty));
        assert!(matches!(
            "dance".parse::<ShellCommand>(),
            Err(ShellParseError::Unknown(_))
        ));
    }

    #[test]
    fn resolve_by_index() {
        let recordings = memos();
        assert_eq!(resolve_target(&recordings, "1"), Some(recordings[0].id()));
        assert_eq!(resolve_target(&recordings, "2"), Some(recordings[1].id()));
        assert_eq!(resolve_target(&recordings, "0"), None);
        assert_eq!(resolve_target(&recordings, "3"), None);
    }

    #[test]
    fn resolve_by_name() {
        let recordings = memos();
        assert_eq!(
            resolve_target(&recordings, "memo_100"),
            Some(recordings[1].id())
        );
        assert_eq!(resolve_target(&recordings, "memo_999"), None);
    }
}
