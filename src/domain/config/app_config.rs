//! Application configuration value object

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidPermissionPolicy;
use crate::domain::memo::Duration;

/// How the microphone permission request is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionPolicy {
    /// Ask the user on first request
    #[default]
    Ask,
    /// Treat as already granted
    Granted,
    /// Treat as already denied
    Denied,
}

impl PermissionPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for PermissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionPolicy {
    type Err = InvalidPermissionPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "granted" | "grant" | "allow" => Ok(Self::Granted),
            "denied" | "deny" => Ok(Self::Denied),
            _ => Err(InvalidPermissionPolicy {
                input: s.to_string(),
            }),
        }
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage_dir: Option<String>,
    pub max_duration: Option<String>,
    pub feedback: Option<bool>,
    pub permission: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            storage_dir: Some(default_storage_dir().to_string_lossy().into_owned()),
            max_duration: Some(Duration::default_max_duration().to_config_string()),
            feedback: Some(true),
            permission: Some(PermissionPolicy::Ask.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            storage_dir: other.storage_dir.or(self.storage_dir),
            max_duration: other.max_duration.or(self.max_duration),
            feedback: other.feedback.or(self.feedback),
            permission: other.permission.or(self.permission),
        }
    }

    /// Storage directory, or the per-user data directory if not set
    pub fn storage_dir_or_default(&self) -> PathBuf {
        self.storage_dir
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir)
    }

    /// Max recording length, or default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Feedback cues, on unless disabled
    pub fn feedback_or_default(&self) -> bool {
        self.feedback.unwrap_or(true)
    }

    /// Permission policy, or `ask` if not set/invalid
    pub fn permission_or_default(&self) -> PermissionPolicy {
        self.permission
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

/// `<data_dir>/voice-memo/memos`
pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("voice-memo")
        .join("memos")
}
