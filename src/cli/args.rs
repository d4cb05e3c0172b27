//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::config::AppConfig;

/// Environment variable overriding the storage directory
pub const STORAGE_DIR_ENV: &str = "VOICE_MEMO_DIR";

/// VoiceMemo - record and play back voice memos
#[derive(Parser, Debug)]
#[command(name = "voice-memo")]
#[command(version)]
#[command(about = "Record, list, play back and delete voice memos")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory memos are stored in
    #[arg(long, value_name = "DIR", global = true, env = STORAGE_DIR_ENV)]
    pub dir: Option<String>,

    /// Auto-stop recordings at this length (e.g., 30s, 5m, 2m30s)
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Disable audible cues
    #[arg(long)]
    pub no_feedback: bool,

    /// Log debug output to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config layer built from the flags that were given
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            storage_dir: self.dir.clone(),
            max_duration: self.max_duration.clone(),
            feedback: if self.no_feedback { Some(false) } else { None },
            permission: None,
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print stored memos, newest first
    List,
    /// Delete a memo by list number or name
    Delete {
        /// List number (1 = newest) or memo name
        target: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["storage_dir", "max_duration", "feedback", "permission"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
