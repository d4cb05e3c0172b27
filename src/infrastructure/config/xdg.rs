//! TOML config file under the XDG config directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

const APP_DIR: &str = "voice-memo";
const FILE_NAME: &str = "config.toml";

const HEADER: &str = "\
# voice-memo configuration
# storage_dir  = directory holding memo_<secs>.flac files
# max_duration = recording cap, e.g. \"30s\", \"10m\", \"2m30s\"
# feedback     = play start/stop chimes
# permission   = \"ask\" | \"granted\" | \"denied\"

";

/// `<config_dir>/voice-memo/config.toml`, falling back to `~/.config`
fn default_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_default()
        .join(APP_DIR)
        .join(FILE_NAME)
}

fn render(config: &AppConfig) -> Result<String, ConfigError> {
    let body = toml::to_string(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    Ok(format!("{HEADER}{body}"))
}

async fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string())),
        _ => Ok(()),
    }
}

/// Config store for the memo app's settings file
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        Self {
            path: default_path(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AppConfig::empty()),
            Err(e) => return Err(ConfigError::ReadError(e.to_string())),
        };
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        ensure_parent(&self.path).await?;
        fs::write(&self.path, render(config)?)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        ensure_parent(&self.path).await?;
        let content = render(&AppConfig::defaults())?;

        // Never overwrites an existing file
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    ConfigError::AlreadyExists(self.path.display().to_string())
                }
                _ => ConfigError::WriteError(e.to_string()),
            })?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}
