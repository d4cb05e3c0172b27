//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::PermissionPolicy;
use crate::domain::error::ConfigError;
use crate::domain::memo::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;

    match key {
        "storage_dir" => config.storage_dir = Some(value.to_string()),
        "max_duration" => config.max_duration = Some(value.to_string()),
        "feedback" => config.feedback = Some(parse_bool(key, value)?),
        "permission" => {
            // Store the canonical spelling
            let policy = parse_policy(key, value)?;
            config.permission = Some(policy.to_string());
        }
        _ => {
            return Err(ConfigError::ValidationError {
                key: key.to_string(),
                message: "Key cannot be set".to_string(),
            })
        }
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;

    let value = match key {
        "storage_dir" => config.storage_dir,
        "max_duration" => config.max_duration,
        "feedback" => config.feedback.map(|b| b.to_string()),
        "permission" => config.permission,
        _ => None,
    };

    presenter.output(value.as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value(
        "storage_dir",
        config.storage_dir.as_deref().unwrap_or(NOT_SET),
    );
    presenter.key_value(
        "max_duration",
        config.max_duration.as_deref().unwrap_or(NOT_SET),
    );
    presenter.key_value(
        "feedback",
        &config
            .feedback
            .map(|b| b.to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    );
    presenter.key_value(
        "permission",
        config.permission.as_deref().unwrap_or(NOT_SET),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "max_duration" => {
            value
                .parse::<Duration>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        "feedback" => {
            parse_bool(key, value)?;
        }
        "permission" => {
            parse_policy(key, value)?;
        }
        "storage_dir" => {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must not be empty".to_string(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must be 'true' or 'false'".to_string(),
        }),
    }
}

fn parse_policy(key: &str, value: &str) -> Result<PermissionPolicy, ConfigError> {
    value
        .parse::<PermissionPolicy>()
        .map_err(|e| ConfigError::ValidationError {
            key: key.to_string(),
            message: e.to_string(),
        })
}
