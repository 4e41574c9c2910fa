//! Configuration loading, templating and hot-reload.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Loaded values are passed explicitly to whoever needs them; there is no
//! global configuration instance.

pub mod template;
mod types;
mod watcher;

use std::path::{Path, PathBuf};

use schemars::schema_for;

pub use types::{AppConfig, ConfigError, config_paths, load_config, load_config_from_path};
pub use watcher::watch_config_file;

/// A configuration and the file it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
}

/// Loads the configuration from `custom` or the default search paths.
///
/// When the default search finds nothing, a template is written to the
/// preferred location and the defaults are used. A custom path must exist.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` for a missing custom file, and read or
/// parse errors of the file that was found.
pub fn load(custom: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = custom {
        let (config, path) = load_config_from_path(path)?;
        return Ok(LoadedConfig { config, path: Some(path) });
    }

    match load_config() {
        Ok((config, path)) => Ok(LoadedConfig { config, path: Some(path) }),
        Err(ConfigError::NotFound) => Ok(LoadedConfig {
            config: AppConfig::default(),
            path: create_default_config_file(),
        }),
        Err(err) => Err(err),
    }
}

/// Writes the template to the preferred config path and returns it.
fn create_default_config_file() -> Option<PathBuf> {
    let Some(config_path) = config_paths().into_iter().next() else {
        tracing::debug!("no config path available for creating template");
        return None;
    };

    if config_path.exists() {
        return Some(config_path);
    }

    match template::create_config_file(&config_path) {
        Ok(()) => {
            tracing::info!(path = %config_path.display(), "created default configuration file");
            Some(config_path)
        }
        Err(err) => {
            tracing::debug!(
                error = %err,
                path = %config_path.display(),
                "failed to create default configuration file"
            );
            None
        }
    }
}

/// JSON Schema of the configuration file, pretty-printed.
#[must_use]
pub fn print_schema() -> String {
    let schema = schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}
