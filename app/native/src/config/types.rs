//! Configuration types and file discovery.
//!
//! The configuration file is JSONC (JSON with comments). Every field is
//! optional; a missing file or key falls back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{APP_ID, defaults};
use crate::display::Resolution;
use crate::platform::path::expand;

/// Quotewall configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Directory holding `playlists.json` and `settings.json`.
    /// `~` is expanded. Defaults to the platform data directory.
    pub data_dir: Option<String>,

    /// Seconds between two checks of the active playlist's schedule.
    /// Clamped to the range 1 to 3600.
    pub poll_interval_seconds: u64,

    /// Monitor size assumed when no display can be detected.
    pub fallback_resolution: Resolution,

    /// Log filter used when `RUST_LOG` is not set, e.g. `"info"` or
    /// `"quotewall_lib=debug"`.
    pub log_level: String,

    /// Directory where rendered wallpapers are cached.
    /// Defaults to the platform cache directory.
    pub render_cache_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            poll_interval_seconds: defaults::POLL_INTERVAL_SECS,
            fallback_resolution: Resolution::default(),
            log_level: defaults::LOG_LEVEL.to_string(),
            render_cache_dir: None,
        }
    }
}

impl AppConfig {
    /// Poll interval clamped to `1..=MAX_POLL_INTERVAL_SECS` seconds.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.clamp(1, defaults::MAX_POLL_INTERVAL_SECS))
    }

    /// Resolved data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        non_blank(self.data_dir.as_deref())
            .map_or_else(crate::store::default_data_dir, expand)
    }

    /// Resolved render cache directory.
    #[must_use]
    pub fn render_cache_dir(&self) -> PathBuf {
        non_blank(self.render_cache_dir.as_deref())
            .map_or_else(crate::cache::default_render_dir, expand)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found")]
    NotFound,
    #[error("failed to read '{path}': {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse '{path}': {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Configuration file names, in the order they are tried inside a directory.
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// File names tried directly in the home directory.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".quotewall.jsonc", ".quotewall.json"];

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/quotewall/config.jsonc` (and `config.json`)
/// 2. `~/.config/quotewall/config.jsonc` (and `config.json`)
/// 3. The platform config directory, e.g. `~/Library/Application Support/quotewall`
/// 4. `~/.quotewall.jsonc` and `~/.quotewall.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_to_try = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        dirs_to_try.push(PathBuf::from(xdg_config).join(APP_ID));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_try.push(home.join(".config").join(APP_ID));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_try.push(config_dir.join(APP_ID));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_to_try {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            // XDG_CONFIG_HOME is often ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from the first existing file in [`config_paths`].
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if none of the paths exists, or the read
/// or parse error of the first file found.
pub fn load_config() -> Result<(AppConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .ok_or(ConfigError::NotFound)
        .and_then(|path| load_config_from_path(&path))
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, `Io` if it
/// cannot be read and `Parse` if it is not valid JSONC.
pub fn load_config_from_path(path: &Path) -> Result<(AppConfig, PathBuf), ConfigError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound);
        }
        Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
    };

    let reader = json_comments::StripComments::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    Ok((config, path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.fallback_resolution, Resolution { width: 2560, height: 1440 });
        assert_eq!(config.log_level, "info");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_poll_interval_has_a_floor() {
        let config = AppConfig { poll_interval_seconds: 0, ..AppConfig::default() };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_poll_interval_has_a_ceiling() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "pollIntervalSeconds": 18446744073709551615 }"#).unwrap();
        assert_eq!(config.poll_interval_seconds, u64::MAX);
        assert_eq!(config.poll_interval(), Duration::from_secs(defaults::MAX_POLL_INTERVAL_SECS));
    }

    #[test]
    fn test_blank_directories_use_defaults() {
        let config = AppConfig {
            data_dir: Some("  ".to_string()),
            render_cache_dir: Some(String::new()),
            ..AppConfig::default()
        };
        assert_eq!(config.data_dir(), crate::store::default_data_dir());
        assert_eq!(config.render_cache_dir(), crate::cache::default_render_dir());
    }

    #[test]
    fn test_directories_are_expanded() {
        let config = AppConfig {
            data_dir: Some("/srv/quotes".to_string()),
            render_cache_dir: Some("/tmp/renders".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/srv/quotes"));
        assert_eq!(config.render_cache_dir(), PathBuf::from("/tmp/renders"));
    }

    #[test]
    fn test_parse_jsonc_with_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        fs::write(
            &path,
            r#"{
                // poll faster
                "pollIntervalSeconds": 2,
                /* smaller fallback */
                "fallbackResolution": { "width": 1920, "height": 1080 }
            }"#,
        )
        .unwrap();

        let (config, loaded_from) = load_config_from_path(&path).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.poll_interval_seconds, 2);
        assert_eq!(config.fallback_resolution, Resolution { width: 1920, height: 1080 });
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "$schema": "./schema.json", "logLevel": "debug" }"#).unwrap();

        let (config, _) = load_config_from_path(&path).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config_from_path(Path::new("/no/such/quotewall/config.jsonc"));
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_config_paths_order() {
        let paths = config_paths();
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| {
            let name = p.file_name().unwrap().to_string_lossy();
            name.ends_with(".json") || name.ends_with(".jsonc")
        }));
        // Directory files come before the home-directory dotfiles.
        let first_dotfile = paths.iter().position(|p| {
            p.file_name().unwrap().to_string_lossy().starts_with(".quotewall")
        });
        if let Some(index) = first_dotfile {
            assert!(
                paths[..index]
                    .iter()
                    .all(|p| p.ends_with("config.jsonc") || p.ends_with("config.json"))
            );
        }
    }
}
