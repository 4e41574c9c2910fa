//! Configuration file watcher for hot-reloading.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use super::{AppConfig, ConfigError, load_config_from_path};
use crate::constants::threads;
use crate::platform::spawn_named_thread;

/// Quiet period after the last change before the file is reloaded.
/// Some editors trigger multiple events per save (write to temp, rename, etc.).
const CONFIG_DEBOUNCE_MS: u64 = 200;

/// Watches `config_path` and calls `on_change` with the new configuration
/// after each save.
///
/// The parent directory is watched so that editors replacing the file are
/// noticed. A file that fails to parse is logged and skipped; the previous
/// configuration stays in effect.
///
/// # Errors
///
/// Returns the OS error when the watcher thread cannot be created.
pub fn watch_config_file<F>(config_path: PathBuf, mut on_change: F) -> io::Result<JoinHandle<()>>
where
    F: FnMut(AppConfig) + Send + 'static,
{
    spawn_named_thread(threads::CONFIG_WATCHER, move || {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
            Ok(watcher) => watcher,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create config watcher");
                return;
            }
        };

        let watch_path = config_path.parent().unwrap_or(&config_path);
        if let Err(err) = watcher.watch(watch_path, RecursiveMode::NonRecursive) {
            tracing::warn!(error = %err, path = %watch_path.display(), "failed to watch config file");
            return;
        }
        tracing::debug!(path = %config_path.display(), "watching config file");

        let debounce = Duration::from_millis(CONFIG_DEBOUNCE_MS);
        let Some(filename) = config_path.file_name() else {
            return;
        };

        while let Ok(event) = rx.recv() {
            match event {
                Ok(event) if affects_file(&event, filename) => {}
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "config watch error");
                    continue;
                }
            }

            // Wait for the burst of events from one save to settle.
            loop {
                match rx.recv_timeout(debounce) {
                    Ok(_) => {}
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }

            if let Some(config) = reload(&config_path) {
                on_change(config);
            }
        }
    })
}

fn affects_file(event: &Event, filename: &OsStr) -> bool {
    event.paths.iter().any(|path| path.file_name() == Some(filename))
}

fn reload(path: &Path) -> Option<AppConfig> {
    match load_config_from_path(path) {
        Ok((config, _)) => {
            tracing::info!(path = %path.display(), "configuration reloaded");
            Some(config)
        }
        Err(ConfigError::NotFound) => {
            tracing::debug!(path = %path.display(), "config file removed, keeping current values");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "invalid configuration, keeping current values");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use notify::EventKind;
    use notify::event::{CreateKind, ModifyKind};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_debounce_duration_is_reasonable() {
        const { assert!(CONFIG_DEBOUNCE_MS >= 100) };
        const { assert!(CONFIG_DEBOUNCE_MS <= 1000) };
    }

    #[test]
    fn test_affects_file_matches_by_name() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/home/me/.config/quotewall/config.jsonc"));
        assert!(affects_file(&event, OsStr::new("config.jsonc")));
        assert!(!affects_file(&event, OsStr::new("config.json")));

        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/home/me/.config/quotewall/.config.jsonc.swp"));
        assert!(!affects_file(&other, OsStr::new("config.jsonc")));
    }

    #[test]
    fn test_reload_keeps_nothing_on_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        fs::write(&path, "{ broken").unwrap();
        assert!(reload(&path).is_none());

        fs::write(&path, r#"{ "pollIntervalSeconds": 9 }"#).unwrap();
        assert_eq!(reload(&path).unwrap().poll_interval_seconds, 9);
    }

    #[test]
    fn test_reload_missing_file() {
        assert!(reload(Path::new("/no/such/config.jsonc")).is_none());
    }
}
