//! Configuration file template.
//!
//! Written on first run when no configuration file exists, with every option
//! documented and set to its default.

use std::fs;
use std::path::Path;

use crate::constants::defaults;

/// Generates the configuration template as a JSONC string.
#[must_use]
pub fn generate_config_template() -> String {
    format!(
        r#"{{
  // Quotewall configuration.
  // Generate the JSON schema with `quotewall schema > schema.json` for editor support.

  // Directory holding playlists.json and settings.json. `~` is expanded.
  // Defaults to the platform data directory (e.g. ~/.local/share/quotewall).
  // "dataDir": "~/quotes",

  // Seconds between two checks of the active playlist's schedule.
  "pollIntervalSeconds": {poll},

  // Monitor size assumed when no display can be detected.
  "fallbackResolution": {{ "width": {width}, "height": {height} }},

  // Log filter used when RUST_LOG is not set.
  // Examples: "info", "debug", "quotewall_lib::rotation=trace".
  "logLevel": "{level}"

  // Directory where rendered wallpapers are cached.
  // Defaults to the platform cache directory.
  // "renderCacheDir": "~/.cache/quotewall/renders"
}}
"#,
        poll = defaults::POLL_INTERVAL_SECS,
        width = defaults::FALLBACK_WIDTH,
        height = defaults::FALLBACK_HEIGHT,
        level = defaults::LOG_LEVEL,
    )
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_config_template())
}
