//! Application-wide constants.

/// Application identifier used for data, cache and config directories.
pub const APP_ID: &str = "quotewall";

/// Name of the file holding every playlist, including rotation progress.
pub const PLAYLISTS_FILE: &str = "playlists.json";

/// Name of the small settings record.
pub const SETTINGS_FILE: &str = "settings.json";

/// Advisory lock taken by every process before it rewrites the store files.
pub const LOCK_FILE: &str = "playlists.lock";

/// Current version of the on-disk playlist collection format.
pub const COLLECTION_VERSION: u32 = 1;

/// Default values for configuration and new playlists.
pub mod defaults {
    /// Seconds between two polls of the rotation worker.
    pub const POLL_INTERVAL_SECS: u64 = 5;

    /// Upper bound on the poll interval; larger values are clamped.
    pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

    /// Interval used by newly created playlists.
    pub const PLAYLIST_INTERVAL_SECS: u64 = 300;

    /// Fallback monitor width when the display query fails.
    pub const FALLBACK_WIDTH: u32 = 2560;

    /// Fallback monitor height when the display query fails.
    pub const FALLBACK_HEIGHT: u32 = 1440;

    /// Log filter used when neither `RUST_LOG` nor the config sets one.
    pub const LOG_LEVEL: &str = "info";
}

/// Thread names (prefixed with the application id when spawned).
pub mod threads {
    pub const ROTATION: &str = "rotation";
    pub const CONFIG_WATCHER: &str = "config-watcher";
}
