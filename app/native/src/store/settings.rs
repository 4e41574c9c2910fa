//! The small settings record persisted next to the playlists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::playlist::PlaylistId;

/// How a fire is spread over the connected monitors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum MultiMonitorMode {
    /// Only the primary monitor changes.
    #[default]
    Primary,
    /// The same entry on every monitor.
    All,
    /// A separate entry for each monitor.
    PerMonitor,
}

impl fmt::Display for MultiMonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::All => "all",
            Self::PerMonitor => "per-monitor",
        })
    }
}

/// User-facing rotation settings.
///
/// `activePlaylistId` mirrors the enabled flag in the playlist collection,
/// which stays authoritative if the two ever disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub active_playlist_id: Option<PlaylistId>,
    pub multi_monitor_mode: MultiMonitorMode,
    pub auto_pause_on_fullscreen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_playlist_id: None,
            multi_monitor_mode: MultiMonitorMode::Primary,
            auto_pause_on_fullscreen: true,
        }
    }
}
