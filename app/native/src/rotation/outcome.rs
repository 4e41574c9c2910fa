//! What a rotation cycle did, for logs, the CLI and tests.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::playlist::PlaylistId;
use crate::schedule::FireBucket;
use crate::wallpaper::MonitorTarget;

/// Lifecycle state of the rotation worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkerState {
    /// No enabled playlist, or the store is unreadable.
    #[default]
    Idle,
    /// An enabled playlist is waiting for its next fire.
    Armed,
    /// Rendering and applying a fire.
    Firing,
    /// A fullscreen application holds rotation back.
    Paused,
    /// Shut down; the loop has ended.
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Firing => "firing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        })
    }
}

/// Result of one [`super::RotationEngine::run_cycle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CycleOutcome {
    /// Nothing is enabled.
    Idle,
    /// The store could not be read; retried next cycle.
    StoreUnavailable { error: String },
    /// The active playlist cannot be scheduled as it is.
    Invalid { playlist: PlaylistId, error: String },
    /// A fullscreen application is in front.
    Paused { playlist: PlaylistId },
    /// Not due yet.
    NotDue {
        playlist: PlaylistId,
        next_fire: Option<DateTime<FixedOffset>>,
    },
    /// The playlist fired.
    Fired(FireReport),
    /// The engine was cancelled.
    Stopped,
}

impl CycleOutcome {
    /// The playlist this outcome concerns, if any.
    #[must_use]
    pub const fn playlist(&self) -> Option<PlaylistId> {
        match self {
            Self::Invalid { playlist, .. }
            | Self::Paused { playlist }
            | Self::NotDue { playlist, .. } => Some(*playlist),
            Self::Fired(report) => Some(report.playlist),
            Self::Idle | Self::StoreUnavailable { .. } | Self::Stopped => None,
        }
    }

    #[must_use]
    pub const fn is_fired(&self) -> bool { matches!(self, Self::Fired(_)) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireReport {
    pub playlist: PlaylistId,
    pub fired_at: DateTime<FixedOffset>,
    pub bucket: FireBucket,
    /// Cursor persisted after the fire.
    pub next_cursor: usize,
    /// One record per render+apply, in monitor order.
    pub applies: Vec<ApplyReport>,
    /// Set when the bucket or cursor could not be persisted. The in-memory
    /// bucket still prevents a re-fire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

impl FireReport {
    /// Number of targets that now show the new wallpaper.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applies.iter().filter(|a| matches!(a.status, ApplyStatus::Applied { .. })).count()
    }

    /// Number of targets that failed or were cancelled.
    #[must_use]
    pub fn failed(&self) -> usize { self.applies.len() - self.applied() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub target: MonitorTarget,
    pub entry_index: usize,
    pub status: ApplyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ApplyStatus {
    Applied { image: PathBuf },
    RenderFailed { error: String },
    ApplyFailed { error: String },
    /// Shutdown arrived before this target was reached.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_worker_state_display() {
        assert_eq!(WorkerState::Paused.to_string(), "paused");
        assert_eq!(WorkerState::default(), WorkerState::Idle);
    }

    #[test]
    fn test_fire_report_counts() {
        let at = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let report = FireReport {
            playlist: PlaylistId::new(),
            fired_at: at,
            bucket: FireBucket::Instant { at },
            next_cursor: 1,
            applies: vec![
                ApplyReport {
                    target: MonitorTarget::Monitor(0),
                    entry_index: 0,
                    status: ApplyStatus::Applied { image: PathBuf::from("/a.jpg") },
                },
                ApplyReport {
                    target: MonitorTarget::Monitor(1),
                    entry_index: 1,
                    status: ApplyStatus::ApplyFailed { error: "denied".to_string() },
                },
            ],
            persist_error: None,
        };

        assert_eq!(report.applied(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(CycleOutcome::Fired(report.clone()).playlist(), Some(report.playlist));
    }

    #[test]
    fn test_cycle_outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(CycleOutcome::StoreUnavailable { error: "corrupt".into() }).unwrap();
        assert_eq!(json["kind"], "storeUnavailable");
        assert_eq!(json["error"], "corrupt");

        let json = serde_json::to_value(CycleOutcome::Idle).unwrap();
        assert_eq!(json["kind"], "idle");
    }
}
