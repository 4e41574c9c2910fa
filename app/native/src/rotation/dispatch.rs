//! Fan-out of one fire over the monitor snapshot.

use rand::Rng;

use super::outcome::{ApplyReport, ApplyStatus};
use super::signal::Signal;
use crate::display::{self, Bounds, MonitorDescriptor};
use crate::playlist::{Entry, Playlist, PlaylistId};
use crate::selection;
use crate::store::MultiMonitorMode;
use crate::wallpaper::{ImageGenerator, MonitorTarget, WallpaperApplier};

/// One render+apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Job<'a> {
    pub entry_index: usize,
    pub entry: &'a Entry,
    pub bounds: Bounds,
    pub target: MonitorTarget,
}

/// Everything a fire will do, decided before any side effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<'a> {
    pub jobs: Vec<Job<'a>>,
    pub next_cursor: usize,
}

/// Selects entries and pairs them with targets for `mode`.
///
/// `monitors` must hold at least one descriptor, as returned by
/// [`display::DisplayTopology::snapshot`].
pub fn plan<'a, R: Rng + ?Sized>(
    mode: MultiMonitorMode,
    playlist: &'a Playlist,
    monitors: &[MonitorDescriptor],
    rng: &mut R,
) -> Plan<'a> {
    let Some(primary) = display::primary(monitors) else {
        return Plan { jobs: Vec::new(), next_cursor: playlist.current_index };
    };

    match mode {
        MultiMonitorMode::Primary | MultiMonitorMode::All => {
            let Some(selection) = selection::next(playlist, rng) else {
                return Plan { jobs: Vec::new(), next_cursor: playlist.current_index };
            };
            let target = if mode == MultiMonitorMode::All {
                MonitorTarget::All
            } else {
                MonitorTarget::Monitor(primary.index)
            };
            Plan {
                jobs: vec![Job {
                    entry_index: selection.index,
                    entry: selection.entry,
                    bounds: primary.bounds,
                    target,
                }],
                next_cursor: selection.next_cursor,
            }
        }
        MultiMonitorMode::PerMonitor => {
            let selections = selection::next_many(playlist, monitors.len(), rng);
            let next_cursor =
                selections.last().map_or(playlist.current_index, |s| s.next_cursor);
            let jobs = monitors
                .iter()
                .zip(selections)
                .map(|(monitor, selection)| Job {
                    entry_index: selection.index,
                    entry: selection.entry,
                    bounds: monitor.bounds,
                    target: MonitorTarget::Monitor(monitor.index),
                })
                .collect();
            Plan { jobs, next_cursor }
        }
    }
}

/// Runs every job independently; one failure never stops the others.
///
/// Cancellation is checked between jobs, and the remaining ones are reported
/// as cancelled.
pub fn run(
    playlist: PlaylistId,
    jobs: &[Job<'_>],
    generator: &dyn ImageGenerator,
    applier: &dyn WallpaperApplier,
    signal: &Signal,
) -> Vec<ApplyReport> {
    jobs.iter()
        .map(|job| {
            let status = if signal.is_cancelled() {
                ApplyStatus::Cancelled
            } else {
                execute(playlist, job, generator, applier)
            };
            ApplyReport { target: job.target, entry_index: job.entry_index, status }
        })
        .collect()
}

fn execute(
    playlist: PlaylistId,
    job: &Job<'_>,
    generator: &dyn ImageGenerator,
    applier: &dyn WallpaperApplier,
) -> ApplyStatus {
    let image = match generator.render(job.entry, job.bounds) {
        Ok(image) => image,
        Err(error) => {
            tracing::warn!(
                playlist = %playlist,
                target = %job.target,
                entry = job.entry_index,
                %error,
                "failed to render wallpaper"
            );
            return ApplyStatus::RenderFailed { error: error.to_string() };
        }
    };

    match applier.apply(&image, job.target) {
        Ok(()) => {
            tracing::debug!(
                playlist = %playlist,
                target = %job.target,
                entry = job.entry_index,
                image = %image.display(),
                "wallpaper applied"
            );
            ApplyStatus::Applied { image }
        }
        Err(error) => {
            tracing::warn!(
                playlist = %playlist,
                target = %job.target,
                entry = job.entry_index,
                %error,
                "failed to apply wallpaper"
            );
            ApplyStatus::ApplyFailed { error: error.to_string() }
        }
    }
}
