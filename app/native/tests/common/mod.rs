//! Shared fakes for driving `RotationEngine` without a desktop.
//!
//! Every fake keeps its state behind an `Arc` so a test can change monitors,
//! fullscreen state or apply failures after the engine took ownership.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Weekday};
use parking_lot::Mutex;
use quotewall_lib::clock::{Clock, ManualClock};
use quotewall_lib::display::{
    Bounds, DisplayTopology, MonitorDescriptor, Resolution, ScreenSource, TopologyError,
};
use quotewall_lib::fullscreen::{FullscreenGate, FullscreenProbe, ProbeError};
use quotewall_lib::playlist::{Entry, Playlist, PlaylistId, ScheduleType};
use quotewall_lib::rotation::{Collaborators, RotationConfig, RotationEngine};
use quotewall_lib::store::{MultiMonitorMode, PlaylistStore};
use quotewall_lib::wallpaper::{
    ApplyError, ImageGenerator, MonitorTarget, RenderError, WallpaperApplier,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

/// Monday 2 March 2026 at `hh:mm` UTC.
pub fn monday_at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

/// A row of `count` 1920x1080 monitors; the first one is primary.
pub fn monitors(count: usize) -> Vec<MonitorDescriptor> {
    (0..count)
        .map(|index| MonitorDescriptor {
            index,
            name: format!("DP-{index}"),
            bounds: Bounds {
                x: i32::try_from(index).unwrap() * 1920,
                y: 0,
                width: 1920,
                height: 1080,
            },
            primary: index == 0,
        })
        .collect()
}

#[derive(Clone)]
pub struct FakeScreens(pub Arc<Mutex<Result<Vec<MonitorDescriptor>, String>>>);

impl ScreenSource for FakeScreens {
    fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError> {
        self.0.lock().clone().map_err(TopologyError::Query)
    }
}

#[derive(Clone)]
pub struct FakeProbe(pub Arc<Mutex<Result<bool, String>>>);

impl FullscreenProbe for FakeProbe {
    fn probe(&self) -> Result<bool, ProbeError> {
        self.0.lock().clone().map_err(ProbeError::Query)
    }
}

/// Pretends to render by naming the output after the entry and size.
pub struct NamingRenderer;

impl ImageGenerator for NamingRenderer {
    fn render(&self, entry: &Entry, bounds: Bounds) -> Result<PathBuf, RenderError> {
        Ok(PathBuf::from(format!("{}@{}x{}", entry.background, bounds.width, bounds.height)))
    }
}

#[derive(Clone, Default)]
pub struct RecordingApplier {
    pub calls: Arc<Mutex<Vec<(PathBuf, MonitorTarget)>>>,
    pub fail_on: Arc<Mutex<Option<MonitorTarget>>>,
}

impl WallpaperApplier for RecordingApplier {
    fn apply(&self, image: &Path, target: MonitorTarget) -> Result<(), ApplyError> {
        self.calls.lock().push((image.to_path_buf(), target));
        if *self.fail_on.lock() == Some(target) {
            return Err(ApplyError::Backend(format!("{target} refused the image")));
        }
        Ok(())
    }
}

/// A store in a temporary directory plus handles on every fake.
pub struct Scenario {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub store: Arc<PlaylistStore>,
    pub screens: FakeScreens,
    pub probe: FakeProbe,
    pub applier: RecordingApplier,
}

impl Scenario {
    pub fn starting_at(start: DateTime<FixedOffset>) -> Self {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store =
            Arc::new(PlaylistStore::with_clock(dir.path(), Arc::clone(&clock) as Arc<dyn Clock>));

        Self {
            dir,
            clock,
            store,
            screens: FakeScreens(Arc::new(Mutex::new(Ok(monitors(1))))),
            probe: FakeProbe(Arc::new(Mutex::new(Ok(false)))),
            applier: RecordingApplier::default(),
        }
    }

    /// A fresh engine over the shared store and fakes, as after a process start.
    pub fn engine(&self) -> RotationEngine {
        self.engine_with(Duration::from_secs(1))
    }

    pub fn engine_with(&self, poll_interval: Duration) -> RotationEngine {
        let collaborators = Collaborators {
            store: Arc::clone(&self.store),
            topology: DisplayTopology::new(Box::new(self.screens.clone()), Resolution::default()),
            gate: FullscreenGate::new(Box::new(self.probe.clone())),
            generator: Box::new(NamingRenderer),
            applier: Box::new(self.applier.clone()),
            clock: Arc::clone(&self.clock) as Arc<dyn Clock>,
        };
        let settings = self.store.settings().unwrap_or_default();
        let config = RotationConfig {
            poll_interval,
            multi_monitor_mode: settings.multi_monitor_mode,
            auto_pause_on_fullscreen: settings.auto_pause_on_fullscreen,
            fallback_resolution: Resolution::default(),
        };
        RotationEngine::new(config, collaborators).with_rng(StdRng::seed_from_u64(42))
    }

    /// Saves and enables a playlist with `entries` entries.
    pub fn enable(&self, name: &str, entries: usize, edit: impl FnOnce(&mut Playlist)) -> PlaylistId {
        let mut playlist = Playlist::new(name, self.clock.now());
        playlist.entries = (0..entries)
            .map(|i| Entry::new(format!("quote-{i}"), format!("/bg/{name}-{i}.jpg")))
            .collect();
        edit(&mut playlist);
        let id = self.store.save(playlist).unwrap().id;
        self.store.set_active(id).unwrap();
        id
    }

    pub fn interval(&self, seconds: u64) -> PlaylistId {
        self.enable("interval", 3, |p| {
            p.schedule_type = ScheduleType::Interval;
            p.interval_seconds = seconds;
        })
    }

    pub fn daily(&self, time: &str) -> PlaylistId {
        let time = time.to_string();
        self.enable("daily", 3, move |p| {
            p.schedule_type = ScheduleType::Daily;
            p.schedule_time = Some(time);
        })
    }

    pub fn custom(&self, time: &str, days: &[Weekday]) -> PlaylistId {
        let time = time.to_string();
        let days = days.to_vec();
        self.enable("custom", 3, move |p| {
            p.schedule_type = ScheduleType::Custom;
            p.schedule_time = Some(time);
            p.days_of_week = days;
        })
    }

    pub fn set_mode(&self, mode: MultiMonitorMode) {
        self.store.update_settings(|s| s.multi_monitor_mode = mode).unwrap();
    }

    pub fn set_monitors(&self, result: Result<Vec<MonitorDescriptor>, String>) {
        *self.screens.0.lock() = result;
    }

    pub fn set_fullscreen(&self, result: Result<bool, String>) {
        *self.probe.0.lock() = result;
    }

    pub fn advance(&self, seconds: i64) { self.clock.advance(TimeDelta::seconds(seconds)); }

    pub fn set_time(&self, now: DateTime<FixedOffset>) { self.clock.set(now); }

    pub fn applied(&self) -> Vec<(PathBuf, MonitorTarget)> { self.applier.calls.lock().clone() }
}
