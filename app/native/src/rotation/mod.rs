//! The rotation engine and its background worker.
//!
//! [`RotationEngine::run_cycle`] is one poll: read the active playlist, check
//! the fullscreen gate and the schedule, and fire when due. It never fails;
//! everything that goes wrong is logged and reported in the [`CycleOutcome`].
//! [`RotationWorker`] runs cycles on a named thread with a cancellable wait.

mod dispatch;
mod outcome;
mod signal;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub use self::dispatch::{Job, Plan};
pub use self::outcome::{ApplyReport, ApplyStatus, CycleOutcome, FireReport, WorkerState};
pub use self::signal::{Signal, WaitResult};
pub use self::worker::{RotationWorker, WorkerHandle};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::display::{DisplayTopology, Resolution};
use crate::fullscreen::FullscreenGate;
use crate::playlist::{Playlist, PlaylistId, ValidationError};
use crate::schedule::{self, EvalContext, FireBucket};
use crate::store::{MultiMonitorMode, PlaylistStore, Settings};
use crate::wallpaper::{CoverRenderer, ImageGenerator, SystemApplier, WallpaperApplier};

/// Values the engine runs with. Replaced wholesale by [`RotationEngine::reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    pub poll_interval: Duration,
    pub multi_monitor_mode: MultiMonitorMode,
    pub auto_pause_on_fullscreen: bool,
    pub fallback_resolution: Resolution,
}

impl Default for RotationConfig {
    fn default() -> Self { Self::from_parts(&AppConfig::default(), &Settings::default()) }
}

impl RotationConfig {
    /// Combines the application config with the persisted settings record.
    #[must_use]
    pub fn from_parts(config: &AppConfig, settings: &Settings) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            multi_monitor_mode: settings.multi_monitor_mode,
            auto_pause_on_fullscreen: settings.auto_pause_on_fullscreen,
            fallback_resolution: config.fallback_resolution,
        }
    }
}

/// Everything the engine talks to.
pub struct Collaborators {
    pub store: Arc<PlaylistStore>,
    pub topology: DisplayTopology,
    pub gate: FullscreenGate,
    pub generator: Box<dyn ImageGenerator>,
    pub applier: Box<dyn WallpaperApplier>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// The platform's own monitor, fullscreen and wallpaper backends.
    #[must_use]
    pub fn system(store: Arc<PlaylistStore>, config: &AppConfig) -> Self {
        Self {
            store,
            topology: DisplayTopology::system(config.fallback_resolution),
            gate: FullscreenGate::system(),
            generator: Box::new(CoverRenderer::new(config.render_cache_dir())),
            applier: Box::new(SystemApplier),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Which playlist is armed and since when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmRecord {
    playlist: PlaylistId,
    enabled_at: Option<DateTime<FixedOffset>>,
    armed_at: DateTime<FixedOffset>,
}

#[derive(Debug, Default)]
struct RotationState {
    armed: Option<ArmRecord>,
    // Mirrors the persisted buckets so a failed write cannot cause a re-fire.
    last_fired: HashMap<PlaylistId, FireBucket>,
    paused: bool,
    last_warning: Option<(PlaylistId, ValidationError)>,
    worker_state: WorkerState,
}

pub struct RotationEngine {
    config: RotationConfig,
    store: Arc<PlaylistStore>,
    topology: DisplayTopology,
    gate: FullscreenGate,
    generator: Box<dyn ImageGenerator>,
    applier: Box<dyn WallpaperApplier>,
    clock: Arc<dyn Clock>,
    signal: Arc<Signal>,
    rng: StdRng,
    state: RotationState,
}

impl RotationEngine {
    #[must_use]
    pub fn new(config: RotationConfig, collaborators: Collaborators) -> Self {
        let Collaborators { store, mut topology, gate, generator, applier, clock } = collaborators;
        topology.set_fallback(config.fallback_resolution);

        Self {
            config,
            store,
            topology,
            gate,
            generator,
            applier,
            clock,
            signal: Arc::new(Signal::new()),
            rng: StdRng::from_rng(&mut rand::rng()),
            state: RotationState::default(),
        }
    }

    /// Replaces the random source, for reproducible shuffles.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &RotationConfig { &self.config }

    #[must_use]
    pub const fn state(&self) -> WorkerState { self.state.worker_state }

    /// Cancellation and wake-up signal checked by the engine and its worker.
    #[must_use]
    pub fn signal(&self) -> Arc<Signal> { Arc::clone(&self.signal) }

    /// Applies a new configuration from the next cycle on.
    pub fn reload(&mut self, config: RotationConfig) {
        if config != self.config {
            tracing::info!(
                poll_interval = ?config.poll_interval,
                mode = %config.multi_monitor_mode,
                auto_pause = config.auto_pause_on_fullscreen,
                "rotation config reloaded"
            );
        }
        self.topology.set_fallback(config.fallback_resolution);
        self.config = config;
    }

    /// One poll of the rotation loop.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        if self.signal.is_cancelled() {
            self.state.worker_state = WorkerState::Stopped;
            return CycleOutcome::Stopped;
        }

        self.refresh_settings();
        let now = self.clock.now();

        let playlist = match self.store.active() {
            Ok(Some(playlist)) => playlist,
            Ok(None) => {
                self.disarm();
                return CycleOutcome::Idle;
            }
            Err(error) => {
                tracing::warn!(%error, fatal = error.is_fatal(), "cannot read playlists");
                self.disarm();
                return CycleOutcome::StoreUnavailable { error: error.to_string() };
            }
        };

        let armed_at = self.arm(&playlist, now);

        if let Err(error) = playlist.validate() {
            return self.invalid(&playlist, error);
        }
        self.state.last_warning = None;

        if self.config.auto_pause_on_fullscreen && self.gate.is_fullscreen_active() {
            if !self.state.paused {
                tracing::info!(playlist = %playlist.id, "fullscreen application detected, rotation paused");
            }
            self.state.paused = true;
            self.state.worker_state = WorkerState::Paused;
            return CycleOutcome::Paused { playlist: playlist.id };
        }
        if std::mem::take(&mut self.state.paused) {
            tracing::info!(playlist = %playlist.id, "rotation resumed");
        }

        let last_fired =
            self.state.last_fired.get(&playlist.id).cloned().or_else(|| playlist.last_fired.clone());
        let ctx = EvalContext { now, poll_interval: self.config.poll_interval, armed_at };

        let decision = match schedule::should_fire(&playlist, &ctx, last_fired.as_ref()) {
            Ok(decision) => decision,
            Err(error) => return self.invalid(&playlist, error),
        };

        if !decision.fire {
            self.state.worker_state = WorkerState::Armed;
            let next_fire =
                schedule::next_fire_estimate(&playlist, &ctx, last_fired.as_ref()).ok().flatten();
            tracing::trace!(playlist = %playlist.id, ?next_fire, "not due");
            return CycleOutcome::NotDue { playlist: playlist.id, next_fire };
        }

        self.state.worker_state = WorkerState::Firing;
        let report = self.fire(&playlist, decision.bucket, now);
        self.state.worker_state =
            if self.signal.is_cancelled() { WorkerState::Stopped } else { WorkerState::Armed };

        CycleOutcome::Fired(report)
    }

    fn refresh_settings(&mut self) {
        match self.store.settings() {
            Ok(settings) => {
                let mode = settings.multi_monitor_mode;
                let auto_pause = settings.auto_pause_on_fullscreen;
                if mode != self.config.multi_monitor_mode
                    || auto_pause != self.config.auto_pause_on_fullscreen
                {
                    tracing::info!(%mode, auto_pause, "rotation settings changed");
                    self.config.multi_monitor_mode = mode;
                    self.config.auto_pause_on_fullscreen = auto_pause;
                }
            }
            Err(error) => {
                tracing::debug!(%error, "cannot read settings, keeping current values");
            }
        }
    }

    /// Arms `playlist` unless it is already armed for the same enable
    /// transition, and returns the arm time.
    fn arm(&mut self, playlist: &Playlist, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        if let Some(armed) = self.state.armed
            && armed.playlist == playlist.id
            && armed.enabled_at == playlist.enabled_at
        {
            return armed.armed_at;
        }

        tracing::info!(playlist = %playlist.id, name = %playlist.name, schedule = %playlist.schedule_type, "playlist armed");
        self.state.armed =
            Some(ArmRecord { playlist: playlist.id, enabled_at: playlist.enabled_at, armed_at: now });
        self.state.paused = false;
        self.state.worker_state = WorkerState::Armed;
        now
    }

    fn disarm(&mut self) {
        if let Some(armed) = self.state.armed.take() {
            tracing::info!(playlist = %armed.playlist, "playlist disarmed");
        }
        self.state.paused = false;
        self.state.worker_state = WorkerState::Idle;
    }

    fn invalid(&mut self, playlist: &Playlist, error: ValidationError) -> CycleOutcome {
        let key = (playlist.id, error.clone());
        if self.state.last_warning.as_ref() != Some(&key) {
            tracing::warn!(playlist = %playlist.id, %error, "active playlist cannot be scheduled, skipping");
            self.state.last_warning = Some(key);
        }
        self.state.worker_state = WorkerState::Armed;
        CycleOutcome::Invalid { playlist: playlist.id, error: error.to_string() }
    }

    fn fire(
        &mut self,
        playlist: &Playlist,
        bucket: FireBucket,
        now: DateTime<FixedOffset>,
    ) -> FireReport {
        let monitors = self.topology.snapshot();
        let plan = dispatch::plan(self.config.multi_monitor_mode, playlist, &monitors, &mut self.rng);
        let applies = dispatch::run(
            playlist.id,
            &plan.jobs,
            self.generator.as_ref(),
            self.applier.as_ref(),
            &self.signal,
        );

        // Bucket and cursor advance whatever happened to the applies.
        self.state.last_fired.insert(playlist.id, bucket.clone());
        let persist_error = self
            .store
            .record_fire(playlist.id, plan.next_cursor, bucket.clone())
            .err()
            .map(|error| {
                tracing::warn!(playlist = %playlist.id, %error, "failed to persist fire");
                error.to_string()
            });

        let report = FireReport {
            playlist: playlist.id,
            fired_at: now,
            bucket,
            next_cursor: plan.next_cursor,
            applies,
            persist_error,
        };
        tracing::info!(
            playlist = %playlist.id,
            mode = %self.config.multi_monitor_mode,
            monitors = monitors.len(),
            applied = report.applied(),
            failed = report.failed(),
            "playlist fired"
        );
        report
    }
}
