//! Playlist persistence.
//!
//! All playlists live in a single `playlists.json` collection under the data
//! directory, next to a small `settings.json`. Every mutation is a locked
//! read-modify-write followed by an atomic replace of the file. The lock is
//! an in-process mutex plus an advisory lock on `playlists.lock`, so CLI
//! processes and the rotation worker do not lose each other's updates.
//!
//! Ownership of fields is split:
//! - the foreground owns names, entries and schedule fields ([`PlaylistStore::save`]),
//! - the worker owns `currentIndex` and `lastFired` ([`PlaylistStore::record_fire`]),
//! - enabling is a transaction that keeps at most one playlist enabled
//!   ([`PlaylistStore::set_active`]).

mod atomic;
mod settings;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::atomic::{read_json, write_json};
pub use self::settings::{MultiMonitorMode, Settings};
use crate::clock::{Clock, SystemClock};
use crate::constants::{APP_ID, COLLECTION_VERSION, LOCK_FILE, PLAYLISTS_FILE, SETTINGS_FILE};
use crate::playlist::{Playlist, PlaylistId, ValidationError};
use crate::schedule::FireBucket;

/// Errors raised by [`PlaylistStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a store file failed.
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A store file exists but does not parse.
    #[error("store file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the in-memory state failed.
    #[error("failed to serialize store state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No playlist with this id.
    #[error("playlist {0} not found")]
    NotFound(PlaylistId),

    /// The playlist cannot be saved or enabled as it is.
    #[error("playlist {id} is invalid: {source}")]
    Invalid {
        id: PlaylistId,
        #[source]
        source: ValidationError,
    },
}

impl StoreError {
    /// Returns whether the store itself is unusable until repaired or reset.
    #[must_use]
    pub const fn is_fatal(&self) -> bool { matches!(self, Self::Io { .. } | Self::Corrupt { .. }) }
}

/// On-disk shape of `playlists.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collection {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    playlists: Vec<Playlist>,
}

impl Collection {
    fn position(&self, id: PlaylistId) -> Option<usize> {
        self.playlists.iter().position(|p| p.id == id)
    }

    fn find_mut(&mut self, id: PlaylistId) -> Result<&mut Playlist, StoreError> {
        self.playlists.iter_mut().find(|p| p.id == id).ok_or(StoreError::NotFound(id))
    }
}

/// Held for the length of one read-modify-write.
///
/// Fields drop in order: the file lock is released before the mutex.
struct WriteGuard<'a> {
    _file: File,
    _process: MutexGuard<'a, ()>,
}

/// Crash-safe store of playlists and settings.
pub struct PlaylistStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    // Serialises read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl std::fmt::Debug for PlaylistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistStore").field("dir", &self.dir).finish_non_exhaustive()
    }
}

/// Default data directory (`<data dir>/quotewall`).
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(std::env::temp_dir).join(APP_ID)
}

impl PlaylistStore {
    /// Opens the store rooted at `dir`. Nothing is read until first use.
    #[must_use]
    pub fn open(dir: impl Into<PathBuf>) -> Self { Self::with_clock(dir, Arc::new(SystemClock)) }

    /// Opens the store with a custom clock for `modifiedAt`/`enabledAt` stamps.
    #[must_use]
    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self { dir: dir.into(), clock, lock: Mutex::new(()) }
    }

    /// Directory holding the store files.
    #[must_use]
    pub fn dir(&self) -> &Path { &self.dir }

    /// Path of the playlist collection.
    #[must_use]
    pub fn playlists_path(&self) -> PathBuf { self.dir.join(PLAYLISTS_FILE) }

    /// Path of the settings record.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf { self.dir.join(SETTINGS_FILE) }

    /// Returns every playlist in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error when the collection cannot be read.
    pub fn load_all(&self) -> Result<Vec<Playlist>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_collection()?.playlists)
    }

    /// Returns one playlist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids.
    pub fn get(&self, id: PlaylistId) -> Result<Playlist, StoreError> {
        let _guard = self.lock.lock();
        self.read_collection()?
            .playlists
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Returns the enabled playlist, if any.
    ///
    /// Should a hand-edited file contain several enabled playlists, the most
    /// recently enabled one wins.
    ///
    /// # Errors
    ///
    /// Returns an error when the collection cannot be read.
    pub fn active(&self) -> Result<Option<Playlist>, StoreError> {
        let _guard = self.lock.lock();
        let collection = self.read_collection()?;
        let mut enabled: Vec<Playlist> =
            collection.playlists.into_iter().filter(|p| p.enabled).collect();

        if enabled.len() > 1 {
            tracing::warn!(
                count = enabled.len(),
                "multiple playlists are enabled, using the most recently enabled one"
            );
        }

        enabled.sort_by_key(|p| p.enabled_at);
        Ok(enabled.pop())
    }

    /// Inserts a new playlist or updates an existing one.
    ///
    /// Only foreground-owned fields are taken from `playlist`. For an existing
    /// playlist the cursor, last fire bucket, enabled flag and timestamps are
    /// carried over from disk, and the cursor is clamped if entries shrank.
    /// New playlists are always stored disabled; use [`Self::set_active`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the schedule is malformed.
    pub fn save(&self, mut playlist: Playlist) -> Result<Playlist, StoreError> {
        playlist
            .validate_schedule()
            .map_err(|source| StoreError::Invalid { id: playlist.id, source })?;

        let _guard = self.lock_for_write()?;
        let mut collection = self.read_collection()?;
        let now = self.clock.now();

        if let Some(pos) = collection.position(playlist.id) {
            let existing = &collection.playlists[pos];
            playlist.enabled = existing.enabled;
            playlist.enabled_at = existing.enabled_at;
            playlist.created_at = existing.created_at;
            playlist.last_fired = existing.last_fired.clone();
            playlist.current_index = existing.current_index;
            playlist.current_index = playlist.cursor();
            playlist.modified_at = now;

            if playlist.enabled
                && let Err(error) = playlist.validate()
            {
                tracing::warn!(playlist = %playlist.id, %error, "active playlist saved in an unschedulable state");
            }

            collection.playlists[pos] = playlist.clone();
            tracing::debug!(playlist = %playlist.id, "playlist updated");
        } else {
            playlist.enabled = false;
            playlist.enabled_at = None;
            playlist.last_fired = None;
            playlist.current_index = playlist.cursor();
            playlist.modified_at = now;
            collection.playlists.push(playlist.clone());
            tracing::debug!(playlist = %playlist.id, name = %playlist.name, "playlist created");
        }

        self.write_collection(&collection)?;
        Ok(playlist)
    }

    /// Makes `id` the single enabled playlist.
    ///
    /// Every other playlist is disabled in the same write, `enabledAt` is
    /// stamped, and the id is mirrored into the settings record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the playlist cannot be scheduled
    /// and [`StoreError::NotFound`] for unknown ids.
    pub fn set_active(&self, id: PlaylistId) -> Result<Playlist, StoreError> {
        let _guard = self.lock_for_write()?;
        let mut collection = self.read_collection()?;

        let target = collection.find_mut(id)?;
        target.validate().map_err(|source| StoreError::Invalid { id, source })?;

        let now = self.clock.now();
        for playlist in &mut collection.playlists {
            if playlist.id == id {
                playlist.enabled = true;
                playlist.enabled_at = Some(now);
            } else {
                playlist.enabled = false;
            }
        }
        self.write_collection(&collection)?;

        let mut settings = self.read_settings()?;
        settings.active_playlist_id = Some(id);
        self.write_settings(&settings)?;

        tracing::info!(playlist = %id, "playlist enabled");
        collection.find_mut(id).cloned()
    }

    /// Disables whichever playlist is enabled.
    ///
    /// Returns the id that was active, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read or written.
    pub fn clear_active(&self) -> Result<Option<PlaylistId>, StoreError> {
        let _guard = self.lock_for_write()?;
        let mut collection = self.read_collection()?;

        let mut previous = None;
        for playlist in collection.playlists.iter_mut().filter(|p| p.enabled) {
            playlist.enabled = false;
            previous = Some(playlist.id);
        }
        if previous.is_some() {
            self.write_collection(&collection)?;
        }

        let mut settings = self.read_settings()?;
        if settings.active_playlist_id.take().is_some() {
            self.write_settings(&settings)?;
        }

        if let Some(id) = previous {
            tracing::info!(playlist = %id, "playlist disabled");
        }
        Ok(previous)
    }

    /// Removes a playlist. Deleting the active playlist deactivates rotation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids.
    pub fn delete(&self, id: PlaylistId) -> Result<Playlist, StoreError> {
        let _guard = self.lock_for_write()?;
        let mut collection = self.read_collection()?;
        let pos = collection.position(id).ok_or(StoreError::NotFound(id))?;
        let removed = collection.playlists.remove(pos);
        self.write_collection(&collection)?;

        let mut settings = self.read_settings()?;
        if settings.active_playlist_id == Some(id) {
            settings.active_playlist_id = None;
            self.write_settings(&settings)?;
        }

        tracing::info!(playlist = %id, name = %removed.name, "playlist deleted");
        Ok(removed)
    }

    /// Persists the worker-owned progress of a fire.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the playlist was deleted meanwhile.
    pub fn record_fire(
        &self,
        id: PlaylistId,
        cursor: usize,
        bucket: FireBucket,
    ) -> Result<(), StoreError> {
        let _guard = self.lock_for_write()?;
        let mut collection = self.read_collection()?;
        let playlist = collection.find_mut(id)?;
        playlist.last_fired = Some(bucket);
        playlist.current_index = cursor;
        playlist.current_index = playlist.cursor();
        self.write_collection(&collection)
    }

    /// Replaces the collection with an empty one.
    ///
    /// An existing (possibly corrupt) file is moved aside and its new path
    /// returned, so nothing is lost.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be moved or rewritten.
    pub fn reset(&self) -> Result<Option<PathBuf>, StoreError> {
        let _guard = self.lock_for_write()?;
        let path = self.playlists_path();

        let backup = if path.exists() {
            let stamp = self.clock.now().format("%Y%m%d%H%M%S");
            let backup = self.dir.join(format!("{PLAYLISTS_FILE}.{stamp}.bak"));
            fs::rename(&path, &backup)
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            tracing::warn!(backup = %backup.display(), "playlist collection moved aside");
            Some(backup)
        } else {
            None
        };

        self.write_collection(&Collection::default())?;

        let mut settings = self.read_settings().unwrap_or_default();
        settings.active_playlist_id = None;
        self.write_settings(&settings)?;

        Ok(backup)
    }

    /// Returns the settings record, or defaults when none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read.
    pub fn settings(&self) -> Result<Settings, StoreError> {
        let _guard = self.lock.lock();
        self.read_settings()
    }

    /// Edits the settings record.
    ///
    /// `activePlaylistId` is managed by [`Self::set_active`] and is kept as
    /// stored whatever `update` does to it.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be read or written.
    pub fn update_settings(
        &self,
        update: impl FnOnce(&mut Settings),
    ) -> Result<Settings, StoreError> {
        let _guard = self.lock_for_write()?;
        let mut settings = self.read_settings()?;
        let active = settings.active_playlist_id;
        update(&mut settings);
        settings.active_playlist_id = active;
        self.write_settings(&settings)?;
        Ok(settings)
    }

    fn lock_for_write(&self) -> Result<WriteGuard<'_>, StoreError> {
        let process = self.lock.lock();
        let path = self.dir.join(LOCK_FILE);
        let io_err = |source| StoreError::Io { path: path.clone(), source };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;

        Ok(WriteGuard { _file: file, _process: process })
    }

    fn read_collection(&self) -> Result<Collection, StoreError> {
        let path = self.playlists_path();
        let collection: Collection = read_json(&path)?.unwrap_or_default();
        if collection.version > COLLECTION_VERSION {
            tracing::warn!(
                version = collection.version,
                supported = COLLECTION_VERSION,
                "playlist collection was written by a newer version"
            );
        }
        Ok(collection)
    }

    fn write_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let collection = Collection {
            version: COLLECTION_VERSION,
            playlists: collection.playlists.clone(),
        };
        write_json(&self.playlists_path(), &collection)
    }

    fn read_settings(&self) -> Result<Settings, StoreError> {
        Ok(read_json(&self.settings_path())?.unwrap_or_default())
    }

    fn write_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        write_json(&self.settings_path(), settings)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, TimeZone};
    use tempfile::TempDir;

    use super::*;
    use crate::clock::ManualClock;
    use crate::playlist::{Entry, ScheduleType};

    fn start() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn store() -> (TempDir, Arc<ManualClock>, PlaylistStore) {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let store = PlaylistStore::with_clock(dir.path(), clock.clone());
        (dir, clock, store)
    }

    fn playlist(name: &str, entries: usize) -> Playlist {
        let mut playlist = Playlist::new(name, start());
        playlist.entries =
            (0..entries).map(|i| Entry::new(format!("q{i}"), format!("/bg/{i}.jpg"))).collect();
        playlist
    }

    #[test]
    fn test_empty_store_has_no_playlists() {
        let (_dir, _clock, store) = store();
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.active().unwrap().is_none());
        assert_eq!(store.settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_get() {
        let (_dir, _clock, store) = store();
        let saved = store.save(playlist("Morning", 2)).unwrap();
        let loaded = store.get(saved.id).unwrap();
        assert_eq!(loaded, saved);
        assert!(!loaded.enabled);
    }

    #[test]
    fn test_save_rejects_malformed_schedule() {
        let (_dir, _clock, store) = store();
        let mut p = playlist("Broken", 1);
        p.schedule_type = ScheduleType::Daily;
        p.schedule_time = Some("25:61".to_string());

        let err = store.save(p).unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }));
        assert!(!err.is_fatal());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_new_playlist_is_stored_disabled() {
        let (_dir, _clock, store) = store();
        let mut p = playlist("Sneaky", 1);
        p.enabled = true;
        let saved = store.save(p).unwrap();
        assert!(!saved.enabled);
        assert!(store.active().unwrap().is_none());
    }

    #[test]
    fn test_set_active_keeps_a_single_enabled_playlist() {
        let (_dir, clock, store) = store();
        let a = store.save(playlist("A", 1)).unwrap();
        let b = store.save(playlist("B", 1)).unwrap();

        store.set_active(a.id).unwrap();
        clock.advance(TimeDelta::minutes(1));
        let enabled = store.set_active(b.id).unwrap();

        assert_eq!(enabled.enabled_at, Some(clock.now()));
        let all = store.load_all().unwrap();
        assert_eq!(all.iter().filter(|p| p.enabled).count(), 1);
        assert_eq!(store.active().unwrap().unwrap().id, b.id);
        assert_eq!(store.settings().unwrap().active_playlist_id, Some(b.id));
    }

    #[test]
    fn test_set_active_rejects_empty_playlist() {
        let (_dir, _clock, store) = store();
        let empty = store.save(playlist("Empty", 0)).unwrap();
        let err = store.set_active(empty.id).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Invalid { source: ValidationError::EmptyPlaylist, .. }
        ));
        assert!(store.active().unwrap().is_none());
    }

    #[test]
    fn test_set_active_unknown_id() {
        let (_dir, _clock, store) = store();
        let err = store.set_active(PlaylistId::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_clear_active() {
        let (_dir, _clock, store) = store();
        let p = store.save(playlist("A", 1)).unwrap();
        store.set_active(p.id).unwrap();

        assert_eq!(store.clear_active().unwrap(), Some(p.id));
        assert!(store.active().unwrap().is_none());
        assert!(store.settings().unwrap().active_playlist_id.is_none());
        assert_eq!(store.clear_active().unwrap(), None);
    }

    #[test]
    fn test_save_preserves_worker_owned_fields() {
        let (_dir, clock, store) = store();
        let p = store.save(playlist("A", 4)).unwrap();
        store.set_active(p.id).unwrap();
        let bucket = FireBucket::Day { date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() };
        store.record_fire(p.id, 3, bucket.clone()).unwrap();

        // A foreground edit based on a stale copy.
        clock.advance(TimeDelta::minutes(5));
        let mut edit = p.clone();
        edit.name = "Renamed".to_string();
        let saved = store.save(edit).unwrap();

        assert_eq!(saved.name, "Renamed");
        assert_eq!(saved.current_index, 3);
        assert_eq!(saved.last_fired, Some(bucket));
        assert!(saved.enabled);
        assert_eq!(saved.modified_at, clock.now());
        assert_eq!(saved.created_at, p.created_at);
    }

    #[test]
    fn test_save_clamps_cursor_when_entries_shrink() {
        let (_dir, _clock, store) = store();
        let p = store.save(playlist("A", 5)).unwrap();
        store.record_fire(p.id, 4, FireBucket::Instant { at: start() }).unwrap();

        let mut edit = store.get(p.id).unwrap();
        edit.entries.truncate(2);
        let saved = store.save(edit).unwrap();
        assert!(saved.current_index < 2);
    }

    #[test]
    fn test_delete_active_playlist_clears_settings() {
        let (_dir, _clock, store) = store();
        let p = store.save(playlist("A", 1)).unwrap();
        store.set_active(p.id).unwrap();

        let removed = store.delete(p.id).unwrap();
        assert_eq!(removed.id, p.id);
        assert!(store.active().unwrap().is_none());
        assert!(store.settings().unwrap().active_playlist_id.is_none());
        assert!(matches!(store.delete(p.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_record_fire_for_deleted_playlist() {
        let (_dir, _clock, store) = store();
        let err = store
            .record_fire(PlaylistId::new(), 0, FireBucket::Instant { at: start() })
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_disable_from_another_store_survives_concurrent_fires() {
        let (dir, _clock, daemon) = store();
        let p = daemon.save(playlist("A", 3)).unwrap();
        let cli = PlaylistStore::open(dir.path());

        let daemon = Arc::new(daemon);
        let worker = {
            let daemon = Arc::clone(&daemon);
            std::thread::spawn(move || {
                for cursor in 0..200 {
                    daemon.record_fire(p.id, cursor, FireBucket::Instant { at: start() }).unwrap();
                }
            })
        };

        for _ in 0..50 {
            cli.set_active(p.id).unwrap();
            cli.clear_active().unwrap();
            assert!(!cli.get(p.id).unwrap().enabled);
        }
        worker.join().unwrap();

        assert!(!daemon.get(p.id).unwrap().enabled);
        assert!(dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_corrupt_collection_is_fatal_until_reset() {
        let (dir, _clock, store) = store();
        fs::write(dir.path().join(PLAYLISTS_FILE), "{ definitely not json").unwrap();

        let err = store.active().unwrap_err();
        assert!(err.is_fatal());

        let backup = store.reset().unwrap().unwrap();
        assert!(backup.exists());
        assert!(store.active().unwrap().is_none());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_active_prefers_most_recently_enabled() {
        let (dir, _clock, store) = store();
        let mut a = playlist("A", 1);
        a.enabled = true;
        a.enabled_at = Some(start());
        let mut b = playlist("B", 1);
        b.enabled = true;
        b.enabled_at = Some(start() + TimeDelta::hours(1));

        let collection = Collection { version: 1, playlists: vec![b.clone(), a] };
        write_json(&dir.path().join(PLAYLISTS_FILE), &collection).unwrap();

        assert_eq!(store.active().unwrap().unwrap().id, b.id);
    }

    #[test]
    fn test_update_settings_keeps_active_id() {
        let (_dir, _clock, store) = store();
        let p = store.save(playlist("A", 1)).unwrap();
        store.set_active(p.id).unwrap();

        let settings = store
            .update_settings(|s| {
                s.multi_monitor_mode = MultiMonitorMode::PerMonitor;
                s.active_playlist_id = None;
            })
            .unwrap();

        assert_eq!(settings.multi_monitor_mode, MultiMonitorMode::PerMonitor);
        assert_eq!(settings.active_playlist_id, Some(p.id));
        assert_eq!(store.settings().unwrap(), settings);
    }

    #[test]
    fn test_state_survives_reopen() {
        let (dir, _clock, store) = store();
        let p = store.save(playlist("A", 3)).unwrap();
        store.set_active(p.id).unwrap();
        store.record_fire(p.id, 2, FireBucket::Instant { at: start() }).unwrap();
        drop(store);

        let reopened = PlaylistStore::open(dir.path());
        let active = reopened.active().unwrap().unwrap();
        assert_eq!(active.id, p.id);
        assert_eq!(active.current_index, 2);
        assert_eq!(active.last_fired, Some(FireBucket::Instant { at: start() }));
    }
}
