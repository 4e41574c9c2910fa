//! Playlist data model.
//!
//! A playlist is an ordered list of entries (a quote over a background) plus
//! the schedule that decides when the next one is shown. Playlists are only
//! created, edited and deleted through [`crate::store::PlaylistStore`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::defaults;
use crate::schedule::FireBucket;

/// Unique playlist identifier (UUID v7, so ids sort by creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(Uuid);

impl PlaylistId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self { Self(Uuid::now_v7()) }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self { Self(uuid) }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid { &self.0 }
}

impl Default for PlaylistId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for PlaylistId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
}

/// Policy governing when a playlist's next entry is applied.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum ScheduleType {
    /// Every `intervalSeconds`.
    #[default]
    Interval,
    /// Once per calendar hour.
    Hourly,
    /// Once per day at `scheduleTime`.
    Daily,
    /// Once each time the playlist becomes active.
    OnLaunch,
    /// Like `Daily`, restricted to `daysOfWeek`.
    Custom,
}

impl ScheduleType {
    /// Returns whether this schedule needs a `scheduleTime`.
    #[must_use]
    pub const fn requires_time(self) -> bool { matches!(self, Self::Daily | Self::Custom) }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interval => "interval",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::OnLaunch => "on-launch",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// One quote + background combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Reference to the quote (an id or the quote text itself).
    pub quote: String,

    /// Path to the background image. `~` is expanded when rendering.
    pub background: String,

    /// Rendering overrides, passed through to the image generator untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

impl Entry {
    /// Creates an entry without rendering overrides.
    #[must_use]
    pub fn new(quote: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            background: background.into(),
            settings: None,
        }
    }
}

/// Reasons a playlist cannot be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The playlist has no entries.
    #[error("playlist has no entries")]
    EmptyPlaylist,
    /// `intervalSeconds` is zero.
    #[error("interval must be greater than zero seconds")]
    ZeroInterval,
    /// A daily or custom schedule without `scheduleTime`.
    #[error("{0} schedule requires a schedule time")]
    MissingScheduleTime(ScheduleType),
    /// `scheduleTime` is not a valid 24-hour `HH:MM` time.
    #[error("invalid schedule time '{0}', expected HH:MM")]
    InvalidScheduleTime(String),
    /// A custom schedule without any weekday selected.
    #[error("custom schedule has no days of week selected")]
    NoDaysSelected,
}

/// Parses a `HH:MM` 24-hour time.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidScheduleTime`] when the string is not a valid time.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = value.trim();
    // chrono accepts a single-digit minute with %M; insist on the HH:MM shape.
    let well_formed = trimmed
        .split_once(':')
        .is_some_and(|(h, m)| (1..=2).contains(&h.len()) && m.len() == 2);
    if !well_formed {
        return Err(ValidationError::InvalidScheduleTime(value.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| ValidationError::InvalidScheduleTime(value.to_string()))
}

/// A named, scheduled collection of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
    pub interval_seconds: u64,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_time: Option<String>,
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,

    /// When the playlist last became the active one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_at: Option<DateTime<FixedOffset>>,

    /// Sequential cursor. Owned by the rotation worker.
    #[serde(default)]
    pub current_index: usize,

    /// Bucket of the last fire. Owned by the rotation worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired: Option<FireBucket>,
}

impl Playlist {
    /// Creates an empty, disabled interval playlist.
    #[must_use]
    pub fn new(name: impl Into<String>, now: DateTime<FixedOffset>) -> Self {
        Self {
            id: PlaylistId::new(),
            name: name.into(),
            entries: Vec::new(),
            interval_seconds: defaults::PLAYLIST_INTERVAL_SECS,
            shuffle: false,
            enabled: false,
            schedule_type: ScheduleType::Interval,
            schedule_time: None,
            days_of_week: Vec::new(),
            created_at: now,
            modified_at: now,
            enabled_at: None,
            current_index: 0,
            last_fired: None,
        }
    }

    /// Returns the parsed schedule time, if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error when a schedule time is set but malformed.
    pub fn schedule_time(&self) -> Result<Option<NaiveTime>, ValidationError> {
        self.schedule_time.as_deref().map(parse_schedule_time).transpose()
    }

    /// Returns the schedule time required by daily and custom schedules.
    ///
    /// # Errors
    ///
    /// Returns an error when the time is missing or malformed.
    pub fn required_schedule_time(&self) -> Result<NaiveTime, ValidationError> {
        self.schedule_time()?.ok_or(ValidationError::MissingScheduleTime(self.schedule_type))
    }

    /// Checks the schedule fields only.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate_schedule(&self) -> Result<(), ValidationError> {
        if self.interval_seconds == 0 {
            return Err(ValidationError::ZeroInterval);
        }

        if self.schedule_type.requires_time() {
            self.required_schedule_time()?;
        } else {
            self.schedule_time()?;
        }

        if self.schedule_type == ScheduleType::Custom && self.days_of_week.is_empty() {
            return Err(ValidationError::NoDaysSelected);
        }

        Ok(())
    }

    /// Checks everything required for the playlist to be the active one.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_schedule()?;
        if self.entries.is_empty() {
            return Err(ValidationError::EmptyPlaylist);
        }
        Ok(())
    }

    /// Returns whether a custom schedule runs on the given weekday.
    #[must_use]
    pub fn runs_on(&self, weekday: Weekday) -> bool { self.days_of_week.contains(&weekday) }

    /// Cursor clamped into the current entry range.
    #[must_use]
    pub fn cursor(&self) -> usize {
        if self.entries.is_empty() { 0 } else { self.current_index % self.entries.len() }
    }
}
