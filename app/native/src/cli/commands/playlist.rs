//! Playlist CLI commands.
//!
//! Every command goes through [`PlaylistStore`], so a running `quotewall run`
//! picks the change up on its next poll.

use std::path::PathBuf;

use chrono::Weekday;
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::Tabled;

use super::Context;
use crate::cli::output;
use crate::error::QuotewallError;
use crate::platform::path::expand_and_resolve;
use crate::playlist::{Entry, Playlist, PlaylistId, ScheduleType, parse_schedule_time};
use crate::store::PlaylistStore;
use crate::wallpaper::list_images_in_directory;

/// Playlist subcommands.
///
/// `<PLAYLIST>` accepts a full id, a unique id prefix or a playlist name.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum PlaylistCommands {
    /// List all playlists.
    List {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Show one playlist with its entries and rotation progress.
    Show {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        /// Output plain JSON without highlighting.
        #[arg(long, short)]
        json: bool,
    },

    /// Create a new, disabled playlist.
    #[command(after_long_help = r#"Examples:
  quotewall playlist create Morning --schedule daily --time 08:30
  quotewall playlist create Focus --schedule interval --interval 900 --shuffle
  quotewall playlist create Weekdays --schedule custom --time 09:00 --days mon,tue,wed,thu,fri"#)]
    Create {
        name: String,

        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Change the name or schedule of a playlist.
    Edit {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        /// New name.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Append one entry.
    AddEntry {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        /// Quote reference (an id or the quote text).
        #[arg(long, short)]
        quote: String,

        /// Background image path.
        #[arg(long, short)]
        background: String,

        /// Rendering overrides as a JSON object.
        #[arg(long, value_name = "JSON")]
        settings: Option<String>,
    },

    /// Remove the entry at a 0-based position.
    RemoveEntry {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        index: usize,
    },

    /// Append one entry per supported image in a directory, in natural order.
    Import {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        #[arg(value_name = "DIR")]
        dir: String,

        /// Quote reference used for every imported entry.
        #[arg(long, short)]
        quote: String,
    },

    /// Make a playlist the active one. Any other playlist is disabled.
    Enable {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,
    },

    /// Disable the active playlist.
    Disable,

    /// Delete a playlist.
    Delete {
        #[arg(value_name = "PLAYLIST")]
        playlist: String,
    },

    /// Back up the playlist file and start from an empty collection.
    ///
    /// Use this when the file is corrupt; the old file is kept next to it
    /// with a timestamped `.bak` suffix.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
}

/// Schedule options shared by `create` and `edit`.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduleArgs {
    /// When entries change.
    #[arg(long, value_enum)]
    pub schedule: Option<ScheduleType>,

    /// Seconds between changes for interval schedules.
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Time of day for daily and custom schedules.
    #[arg(long, value_name = "HH:MM")]
    pub time: Option<String>,

    /// Weekdays for custom schedules, comma separated.
    #[arg(long, value_delimiter = ',', value_parser = parse_weekday, value_name = "DAYS")]
    pub days: Vec<Weekday>,

    /// Pick entries at random instead of in order.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub shuffle: Option<bool>,
}

impl ScheduleArgs {
    /// Writes the given options into `playlist`.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed `--time`.
    pub fn apply(&self, playlist: &mut Playlist) -> Result<(), QuotewallError> {
        if let Some(schedule) = self.schedule {
            playlist.schedule_type = schedule;
        }
        if let Some(interval) = self.interval {
            playlist.interval_seconds = interval;
        }
        if let Some(time) = &self.time {
            let parsed = parse_schedule_time(time)?;
            playlist.schedule_time = Some(parsed.format("%H:%M").to_string());
        }
        if !self.days.is_empty() {
            let mut days = self.days.clone();
            days.sort_by_key(Weekday::num_days_from_monday);
            days.dedup();
            playlist.days_of_week = days;
        }
        if let Some(shuffle) = self.shuffle {
            playlist.shuffle = shuffle;
        }
        Ok(())
    }

    fn is_empty(&self) -> bool { *self == Self::default() }
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value.trim().parse::<Weekday>().map_err(|_| {
        format!("invalid weekday '{value}', expected mon, tue, wed, thu, fri, sat or sun")
    })
}

/// Execute playlist subcommands.
///
/// # Errors
///
/// Returns an error if the playlist cannot be found, is invalid or the store
/// cannot be read or written.
pub fn execute(cmd: &PlaylistCommands, ctx: &Context) -> Result<(), QuotewallError> {
    let store = ctx.store();

    match cmd {
        PlaylistCommands::List { json } => list(&store, *json),
        PlaylistCommands::Show { playlist, json } => show(&store, playlist, *json),
        PlaylistCommands::Create { name, schedule } => create(&store, ctx, name, schedule),
        PlaylistCommands::Edit { playlist, name, schedule } => {
            edit(&store, playlist, name.as_deref(), schedule)
        }
        PlaylistCommands::AddEntry { playlist, quote, background, settings } => {
            add_entry(&store, playlist, quote, background, settings.as_deref())
        }
        PlaylistCommands::RemoveEntry { playlist, index } => {
            remove_entry(&store, playlist, *index)
        }
        PlaylistCommands::Import { playlist, dir, quote } => import(&store, playlist, dir, quote),
        PlaylistCommands::Enable { playlist } => {
            let id = resolve(&store, playlist)?.id;
            let enabled = store.set_active(id)?;
            println!("{} is now the active playlist.", enabled.name.bold());
            Ok(())
        }
        PlaylistCommands::Disable => {
            match store.clear_active()? {
                Some(id) => println!("Playlist {id} disabled."),
                None => println!("{}", "No playlist was active.".dimmed()),
            }
            Ok(())
        }
        PlaylistCommands::Delete { playlist } => {
            let id = resolve(&store, playlist)?.id;
            let deleted = store.delete(id)?;
            println!("Deleted playlist {}.", deleted.name.bold());
            Ok(())
        }
        PlaylistCommands::Reset { yes } => reset(&store, *yes),
    }
}

/// Finds a playlist by id, unique id prefix or case-insensitive name.
///
/// # Errors
///
/// Returns an error when nothing or more than one playlist matches.
pub fn resolve(store: &PlaylistStore, query: &str) -> Result<Playlist, QuotewallError> {
    if let Ok(id) = query.parse::<PlaylistId>() {
        return Ok(store.get(id)?);
    }

    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(QuotewallError::InvalidArguments("playlist name must not be empty".into()));
    }

    let mut matches = store
        .load_all()?
        .into_iter()
        .filter(|p| p.name.to_lowercase() == needle || p.id.to_string().starts_with(&needle));

    match (matches.next(), matches.next()) {
        (Some(playlist), None) => Ok(playlist),
        (None, _) => Err(QuotewallError::InvalidArguments(format!("no playlist matches '{query}'"))),
        (Some(_), Some(_)) => Err(QuotewallError::InvalidArguments(format!(
            "'{query}' matches more than one playlist, use the full id"
        ))),
    }
}

/// One-line summary of a playlist's schedule.
#[must_use]
pub fn describe_schedule(playlist: &Playlist) -> String {
    let time = playlist.schedule_time.as_deref().unwrap_or("?");
    match playlist.schedule_type {
        ScheduleType::Interval => format!("every {}s", playlist.interval_seconds),
        ScheduleType::Hourly => "hourly".to_string(),
        ScheduleType::Daily => format!("daily {time}"),
        ScheduleType::OnLaunch => "on launch".to_string(),
        ScheduleType::Custom => {
            let days: Vec<String> = playlist.days_of_week.iter().map(ToString::to_string).collect();
            format!("{} {time}", days.join(","))
        }
    }
}

#[derive(Tabled)]
struct PlaylistRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
    #[tabled(rename = "Entries")]
    entries: usize,
    #[tabled(rename = "Shuffle")]
    shuffle: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

fn list(store: &PlaylistStore, json: bool) -> Result<(), QuotewallError> {
    let playlists = store.load_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&playlists)?);
        return Ok(());
    }
    if playlists.is_empty() {
        println!("{}", "No playlists yet. Create one with 'quotewall playlist create'.".dimmed());
        return Ok(());
    }

    let rows = playlists
        .iter()
        .map(|p| PlaylistRow {
            id: p.id.to_string().chars().take(8).collect(),
            name: output::truncate(&p.name, 32),
            schedule: describe_schedule(p),
            entries: p.entries.len(),
            shuffle: output::format_bool(p.shuffle),
            active: output::format_bool(p.enabled),
            modified: output::format_time(Some(p.modified_at)),
        })
        .collect();
    output::print_table("Playlists", rows);
    Ok(())
}

fn show(store: &PlaylistStore, query: &str, json: bool) -> Result<(), QuotewallError> {
    let playlist = resolve(store, query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&playlist)?);
    } else {
        output::print_highlighted_json(&serde_json::to_value(&playlist)?);
    }
    Ok(())
}

fn create(
    store: &PlaylistStore,
    ctx: &Context,
    name: &str,
    schedule: &ScheduleArgs,
) -> Result<(), QuotewallError> {
    if name.trim().is_empty() {
        return Err(QuotewallError::InvalidArguments("playlist name must not be empty".into()));
    }

    let mut playlist = Playlist::new(name.trim(), ctx.now());
    schedule.apply(&mut playlist)?;
    let saved = store.save(playlist)?;

    println!("Created playlist {} ({})", saved.name.bold(), saved.id);
    println!("Add entries with 'quotewall playlist add-entry {}' and enable it.", saved.id);
    Ok(())
}

fn edit(
    store: &PlaylistStore,
    query: &str,
    name: Option<&str>,
    schedule: &ScheduleArgs,
) -> Result<(), QuotewallError> {
    if name.is_none() && schedule.is_empty() {
        return Err(QuotewallError::InvalidArguments("nothing to change".into()));
    }

    let mut playlist = resolve(store, query)?;
    if let Some(name) = name {
        playlist.name = name.trim().to_string();
    }
    schedule.apply(&mut playlist)?;
    let saved = store.save(playlist)?;

    println!("Updated {}: {}", saved.name.bold(), describe_schedule(&saved));
    Ok(())
}

fn add_entry(
    store: &PlaylistStore,
    query: &str,
    quote: &str,
    background: &str,
    settings: Option<&str>,
) -> Result<(), QuotewallError> {
    let mut playlist = resolve(store, query)?;

    // The worker may run from another directory, so store absolute paths.
    let background = expand_and_resolve(background, &std::env::current_dir()?);
    let mut entry = Entry::new(quote, background.display().to_string());
    if let Some(raw) = settings {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|err| {
            QuotewallError::InvalidArguments(format!("--settings is not valid JSON: {err}"))
        })?;
        if !value.is_object() {
            return Err(QuotewallError::InvalidArguments("--settings must be a JSON object".into()));
        }
        entry.settings = Some(value);
    }
    if !background.is_file() {
        println!("{} background {} does not exist yet", "warning:".yellow(), background.display());
    }

    playlist.entries.push(entry);
    let saved = store.save(playlist)?;
    println!("Added entry #{} to {}.", saved.entries.len() - 1, saved.name.bold());
    Ok(())
}

fn remove_entry(store: &PlaylistStore, query: &str, index: usize) -> Result<(), QuotewallError> {
    let mut playlist = resolve(store, query)?;
    if index >= playlist.entries.len() {
        return Err(QuotewallError::InvalidArguments(format!(
            "{} has {} entries, no entry #{index}",
            playlist.name,
            playlist.entries.len()
        )));
    }

    let removed = playlist.entries.remove(index);
    let saved = store.save(playlist)?;
    println!("Removed '{}' from {}.", output::truncate(&removed.quote, 40), saved.name.bold());
    if saved.enabled && saved.entries.is_empty() {
        println!("{} the active playlist has no entries and will not rotate", "warning:".yellow());
    }
    Ok(())
}

fn import(store: &PlaylistStore, query: &str, dir: &str, quote: &str) -> Result<(), QuotewallError> {
    let dir: PathBuf = expand_and_resolve(dir, &std::env::current_dir()?);
    if !dir.is_dir() {
        return Err(QuotewallError::InvalidArguments(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let images = list_images_in_directory(&dir);
    if images.is_empty() {
        return Err(QuotewallError::InvalidArguments(format!(
            "no jpg or png images in {}",
            dir.display()
        )));
    }

    let mut playlist = resolve(store, query)?;
    let count = images.len();
    playlist
        .entries
        .extend(images.iter().map(|path| Entry::new(quote, path.display().to_string())));
    let saved = store.save(playlist)?;

    println!("Imported {count} entries into {} ({} total).", saved.name.bold(), saved.entries.len());
    Ok(())
}

fn reset(store: &PlaylistStore, yes: bool) -> Result<(), QuotewallError> {
    if !yes {
        return Err(QuotewallError::InvalidArguments(
            "reset replaces every playlist with an empty collection; pass --yes to confirm".into(),
        ));
    }

    match store.reset()? {
        Some(backup) => println!("Playlists reset. Previous file saved as {}", backup.display()),
        None => println!("Playlists reset."),
    }
    Ok(())
}
