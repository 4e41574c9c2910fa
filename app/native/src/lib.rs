//! Quotewall - scheduled quote wallpaper playlists.
//!
//! The library holds the playlist scheduling and rotation engine and the
//! command-line interface that hosts it. The binary only calls [`cli::run`].
//!
//! Leaves first: [`display`] and [`fullscreen`] answer questions about the
//! desktop, [`schedule`] and [`selection`] are pure decisions over a
//! [`playlist::Playlist`], [`store`] persists playlists, and [`rotation`]
//! composes all of them into a background worker.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod fullscreen;
pub mod platform;
pub mod playlist;
pub mod rotation;
pub mod schedule;
pub mod selection;
pub mod store;
pub mod wallpaper;
