//! Operating-system integration.
//!
//! - [`thread`]: named worker threads
//! - [`path`]: `~` expansion for user-supplied paths
//! - `x11` (Linux): RandR monitor queries and EWMH fullscreen detection
//! - `macos`: `NSScreen` enumeration, frontmost-window bounds and per-screen wallpapers

pub mod path;
pub mod thread;

#[cfg(target_os = "linux")]
pub mod x11;

#[cfg(target_os = "macos")]
pub mod macos;

pub use path::{expand, expand_and_resolve};
pub use thread::spawn_named_thread;
