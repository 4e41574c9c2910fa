//! Rendering and applying wallpapers.
//!
//! The rotation engine only talks to the [`ImageGenerator`] and
//! [`WallpaperApplier`] traits. [`CoverRenderer`] and [`SystemApplier`] are
//! the default implementations; quote layout and text compositing happen
//! outside this crate.

mod apply;
mod render;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use self::apply::SystemApplier;
pub use self::render::{CoverRenderer, is_supported_image, list_images_in_directory};
use crate::display::Bounds;
use crate::playlist::Entry;

/// Which monitor(s) an apply call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MonitorTarget {
    /// Every connected monitor.
    All,
    /// The monitor with this snapshot index.
    Monitor(usize),
}

impl fmt::Display for MonitorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Monitor(index) => write!(f, "monitor {index}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("wallpaper image not found: {0}")]
    MissingImage(PathBuf),
    #[error("no monitor at index {0}")]
    InvalidMonitor(usize),
    #[error("failed to set wallpaper: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("background image not found: {0}")]
    MissingBackground(PathBuf),
    #[error("unsupported background format: {0}")]
    Unsupported(PathBuf),
    #[error("cannot render into empty bounds {0}")]
    EmptyBounds(Bounds),
    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sets an image file as the desktop wallpaper.
pub trait WallpaperApplier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the OS rejects the image or the target.
    fn apply(&self, image: &Path, target: MonitorTarget) -> Result<(), ApplyError>;
}

/// Produces an image file for an entry at a monitor's size.
pub trait ImageGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the entry cannot be rendered.
    fn render(&self, entry: &Entry, bounds: Bounds) -> Result<PathBuf, RenderError>;
}
