//! Cache directory helpers.
//!
//! Rendered wallpapers go to `<cache dir>/quotewall/renders` unless the
//! configuration names another directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::APP_ID;

/// Root cache directory of the application, `/tmp/quotewall` when the platform has none.
#[must_use]
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(|| std::env::temp_dir().join(APP_ID), |cache| cache.join(APP_ID))
}

/// A named subdirectory of [`cache_dir`].
#[must_use]
pub fn cache_subdir(subdir: &str) -> PathBuf { cache_dir().join(subdir) }

/// Default location of rendered images.
#[must_use]
pub fn default_render_dir() -> PathBuf { cache_subdir("renders") }

/// Removes `dir` and everything below it, returning the bytes freed.
///
/// A missing directory frees nothing and is not an error.
///
/// # Errors
///
/// Returns the I/O error of the first entry that cannot be inspected or removed.
pub fn clear_dir(dir: &Path) -> io::Result<u64> {
    if !dir.exists() {
        return Ok(0);
    }

    let freed = dir_size(dir)?;
    fs::remove_dir_all(dir)?;
    Ok(freed)
}

fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            total += dir_size(&path)?;
        } else {
            total += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    Ok(total)
}
