//! Desktop wallpaper via the OS.

use std::path::Path;

use super::{ApplyError, MonitorTarget, WallpaperApplier};

/// Applies wallpapers through the `wallpaper` crate.
///
/// On macOS single monitors are addressed through `NSWorkspace`. Elsewhere the
/// desktop only has one wallpaper, so a per-monitor apply sets it for all.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemApplier;

impl WallpaperApplier for SystemApplier {
    fn apply(&self, image: &Path, target: MonitorTarget) -> Result<(), ApplyError> {
        if !image.is_file() {
            return Err(ApplyError::MissingImage(image.to_path_buf()));
        }

        match target {
            MonitorTarget::All => set_all(image),
            MonitorTarget::Monitor(index) => set_monitor(image, index),
        }
    }
}

fn set_all(image: &Path) -> Result<(), ApplyError> {
    let path = image.to_string_lossy();
    wallpaper::set_from_path(&path).map_err(|err| ApplyError::Backend(err.to_string()))?;
    tracing::debug!(path = %path, "wallpaper set for all monitors");
    Ok(())
}

#[cfg(target_os = "macos")]
fn set_monitor(image: &Path, index: usize) -> Result<(), ApplyError> {
    use crate::platform::macos::{MacError, set_desktop_image};

    set_desktop_image(image, index).map_err(|err| match err {
        MacError::InvalidScreen(index) => ApplyError::InvalidMonitor(index),
        other => ApplyError::Backend(other.to_string()),
    })?;
    tracing::debug!(path = %image.display(), monitor = index, "wallpaper set");
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn set_monitor(image: &Path, index: usize) -> Result<(), ApplyError> {
    tracing::debug!(monitor = index, "per-monitor wallpapers unsupported here, setting all monitors");
    set_all(image)
}
