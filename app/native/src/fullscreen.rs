//! Fullscreen detection.
//!
//! The gate is fail-open: whenever the probe cannot answer, rotation carries
//! on as if nothing were fullscreen.

use thiserror::Error;

/// Why a fullscreen probe could not answer.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("window server unavailable: {0}")]
    Unavailable(String),
    #[error("fullscreen query failed: {0}")]
    Query(String),
}

/// Platform check for a fullscreen foreground application.
pub trait FullscreenProbe: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the platform cannot be queried.
    fn probe(&self) -> Result<bool, ProbeError>;
}

/// Probe for platforms without fullscreen detection. Never fullscreen.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverFullscreen;

impl FullscreenProbe for NeverFullscreen {
    fn probe(&self) -> Result<bool, ProbeError> { Ok(false) }
}

/// `_NET_WM_STATE_FULLSCREEN` on the active X11 window.
#[cfg(target_os = "linux")]
#[derive(Default)]
pub struct X11FullscreenProbe {
    session: parking_lot::Mutex<Option<crate::platform::x11::X11Session>>,
}

#[cfg(target_os = "linux")]
impl FullscreenProbe for X11FullscreenProbe {
    fn probe(&self) -> Result<bool, ProbeError> {
        use crate::platform::x11::X11Session;

        let mut guard = self.session.lock();
        if guard.is_none() {
            let session =
                X11Session::connect().map_err(|err| ProbeError::Unavailable(err.to_string()))?;
            *guard = Some(session);
        }
        let Some(session) = guard.as_ref() else {
            return Ok(false);
        };

        match session.active_window_is_fullscreen() {
            Ok(fullscreen) => Ok(fullscreen),
            Err(err) => {
                *guard = None;
                Err(ProbeError::Query(err.to_string()))
            }
        }
    }
}

/// Frontmost window covering a whole display.
#[cfg(target_os = "macos")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MacFullscreenProbe;

#[cfg(target_os = "macos")]
impl FullscreenProbe for MacFullscreenProbe {
    fn probe(&self) -> Result<bool, ProbeError> {
        crate::platform::macos::frontmost_window_covers_screen()
            .map_err(|err| ProbeError::Query(err.to_string()))
    }
}

/// The best probe for the current platform.
#[must_use]
pub fn system_probe() -> Box<dyn FullscreenProbe> {
    #[cfg(target_os = "linux")]
    {
        Box::new(X11FullscreenProbe::default())
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(MacFullscreenProbe)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Box::new(NeverFullscreen)
    }
}

pub struct FullscreenGate {
    probe: Box<dyn FullscreenProbe>,
}

impl FullscreenGate {
    #[must_use]
    pub fn new(probe: Box<dyn FullscreenProbe>) -> Self { Self { probe } }

    #[must_use]
    pub fn system() -> Self { Self::new(system_probe()) }

    /// Whether a fullscreen application is in front. Probe errors count as `false`.
    #[must_use]
    pub fn is_fullscreen_active(&self) -> bool {
        self.probe.probe().unwrap_or_else(|error| {
            tracing::debug!(%error, "fullscreen probe failed, assuming not fullscreen");
            false
        })
    }
}
