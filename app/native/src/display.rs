//! Monitor enumeration.
//!
//! [`DisplayTopology::snapshot`] is called once per fire and never fails: when
//! the platform query errors or reports nothing, a single synthetic primary
//! monitor with the configured fallback resolution stands in.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::defaults;

/// Pixel rectangle of a monitor in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Bounds at the desktop origin.
    #[must_use]
    pub const fn sized(width: u32, height: u32) -> Self { Self { x: 0, y: 0, width, height } }

    /// Whether the rectangle has no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.width == 0 || self.height == 0 }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Resolution assumed when no monitor can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: defaults::FALLBACK_WIDTH,
            height: defaults::FALLBACK_HEIGHT,
        }
    }
}

/// One connected monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorDescriptor {
    /// Position in the snapshot, starting at 0.
    pub index: usize,
    pub name: String,
    pub bounds: Bounds,
    pub primary: bool,
}

impl MonitorDescriptor {
    /// The stand-in used when detection fails.
    #[must_use]
    pub fn synthetic(resolution: Resolution) -> Self {
        Self {
            index: 0,
            name: "fallback".to_string(),
            bounds: Bounds::sized(resolution.width, resolution.height),
            primary: true,
        }
    }
}

/// Errors from a monitor query.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// No display server could be reached.
    #[error("display server unavailable: {0}")]
    Unavailable(String),
    /// The display server answered with an error.
    #[error("monitor query failed: {0}")]
    Query(String),
}

/// Platform monitor query.
pub trait ScreenSource: Send + Sync {
    /// Lists the connected monitors. Index and primary flags are normalised
    /// by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform cannot be queried.
    fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError>;
}

/// Source for platforms without monitor detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScreens;

impl ScreenSource for NoScreens {
    fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError> { Ok(Vec::new()) }
}

/// RandR monitors of the X server in `$DISPLAY`.
///
/// The connection is opened lazily and dropped after any error, so a restarted
/// X server is picked up on the next query.
#[cfg(target_os = "linux")]
#[derive(Default)]
pub struct X11Screens {
    session: parking_lot::Mutex<Option<crate::platform::x11::X11Session>>,
}

#[cfg(target_os = "linux")]
impl ScreenSource for X11Screens {
    fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError> {
        use crate::platform::x11::X11Session;

        let mut guard = self.session.lock();
        if guard.is_none() {
            let session =
                X11Session::connect().map_err(|err| TopologyError::Unavailable(err.to_string()))?;
            *guard = Some(session);
        }
        let Some(session) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        match session.monitors() {
            Ok(monitors) => Ok(monitors),
            Err(err) => {
                *guard = None;
                Err(TopologyError::Query(err.to_string()))
            }
        }
    }
}

/// `NSScreen` monitors.
#[cfg(target_os = "macos")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MacScreens;

#[cfg(target_os = "macos")]
impl ScreenSource for MacScreens {
    fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError> {
        crate::platform::macos::screens().map_err(|err| TopologyError::Query(err.to_string()))
    }
}

/// The best [`ScreenSource`] for the current platform.
#[must_use]
pub fn system_source() -> Box<dyn ScreenSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(X11Screens::default())
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(MacScreens)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Box::new(NoScreens)
    }
}

/// Monitor snapshots with a guaranteed primary.
pub struct DisplayTopology {
    source: Box<dyn ScreenSource>,
    fallback: Resolution,
}

impl DisplayTopology {
    #[must_use]
    pub fn new(source: Box<dyn ScreenSource>, fallback: Resolution) -> Self {
        Self { source, fallback }
    }

    /// Topology backed by [`system_source`].
    #[must_use]
    pub fn system(fallback: Resolution) -> Self { Self::new(system_source(), fallback) }

    /// Changes the resolution used for the synthetic monitor.
    pub fn set_fallback(&mut self, fallback: Resolution) { self.fallback = fallback; }

    #[must_use]
    pub const fn fallback(&self) -> Resolution { self.fallback }

    /// Current monitors; never empty, exactly one is primary.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MonitorDescriptor> {
        match self.source.query() {
            Ok(monitors) => {
                let monitors = normalize(monitors);
                if monitors.is_empty() {
                    tracing::debug!(fallback = ?self.fallback, "no monitors reported, using fallback");
                    vec![MonitorDescriptor::synthetic(self.fallback)]
                } else {
                    monitors
                }
            }
            Err(error) => {
                tracing::warn!(%error, fallback = ?self.fallback, "monitor query failed, using fallback");
                vec![MonitorDescriptor::synthetic(self.fallback)]
            }
        }
    }
}

/// Drops zero-sized monitors, renumbers the rest and keeps exactly one primary
/// (the first flagged one, or the first monitor when none is flagged).
fn normalize(monitors: Vec<MonitorDescriptor>) -> Vec<MonitorDescriptor> {
    let mut monitors: Vec<_> = monitors.into_iter().filter(|m| !m.bounds.is_empty()).collect();
    let primary = monitors.iter().position(|m| m.primary).unwrap_or(0);

    for (index, monitor) in monitors.iter_mut().enumerate() {
        monitor.index = index;
        monitor.primary = index == primary;
    }

    monitors
}

/// The primary monitor of a snapshot.
#[must_use]
pub fn primary(monitors: &[MonitorDescriptor]) -> Option<&MonitorDescriptor> {
    monitors.iter().find(|m| m.primary).or_else(|| monitors.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<MonitorDescriptor>);

    impl ScreenSource for Fixed {
        fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError> { Ok(self.0.clone()) }
    }

    struct Failing;

    impl ScreenSource for Failing {
        fn query(&self) -> Result<Vec<MonitorDescriptor>, TopologyError> {
            Err(TopologyError::Unavailable("no display".to_string()))
        }
    }

    fn monitor(name: &str, x: i32, width: u32, primary: bool) -> MonitorDescriptor {
        MonitorDescriptor {
            index: 99,
            name: name.to_string(),
            bounds: Bounds { x, y: 0, width, height: 1080 },
            primary,
        }
    }

    #[test]
    fn test_failed_query_yields_single_fallback_primary() {
        let topology = DisplayTopology::new(Box::new(Failing), Resolution::default());
        let snapshot = topology.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].primary);
        assert_eq!(snapshot[0].bounds, Bounds::sized(2560, 1440));
    }

    #[test]
    fn test_empty_query_uses_configured_fallback() {
        let mut topology = DisplayTopology::new(Box::new(NoScreens), Resolution::default());
        topology.set_fallback(Resolution { width: 1920, height: 1080 });
        let snapshot = topology.snapshot();
        assert_eq!(snapshot, vec![MonitorDescriptor::synthetic(Resolution { width: 1920, height: 1080 })]);
    }

    #[test]
    fn test_first_monitor_becomes_primary_when_none_flagged() {
        let source = Fixed(vec![monitor("left", 0, 1920, false), monitor("right", 1920, 1920, false)]);
        let snapshot = DisplayTopology::new(Box::new(source), Resolution::default()).snapshot();
        assert!(snapshot[0].primary);
        assert!(!snapshot[1].primary);
        assert_eq!(snapshot.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_only_first_flagged_primary_is_kept() {
        let source = Fixed(vec![
            monitor("a", 0, 1920, false),
            monitor("b", 1920, 1920, true),
            monitor("c", 3840, 1920, true),
        ]);
        let snapshot = DisplayTopology::new(Box::new(source), Resolution::default()).snapshot();
        let primaries: Vec<_> = snapshot.iter().filter(|m| m.primary).map(|m| m.name.as_str()).collect();
        assert_eq!(primaries, vec!["b"]);
        assert_eq!(primary(&snapshot).unwrap().index, 1);
    }

    #[test]
    fn test_zero_sized_monitors_are_dropped() {
        let source = Fixed(vec![monitor("ghost", 0, 0, true), monitor("real", 0, 1920, false)]);
        let snapshot = DisplayTopology::new(Box::new(source), Resolution::default()).snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "real");
        assert!(snapshot[0].primary);
    }

    #[test]
    fn test_bounds_display() {
        assert_eq!(Bounds { x: -1920, y: 0, width: 1920, height: 1080 }.to_string(), "1920x1080+-1920+0");
    }
}
