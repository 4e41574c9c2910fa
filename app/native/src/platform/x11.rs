//! X11 queries: RandR monitors and EWMH fullscreen state.

use thiserror::Error;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

use crate::display::{Bounds, MonitorDescriptor};

#[derive(Debug, Error)]
pub enum X11Error {
    #[error("cannot connect to the X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("X server reported no screen {0}")]
    NoScreen(usize),
}

/// Atoms interned once per connection.
struct Atoms {
    net_active_window: Atom,
    net_wm_state: Atom,
    net_wm_state_fullscreen: Atom,
}

impl Atoms {
    fn intern(conn: &RustConnection) -> Result<Self, X11Error> {
        let intern = |name: &[u8]| -> Result<Atom, X11Error> {
            Ok(conn.intern_atom(false, name)?.reply()?.atom)
        };

        Ok(Self {
            net_active_window: intern(b"_NET_ACTIVE_WINDOW")?,
            net_wm_state: intern(b"_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern(b"_NET_WM_STATE_FULLSCREEN")?,
        })
    }
}

/// A connection to the default X display.
pub struct X11Session {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

impl X11Session {
    /// Connects to `$DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns an error when no X server is reachable.
    pub fn connect() -> Result<Self, X11Error> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or(X11Error::NoScreen(screen_num))?;
        let atoms = Atoms::intern(&conn)?;

        tracing::debug!(screen = screen_num, "connected to X server");
        Ok(Self { conn, root, atoms })
    }

    /// Active RandR monitors in server order.
    ///
    /// # Errors
    ///
    /// Returns an error when the RandR request fails.
    pub fn monitors(&self) -> Result<Vec<MonitorDescriptor>, X11Error> {
        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;

        reply
            .monitors
            .iter()
            .enumerate()
            .map(|(index, info)| -> Result<MonitorDescriptor, X11Error> {
                let name = self.conn.get_atom_name(info.name)?.reply()?;
                Ok(MonitorDescriptor {
                    index,
                    name: String::from_utf8_lossy(&name.name).into_owned(),
                    bounds: Bounds {
                        x: i32::from(info.x),
                        y: i32::from(info.y),
                        width: u32::from(info.width),
                        height: u32::from(info.height),
                    },
                    primary: info.primary,
                })
            })
            .collect()
    }

    /// Whether the window in `_NET_ACTIVE_WINDOW` carries `_NET_WM_STATE_FULLSCREEN`.
    ///
    /// # Errors
    ///
    /// Returns an error when a property request fails.
    pub fn active_window_is_fullscreen(&self) -> Result<bool, X11Error> {
        let active = self
            .conn
            .get_property(false, self.root, self.atoms.net_active_window, AtomEnum::WINDOW, 0, 1)?
            .reply()?;
        let Some(window) = active.value32().and_then(|mut values| values.next()) else {
            return Ok(false);
        };
        if window == x11rb::NONE {
            return Ok(false);
        }

        let state = self
            .conn
            .get_property(false, window, self.atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)?
            .reply()?;

        Ok(state
            .value32()
            .is_some_and(|mut atoms| atoms.any(|atom| atom == self.atoms.net_wm_state_fullscreen)))
    }
}
