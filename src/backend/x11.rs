//! X11 window backend using x11rb

use async_trait::async_trait;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

use super::{WindowBackend, WindowInfo};
use crate::core::{Bounds, PlatformWindowId};

/// X11 window backend
pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

struct Atoms {
    net_client_list: Atom,
    net_wm_name: Atom,
    net_active_window: Atom,
    net_wm_state: Atom,
    net_wm_state_hidden: Atom,
    wm_name: Atom,
    utf8_string: Atom,
}

impl Atoms {
    fn intern(conn: &RustConnection) -> anyhow::Result<Self> {
        let atom = |name: &[u8]| -> anyhow::Result<Atom> {
            Ok(conn.intern_atom(false, name)?.reply()?.atom)
        };

        Ok(Self {
            net_client_list: atom(b"_NET_CLIENT_LIST")?,
            net_wm_name: atom(b"_NET_WM_NAME")?,
            net_active_window: atom(b"_NET_ACTIVE_WINDOW")?,
            net_wm_state: atom(b"_NET_WM_STATE")?,
            net_wm_state_hidden: atom(b"_NET_WM_STATE_HIDDEN")?,
            wm_name: atom(b"WM_NAME")?,
            utf8_string: atom(b"UTF8_STRING")?,
        })
    }
}

/// Split a 32-bit format property into its values
fn u32_values(data: &[u8]) -> impl Iterator<Item = u32> + '_ {
    data.chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
}

impl X11Backend {
    pub fn new() -> anyhow::Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::intern(&conn)?;

        Ok(Self { conn, root, atoms })
    }

    fn property(&self, window: Window, property: Atom, type_: Atom) -> anyhow::Result<Option<Vec<u8>>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)?
            .reply()?;

        Ok((!reply.value.is_empty()).then_some(reply.value))
    }

    fn string_property(&self, window: Window, property: Atom, type_: Atom) -> Option<String> {
        self.property(window, property, type_)
            .ok()
            .flatten()
            .and_then(|data| String::from_utf8(data).ok())
    }

    fn title(&self, window: Window) -> String {
        // _NET_WM_NAME is UTF-8; WM_NAME is the legacy fallback
        self.string_property(window, self.atoms.net_wm_name, self.atoms.utf8_string)
            .or_else(|| self.string_property(window, self.atoms.wm_name, AtomEnum::STRING.into()))
            .unwrap_or_default()
    }

    fn bounds(&self, window: Window) -> anyhow::Result<Bounds> {
        let geom = self.conn.get_geometry(window)?.reply()?;
        let origin = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)?
            .reply()?;

        Ok(Bounds::new(
            origin.dst_x as i32,
            origin.dst_y as i32,
            geom.width as u32,
            geom.height as u32,
        ))
    }

    fn is_visible(&self, window: Window) -> bool {
        if let Ok(Some(state)) = self.property(window, self.atoms.net_wm_state, AtomEnum::ATOM.into()) {
            if u32_values(&state).any(|a| a == self.atoms.net_wm_state_hidden) {
                return false;
            }
        }

        self.conn
            .get_window_attributes(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|attrs| attrs.map_state == xproto::MapState::VIEWABLE)
            .unwrap_or(true)
    }
}

#[async_trait]
impl WindowBackend for X11Backend {
    async fn list_windows(&self) -> anyhow::Result<Vec<WindowInfo>> {
        let Some(clients) = self.property(self.root, self.atoms.net_client_list, AtomEnum::WINDOW.into())? else {
            return Ok(Vec::new());
        };

        let windows = u32_values(&clients)
            .map(|id| WindowInfo {
                platform_id: PlatformWindowId::X11(id),
                title: self.title(id),
                // A window that vanished mid-enumeration reports empty bounds and is skipped by the locator
                bounds: self.bounds(id).unwrap_or_default(),
                visible: self.is_visible(id),
            })
            .collect();

        Ok(windows)
    }

    async fn focus_window(&self, id: &PlatformWindowId) -> anyhow::Result<()> {
        let PlatformWindowId::X11(window) = id;

        // Source indication 1 = application
        let event = xproto::ClientMessageEvent::new(
            32,
            *window,
            self.atoms.net_active_window,
            [1, 0, 0, 0, 0],
        );

        self.conn.send_event(
            false,
            self.root,
            xproto::EventMask::SUBSTRUCTURE_REDIRECT | xproto::EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    async fn active_window(&self) -> anyhow::Result<Option<PlatformWindowId>> {
        let active = self
            .property(self.root, self.atoms.net_active_window, AtomEnum::WINDOW.into())?
            .and_then(|data| u32_values(&data).next())
            .filter(|&id| id != x11rb::NONE);

        Ok(active.map(PlatformWindowId::X11))
    }
}
