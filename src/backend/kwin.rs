//! KWin focus path for KDE Plasma on Wayland
//!
//! Enumeration still goes through X11 (XWayland), but an X11 activation
//! request only flashes the taskbar entry on KWin/Wayland. Loading a one-shot
//! KWin script over D-Bus actually raises the window.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use zbus::Connection;
use zbus::zvariant::ObjectPath;

use super::{WindowBackend, WindowInfo};
use crate::core::PlatformWindowId;

const KWIN_SERVICE: &str = "org.kde.KWin";

/// Time given to KWin to apply an activation before it is checked
const ACTIVATION_SETTLE: Duration = Duration::from_millis(100);

pub struct KWinBackend {
    x11: Arc<dyn WindowBackend>,
    dbus: Connection,
}

/// Escape a title for embedding in a single-quoted JavaScript string
fn js_string(title: &str) -> String {
    title
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
}

/// Script that activates the first window whose caption equals `title`.
/// Handles both the KDE 6 (`windowList`/`activeWindow`) and KDE 5
/// (`clientList`/`activeClient`) scripting APIs.
fn activation_script(title: &str) -> String {
    format!(
        r#"
        (function() {{
            var windows = typeof workspace.windowList === 'function'
                ? workspace.windowList()
                : workspace.clientList();
            for (var i = 0; i < windows.length; i++) {{
                var w = windows[i];
                if ((w.caption || '') === '{}') {{
                    workspace.activeWindow = w;
                    workspace.activeClient = w;
                    break;
                }}
            }}
        }})();
        "#,
        js_string(title)
    )
}

/// A script that matched no caption still runs cleanly, so success is read
/// back from `_NET_ACTIVE_WINDOW` instead of from the script call.
fn confirm_active(target: &PlatformWindowId, active: Option<PlatformWindowId>, title: &str) -> anyhow::Result<()> {
    match active {
        Some(active) if &active == target => Ok(()),
        Some(active) => anyhow::bail!("{:?} is still active after activating {:?}", active, title),
        None => anyhow::bail!("no window is active after activating {:?}", title),
    }
}

impl KWinBackend {
    pub async fn new(x11: Arc<dyn WindowBackend>) -> anyhow::Result<Self> {
        let dbus = Connection::session().await?;
        Ok(Self { x11, dbus })
    }

    async fn activate_by_title(&self, title: &str) -> anyhow::Result<()> {
        // KWin only loads scripts from a file path
        let script_path =
            std::env::temp_dir().join(format!("onboard_runner_focus_{}.js", std::process::id()));
        tokio::fs::write(&script_path, activation_script(title)).await?;

        let result = self.run_script(&script_path.to_string_lossy()).await;
        let _ = tokio::fs::remove_file(&script_path).await;
        result
    }

    async fn run_script(&self, path: &str) -> anyhow::Result<()> {
        let reply = self
            .dbus
            .call_method(
                Some(KWIN_SERVICE),
                "/Scripting",
                Some("org.kde.kwin.Scripting"),
                "loadScript",
                &(path,),
            )
            .await?;

        let script_id: i32 = reply.body().deserialize()?;
        if script_id < 0 {
            anyhow::bail!("KWin refused to load activation script");
        }

        let object = format!("/{}", script_id);
        let object = ObjectPath::try_from(object.as_str())?;

        self.dbus
            .call_method(
                Some(KWIN_SERVICE),
                object.clone(),
                Some("org.kde.kwin.Script"),
                "run",
                &(),
            )
            .await?;

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Unloading is best effort; the script has already run
        let _ = self
            .dbus
            .call_method(
                Some(KWIN_SERVICE),
                object,
                Some("org.kde.kwin.Script"),
                "stop",
                &(),
            )
            .await;

        Ok(())
    }
}

#[async_trait]
impl WindowBackend for KWinBackend {
    async fn list_windows(&self) -> anyhow::Result<Vec<WindowInfo>> {
        self.x11.list_windows().await
    }

    async fn focus_window(&self, id: &PlatformWindowId) -> anyhow::Result<()> {
        let windows = self.x11.list_windows().await?;
        let window = windows
            .iter()
            .find(|w| &w.platform_id == id)
            .ok_or_else(|| anyhow::anyhow!("Window {:?} is gone", id))?;

        if let Err(e) = self.activate_by_title(&window.title).await {
            tracing::warn!("KWin D-Bus focus failed, falling back to X11: {}", e);
            self.x11.focus_window(id).await?;
        }

        tokio::time::sleep(ACTIVATION_SETTLE).await;
        confirm_active(id, self.x11.active_window().await?, &window.title)?;
        tracing::debug!("Focused window via KWin: {}", window.title);
        Ok(())
    }

    async fn active_window(&self) -> anyhow::Result<Option<PlatformWindowId>> {
        self.x11.active_window().await
    }
}
