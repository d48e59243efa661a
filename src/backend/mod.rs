//! Window backend abstraction
//!
//! The locator only needs two things from the desktop: the list of top-level
//! windows with their geometry, and a way to raise one of them. X11 (including
//! XWayland) is always the enumeration source; KDE Wayland sessions route
//! focus requests through KWin.

mod kwin;
mod x11;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{Bounds, PlatformWindowId};

/// Information about a window from the backend
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub platform_id: PlatformWindowId,
    pub title: String,
    pub bounds: Bounds,
    pub visible: bool,
}

/// Trait for window backend implementations
#[async_trait]
pub trait WindowBackend: Send + Sync {
    /// List all top-level windows
    async fn list_windows(&self) -> anyhow::Result<Vec<WindowInfo>>;

    /// Bring a window to the foreground
    async fn focus_window(&self, id: &PlatformWindowId) -> anyhow::Result<()>;

    /// The window that currently has focus, if any
    async fn active_window(&self) -> anyhow::Result<Option<PlatformWindowId>>;
}

/// Create the appropriate backend for the current environment
pub async fn create_backend() -> anyhow::Result<Arc<dyn WindowBackend>> {
    let Ok(display_var) = std::env::var("DISPLAY") else {
        anyhow::bail!("No display server detected. Set DISPLAY for X11 or XWayland.");
    };

    tracing::info!("Using X11 backend (DISPLAY={})", display_var);
    let x11: Arc<dyn WindowBackend> = Arc::new(x11::X11Backend::new()?);

    if !is_kde_wayland() {
        return Ok(x11);
    }

    match kwin::KWinBackend::new(x11.clone()).await {
        Ok(backend) => {
            tracing::info!("KDE Wayland session detected, focusing windows through KWin");
            Ok(Arc::new(backend))
        }
        Err(e) => {
            tracing::warn!("KWin D-Bus unavailable, staying on X11: {}", e);
            Ok(x11)
        }
    }
}

fn is_kde_wayland() -> bool {
    let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
    let kde = std::env::var("XDG_CURRENT_DESKTOP")
        .map(|d| d.to_uppercase().contains("KDE"))
        .unwrap_or(false);
    wayland && kde
}
