//! Window discovery
//!
//! Titles are matched in two tiers. The first tier is the strict one (exact
//! title, then case-sensitive substring). If that finds nothing, every title is
//! compared case-insensitively, which tolerates suffixes and prefixes added by
//! the window manager or a dev build ("moltz (dev)", "Moltz - Onboarding").

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{WindowBackend, WindowInfo};
use crate::core::{Clock, WindowHandle};
use crate::error::{Error, Result};

/// Pick the window that best matches `hint`, or `None`.
///
/// Windows without a resolved size are never returned. Visible windows are
/// searched before hidden ones, so a tray helper sharing the app's title does
/// not shadow the real window.
pub fn select_window<'a>(windows: &'a [WindowInfo], hint: &str) -> Option<&'a WindowInfo> {
    let (shown, hidden): (Vec<_>, Vec<_>) = windows
        .iter()
        .filter(|w| w.bounds.is_resolved())
        .partition(|w| w.visible);

    match_title(&shown, hint).or_else(|| match_title(&hidden, hint))
}

fn match_title<'a>(windows: &[&'a WindowInfo], hint: &str) -> Option<&'a WindowInfo> {
    if let Some(exact) = windows.iter().find(|w| w.title == hint) {
        return Some(*exact);
    }
    if let Some(partial) = windows.iter().find(|w| w.title.contains(hint)) {
        return Some(*partial);
    }

    let needle = hint.to_lowercase();
    windows
        .iter()
        .find(|w| w.title.to_lowercase().contains(&needle))
        .copied()
}

/// Floor for the polling interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct WindowLocator {
    backend: Arc<dyn WindowBackend>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl WindowLocator {
    pub fn new(backend: Arc<dyn WindowBackend>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            backend,
            clock,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Look up the target window once
    pub async fn find_window(&self, hint: &str) -> Result<Option<WindowHandle>> {
        let windows = self.backend.list_windows().await?;

        Ok(select_window(&windows, hint).map(|w| WindowHandle {
            platform_id: w.platform_id.clone(),
            title: w.title.clone(),
            bounds: w.bounds,
        }))
    }

    /// Poll until a window matching `hint` shows up.
    ///
    /// The last sleep is shortened so the final lookup happens at `timeout`,
    /// which means failure is reported between `timeout` and
    /// `timeout + poll_interval` after the call.
    pub async fn wait_for_window(&self, hint: &str, timeout: Duration) -> Result<WindowHandle> {
        tracing::info!("Waiting for window matching {:?} (timeout {:?})", hint, timeout);
        let start = self.clock.now();

        loop {
            match self.find_window(hint).await {
                Ok(Some(window)) => {
                    let b = window.bounds;
                    tracing::info!(
                        "Found window: {} ({}x{} at {},{})",
                        window.title,
                        b.width,
                        b.height,
                        b.left,
                        b.top
                    );
                    return Ok(window);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Window lookup failed, retrying: {}", e),
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed >= timeout {
                return Err(Error::NotFound {
                    hint: hint.to_string(),
                    elapsed,
                });
            }

            self.clock
                .sleep(self.poll_interval.min(timeout - elapsed))
                .await;
        }
    }

    /// Ask the window manager to raise the window. Failure is only a warning:
    /// clicks can still land on a background window on most desktops.
    pub async fn activate(&self, window: &WindowHandle) -> Result<()> {
        self.backend
            .focus_window(&window.platform_id)
            .await
            .map_err(|e| Error::Activation(format!("{:#}", e)))
    }
}
