//! Input simulation via ydotool
//!
//! ydotool writes to uinput at the kernel level, so the same calls work on
//! X11 and Wayland. Every event is followed by a fixed settle pause; there is
//! no readiness signal from the target application.
//!
//! Text is never typed key by key. [`InputController::type_text`] clears the
//! focused field, puts the text on the clipboard and pastes it, which reaches
//! the application as one event whatever the content is.

pub mod clipboard;
pub mod keys;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as AsyncCommand;

pub use clipboard::{ClipboardService, CommandClipboard, MemoryClipboard};
pub use keys::KeyChord;

use crate::core::Clock;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// ydotool click code for a full press + release
    fn ydotool_code(self) -> &'static str {
        match self {
            MouseButton::Left => "0xC0",
            MouseButton::Right => "0xC1",
            MouseButton::Middle => "0xC2",
        }
    }
}

/// Low-level event synthesis
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// Move the pointer to absolute screen coordinates and click there
    async fn click(&self, x: i32, y: i32, button: MouseButton) -> anyhow::Result<()>;

    /// Press and release a key chord
    async fn key(&self, chord: &KeyChord) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct YdotoolDriver {
    program: String,
}

impl YdotoolDriver {
    pub fn new() -> Self {
        Self {
            program: "ydotool".to_string(),
        }
    }

    async fn run(&self, args: &[String]) -> anyhow::Result<()> {
        tracing::debug!("Executing {} {:?}", self.program, args);

        let output = AsyncCommand::new(&self.program).args(args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ydotool {} failed: {}", args[0], stderr.trim());
        }
        Ok(())
    }
}

impl Default for YdotoolDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputDriver for YdotoolDriver {
    async fn click(&self, x: i32, y: i32, button: MouseButton) -> anyhow::Result<()> {
        self.run(&[
            "mousemove".into(),
            "--absolute".into(),
            "-x".into(),
            x.to_string(),
            "-y".into(),
            y.to_string(),
        ])
        .await?;

        // let the pointer land before pressing
        tokio::time::sleep(Duration::from_millis(10)).await;

        self.run(&["click".into(), button.ydotool_code().into()]).await
    }

    async fn key(&self, chord: &KeyChord) -> anyhow::Result<()> {
        let args = chord.ydotool_args()?;
        self.run(&args).await
    }
}

/// Fixed delays inserted after input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pauses {
    /// After every click and key press
    pub settle: Duration,
    /// Between select-all and setting the clipboard
    pub select_all: Duration,
    /// After the paste shortcut
    pub paste: Duration,
}

impl Default for Pauses {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            select_all: Duration::from_millis(100),
            paste: Duration::from_millis(300),
        }
    }
}

pub struct InputController {
    driver: Arc<dyn InputDriver>,
    clipboard: Arc<dyn ClipboardService>,
    clock: Arc<dyn Clock>,
    pauses: Pauses,
}

impl InputController {
    pub fn new(
        driver: Arc<dyn InputDriver>,
        clipboard: Arc<dyn ClipboardService>,
        clock: Arc<dyn Clock>,
        pauses: Pauses,
    ) -> Self {
        Self {
            driver,
            clipboard,
            clock,
            pauses,
        }
    }

    /// Left-click at absolute screen coordinates, then settle
    pub async fn click(&self, x: i32, y: i32) -> Result<()> {
        self.driver
            .click(x, y, MouseButton::Left)
            .await
            .map_err(|e| Error::Input(format!("click at ({}, {}): {:#}", x, y, e)))?;
        self.clock.sleep(self.pauses.settle).await;
        Ok(())
    }

    /// Press a key or chord such as `"Return"` or `"ctrl+a"`, then settle
    pub async fn press_key(&self, name: &str) -> Result<()> {
        let chord = KeyChord::parse(name)?;
        self.send_chord(&chord).await?;
        self.clock.sleep(self.pauses.settle).await;
        Ok(())
    }

    /// Replace the focused field's contents with `content` via the clipboard
    pub async fn type_text(&self, content: &str) -> Result<()> {
        self.send_chord(&KeyChord::ctrl("a")).await?;
        self.clock.sleep(self.pauses.select_all).await;

        self.clipboard
            .set(content)
            .await
            .map_err(|e| Error::Clipboard(format!("{:#}", e)))?;

        self.send_chord(&KeyChord::ctrl("v")).await?;
        self.clock.sleep(self.pauses.paste).await;

        tracing::debug!("Pasted {} characters", content.chars().count());
        Ok(())
    }

    async fn send_chord(&self, chord: &KeyChord) -> Result<()> {
        self.driver
            .key(chord)
            .await
            .map_err(|e| Error::Input(format!("key {}: {:#}", chord, e)))
    }
}
