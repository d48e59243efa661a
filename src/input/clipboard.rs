//! System clipboard access
//!
//! Text goes to an external helper over stdin, never through a shell command
//! line, so tokens with quotes, dollar signs or newlines arrive unchanged.

use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as AsyncCommand;

#[async_trait]
pub trait ClipboardService: Send + Sync {
    async fn set(&self, text: &str) -> anyhow::Result<()>;
    async fn get(&self) -> anyhow::Result<String>;
}

/// Upper bound on a single helper invocation
pub const HELPER_TIMEOUT: Duration = Duration::from_secs(5);

/// Clipboard driven by helper programs such as `wl-copy` or `xclip`.
///
/// Both helpers fork a process that keeps serving the selection after the
/// parent exits, and that process inherits the parent's descriptors. Only the
/// exit status of the direct child is awaited, with stdout and stderr
/// discarded, otherwise the pipe never reaches EOF.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    copy: Vec<String>,
    paste: Vec<String>,
    timeout: Duration,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl CommandClipboard {
    /// `copy` reads the new contents from stdin, `paste` prints them
    pub fn new(copy: Vec<String>, paste: Vec<String>) -> anyhow::Result<Self> {
        if copy.is_empty() || paste.is_empty() {
            anyhow::bail!("clipboard commands must not be empty");
        }
        Ok(Self {
            copy,
            paste,
            timeout: HELPER_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// wl-clipboard on Wayland sessions, xclip otherwise
    pub fn detect() -> Self {
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self {
                copy: argv(&["wl-copy"]),
                paste: argv(&["wl-paste", "--no-newline"]),
                timeout: HELPER_TIMEOUT,
            }
        } else {
            Self {
                copy: argv(&["xclip", "-selection", "clipboard", "-in"]),
                paste: argv(&["xclip", "-selection", "clipboard", "-out"]),
                timeout: HELPER_TIMEOUT,
            }
        }
    }
}

#[async_trait]
impl ClipboardService for CommandClipboard {
    async fn set(&self, text: &str) -> anyhow::Result<()> {
        tracing::debug!("Setting clipboard via {:?} ({} bytes)", self.copy, text.len());

        let mut child = AsyncCommand::new(&self.copy[0])
            .args(&self.copy[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let write = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).await?;
                // dropping stdin closes the pipe so the helper sees EOF
            }
            child.wait().await
        };

        let status = match tokio::time::timeout(self.timeout, write).await {
            Ok(status) => status?,
            Err(_) => anyhow::bail!("{} did not exit within {:?}", self.copy[0], self.timeout),
        };
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.copy[0], status);
        }
        Ok(())
    }

    async fn get(&self) -> anyhow::Result<String> {
        let output = AsyncCommand::new(&self.paste[0])
            .args(&self.paste[1..])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(output) => output?,
            Err(_) => anyhow::bail!("{} did not exit within {:?}", self.paste[0], self.timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} exited with {}: {}", self.paste[0], output.status, stderr.trim());
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// In-process clipboard; `fail_next_set` makes the following `set` fail
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<String>,
    sets: Mutex<usize>,
    fail_next: Mutex<bool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_set(&self) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }

    /// Number of successful `set` calls
    pub fn set_count(&self) -> usize {
        *self.sets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ClipboardService for MemoryClipboard {
    async fn set(&self, text: &str) -> anyhow::Result<()> {
        if std::mem::take(&mut *self.fail_next.lock().unwrap_or_else(|e| e.into_inner())) {
            anyhow::bail!("clipboard unavailable");
        }
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
        *self.sets.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    async fn get(&self) -> anyhow::Result<String> {
        Ok(self.contents.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}
