//! Run configuration
//!
//! Built once at startup from (lowest to highest precedence) built-in
//! defaults, an optional JSON file, `ONBOARD_*` environment variables and
//! command-line flags. The engine receives it by value and never reads
//! ambient state afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::input::Pauses;
use crate::scenario::OnboardingLayout;

/// Delays and timeouts, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub window_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub activation_pause_ms: u64,
    pub settle_ms: u64,
    pub select_all_ms: u64,
    pub paste_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            window_timeout_ms: 30_000,
            poll_interval_ms: 500,
            activation_pause_ms: 1_000,
            settle_ms: 500,
            select_all_ms: 100,
            paste_ms: 300,
        }
    }
}

impl Timings {
    pub fn window_timeout(&self) -> Duration {
        Duration::from_millis(self.window_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn activation_pause(&self) -> Duration {
        Duration::from_millis(self.activation_pause_ms)
    }

    /// A zero poll interval would spin on the window list
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("timings.poll_interval_ms must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn pauses(&self) -> Pauses {
        Pauses {
            settle: Duration::from_millis(self.settle_ms),
            select_all: Duration::from_millis(self.select_all_ms),
            paste: Duration::from_millis(self.paste_ms),
        }
    }
}

/// Clipboard helper commands, each as argv
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClipboardCommands {
    pub copy: Vec<String>,
    pub paste: Vec<String>,
}

#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title (or part of it) of the window under test
    pub window_title: String,
    pub gateway_url: String,
    pub gateway_token: String,
    pub screenshot_dir: PathBuf,
    pub timings: Timings,
    pub layout: OnboardingLayout,
    /// Overrides clipboard helper detection
    pub clipboard: Option<ClipboardCommands>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: "Moltz".to_string(),
            gateway_url: String::new(),
            gateway_token: String::new(),
            screenshot_dir: PathBuf::from("test_screenshots"),
            timings: Timings::default(),
            layout: OnboardingLayout::default(),
            clipboard: None,
        }
    }
}

// The token is a credential; keep it out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.gateway_token.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };

        f.debug_struct("Config")
            .field("window_title", &self.window_title)
            .field("gateway_url", &self.gateway_url)
            .field("gateway_token", &token)
            .field("screenshot_dir", &self.screenshot_dir)
            .field("timings", &self.timings)
            .field("layout", &self.layout)
            .field("clipboard", &self.clipboard)
            .finish()
    }
}

impl Config {
    /// Parse a JSON config document; missing fields keep their defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.timings.validate()?;
        Ok(config)
    }

    /// Load defaults, then the file at `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `ONBOARD_*` overrides using `lookup` as the environment
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ONBOARD_WINDOW_TITLE") {
            self.window_title = v;
        }
        if let Some(v) = lookup("ONBOARD_GATEWAY_URL") {
            self.gateway_url = v;
        }
        if let Some(v) = lookup("ONBOARD_GATEWAY_TOKEN") {
            self.gateway_token = v;
        }
        if let Some(v) = lookup("ONBOARD_SCREENSHOT_DIR") {
            self.screenshot_dir = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(
            r#"{
                "gateway_url": "ws://gateway.local:18789",
                "timings": { "window_timeout_ms": 5000 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.gateway_url, "ws://gateway.local:18789");
        assert_eq!(config.window_title, "Moltz");
        assert_eq!(config.timings.window_timeout(), Duration::from_secs(5));
        assert_eq!(config.timings.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.layout, OnboardingLayout::default());
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(Config::from_json("{"), Err(Error::Config(_))));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let err = Config::from_json(r#"{ "timings": { "poll_interval_ms": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("poll_interval_ms")));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("ONBOARD_GATEWAY_TOKEN", "abc123"),
            ("ONBOARD_SCREENSHOT_DIR", "/tmp/shots"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.gateway_token, "abc123");
        assert_eq!(config.screenshot_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(config.window_title, "Moltz");
    }

    #[test]
    fn debug_redacts_token() {
        let config = Config {
            gateway_token: "977f8e028fcc".to_string(),
            ..Config::default()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("977f8e028fcc"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn clipboard_override_parses() {
        let config = Config::from_json(
            r#"{ "clipboard": { "copy": ["xsel", "-bi"], "paste": ["xsel", "-bo"] } }"#,
        )
        .unwrap();

        assert_eq!(config.clipboard.unwrap().copy, vec!["xsel", "-bi"]);
    }
}
