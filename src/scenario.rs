//! The gateway-setup onboarding flow, expressed as data
//!
//! Field and button positions are fractions of the window size, measured on
//! the 1822x1256 onboarding window. They are resolved against the located
//! window's bounds before the run starts, so a bad layout fails up front
//! instead of halfway through the form.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::{Bounds, RelativePoint};
use crate::error::{Error, Result};
use crate::sequencer::ActionStep;

/// Horizontal and vertical position as fractions of the window size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn resolve(&self, bounds: &Bounds) -> Result<RelativePoint> {
        RelativePoint::fraction(bounds, self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingLayout {
    /// Gateway URL field; the URL is only entered when this is set
    pub url_field: Option<Anchor>,
    pub token_field: Anchor,
    pub test_button: Anchor,
    /// Seconds to wait for the connection test to report
    pub connection_wait: f64,
    /// Seconds to wait before the closing screenshot
    pub final_wait: f64,
}

impl Default for OnboardingLayout {
    fn default() -> Self {
        Self {
            url_field: None,
            token_field: Anchor::new(0.5, 0.33),
            test_button: Anchor::new(0.5, 0.41),
            connection_wait: 3.0,
            final_wait: 2.0,
        }
    }
}

fn screenshot(name: &str) -> ActionStep {
    ActionStep::Screenshot {
        name: name.to_string(),
    }
}

fn wait(seconds: f64) -> ActionStep {
    ActionStep::Wait { seconds }
}

/// Build the gateway-setup steps for a window of the given size
pub fn onboarding_steps(config: &Config, bounds: &Bounds) -> Result<Vec<ActionStep>> {
    let layout = &config.layout;
    let mut steps = Vec::new();

    if let Some(url_field) = layout.url_field {
        steps.extend([
            ActionStep::Click {
                point: url_field.resolve(bounds)?,
                description: "gateway URL field".to_string(),
            },
            ActionStep::TypeText {
                content: config.gateway_url.clone(),
                description: "gateway URL field".to_string(),
            },
        ]);
    }

    steps.extend([
        ActionStep::Click {
            point: layout.token_field.resolve(bounds)?,
            description: "token field".to_string(),
        },
        wait(0.3),
        screenshot("02_token_field_clicked"),
        ActionStep::TypeText {
            content: config.gateway_token.clone(),
            description: "token field".to_string(),
        },
        wait(0.3),
        screenshot("03_token_entered"),
        ActionStep::Click {
            point: layout.test_button.resolve(bounds)?,
            description: "Test Connection button".to_string(),
        },
        wait(layout.connection_wait),
        screenshot("04_after_test"),
        wait(layout.final_wait),
        screenshot("05_final_state"),
    ]);

    Ok(steps)
}

/// Read a custom script: a JSON array of steps
pub fn load_steps(path: &Path) -> Result<Vec<ActionStep>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("parsing {}: {}", path.display(), e)))
}
