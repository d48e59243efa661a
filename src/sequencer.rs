//! Ordered execution of an action script against one window
//!
//! Steps run strictly in order with no retries. The window is not looked up
//! again between steps: if it moves mid-run, later clicks go to the old
//! location. Failures are recorded in the [`RunReport`]; whether the rest of
//! the script still runs is decided by [`Error::aborts_sequence`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Clock, RelativePoint, WindowHandle};
use crate::error::{Error, Result};
use crate::input::InputController;
use crate::screenshot::{ScreenCapture, ScreenshotRecord};

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionStep {
    Click {
        point: RelativePoint,
        #[serde(default)]
        description: String,
    },
    TypeText {
        content: String,
        #[serde(default)]
        description: String,
    },
    PressKey {
        key: String,
    },
    Wait {
        seconds: f64,
    },
    Screenshot {
        name: String,
    },
}

impl ActionStep {
    /// Short log-safe label; typed content is never included
    pub fn label(&self) -> String {
        match self {
            ActionStep::Click { point, description } => {
                format!("click ({}, {}) {}", point.rel_x, point.rel_y, description)
                    .trim_end()
                    .to_string()
            }
            ActionStep::TypeText {
                content,
                description,
            } => format!("type {} chars into {}", content.chars().count(), description),
            ActionStep::PressKey { key } => format!("press {}", key),
            ActionStep::Wait { seconds } => format!("wait {}s", seconds),
            ActionStep::Screenshot { name } => format!("screenshot {}", name),
        }
    }
}

/// A failure recorded during a run
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    /// Zero-based step index; `None` for failures outside the script
    pub step: Option<usize>,
    pub label: String,
    pub error: String,
    pub fatal: bool,
}

/// What happened during a run
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub window: Option<WindowHandle>,
    pub screenshots: Vec<ScreenshotRecord>,
    pub failures: Vec<StepFailure>,
    pub steps_run: usize,
    pub aborted: bool,
}

impl RunReport {
    /// Fold a sequence report into this one
    pub fn absorb(&mut self, other: RunReport) {
        self.screenshots.extend(other.screenshots);
        self.failures.extend(other.failures);
        self.steps_run += other.steps_run;
        self.aborted |= other.aborted;
    }

    pub fn record_failure(&mut self, step: Option<usize>, label: String, error: &Error) {
        self.failures.push(StepFailure {
            step,
            label,
            error: error.to_string(),
            fatal: error.aborts_sequence(),
        });
    }
}

pub struct ActionSequencer {
    input: InputController,
    capture: ScreenCapture,
    clock: Arc<dyn Clock>,
}

impl ActionSequencer {
    pub fn new(input: InputController, capture: ScreenCapture, clock: Arc<dyn Clock>) -> Self {
        Self {
            input,
            capture,
            clock,
        }
    }

    /// Capture a screenshot cropped to the window
    pub async fn screenshot(&self, name: &str, window: &WindowHandle) -> Result<ScreenshotRecord> {
        self.capture.capture(name, Some(window.bounds)).await
    }

    pub async fn run(&self, steps: &[ActionStep], window: &WindowHandle) -> RunReport {
        let mut report = RunReport::default();

        for (index, step) in steps.iter().enumerate() {
            let label = step.label();
            tracing::info!("Step {}/{}: {}", index + 1, steps.len(), label);
            report.steps_run += 1;

            match self.execute(step, window).await {
                Ok(Some(record)) => report.screenshots.push(record),
                Ok(None) => {}
                Err(e) if e.aborts_sequence() => {
                    tracing::error!("Step {} ({}) failed, aborting: {}", index + 1, label, e);
                    report.record_failure(Some(index), label, &e);
                    report.aborted = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Step {} ({}) failed, continuing: {}", index + 1, label, e);
                    report.record_failure(Some(index), label, &e);
                }
            }
        }

        report
    }

    async fn execute(&self, step: &ActionStep, window: &WindowHandle) -> Result<Option<ScreenshotRecord>> {
        match step {
            ActionStep::Click { point, description } => {
                let bounds = window.bounds;
                if !bounds.contains(*point) {
                    return Err(Error::InvalidStep(format!(
                        "point ({}, {}) is outside the {}x{} window",
                        point.rel_x, point.rel_y, bounds.width, bounds.height
                    )));
                }

                let (x, y) = bounds.to_absolute(*point);
                tracing::info!(
                    "Clicking at ({}, {}) -> ({}, {}) {}",
                    point.rel_x,
                    point.rel_y,
                    x,
                    y,
                    description
                );
                self.input.click(x, y).await?;
            }
            ActionStep::TypeText { content, .. } => self.input.type_text(content).await?,
            ActionStep::PressKey { key } => self.input.press_key(key).await?,
            ActionStep::Wait { seconds } => {
                let duration = Duration::try_from_secs_f64(*seconds)
                    .map_err(|e| Error::InvalidStep(format!("wait of {}s: {}", seconds, e)))?;
                self.clock.sleep(duration).await;
            }
            ActionStep::Screenshot { name } => return self.screenshot(name, window).await.map(Some),
        }

        Ok(None)
    }
}
