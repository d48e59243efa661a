//! Top-level run: find the window, record its initial state and, in auto
//! mode, drive the onboarding flow

use std::sync::Arc;

use crate::backend::WindowBackend;
use crate::config::Config;
use crate::core::{Bounds, Clock};
use crate::error::{Error, Result};
use crate::input::{ClipboardService, InputController, InputDriver};
use crate::locator::WindowLocator;
use crate::scenario;
use crate::screenshot::{ScreenCapture, ScreenGrabber};
use crate::sequencer::{ActionSequencer, ActionStep, RunReport};

pub const REPORT_FILE: &str = "run-report.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Locate the window and take the initial screenshot only
    ScreenshotOnly,
    /// Run the full action sequence
    Auto,
}

/// Platform collaborators; tests substitute fakes for all of them
pub struct Platform {
    pub backend: Arc<dyn WindowBackend>,
    pub grabber: Arc<dyn ScreenGrabber>,
    pub driver: Arc<dyn InputDriver>,
    pub clipboard: Arc<dyn ClipboardService>,
    pub clock: Arc<dyn Clock>,
}

pub struct Runner {
    config: Config,
    locator: WindowLocator,
    sequencer: ActionSequencer,
    clock: Arc<dyn Clock>,
}

impl Runner {
    pub fn new(config: Config, platform: Platform) -> Self {
        let timings = &config.timings;
        let locator = WindowLocator::new(
            platform.backend,
            platform.clock.clone(),
            timings.poll_interval(),
        );
        let input = InputController::new(
            platform.driver,
            platform.clipboard,
            platform.clock.clone(),
            timings.pauses(),
        );
        let capture = ScreenCapture::new(config.screenshot_dir.clone(), platform.grabber);
        let sequencer = ActionSequencer::new(input, capture, platform.clock.clone());

        Self {
            config,
            locator,
            sequencer,
            clock: platform.clock,
        }
    }

    /// Run once. Only a missing window or an unusable screenshot directory is
    /// returned as an error; step failures are recorded in the report.
    ///
    /// `steps` replaces the built-in onboarding flow when given.
    pub async fn run(&self, mode: Mode, steps: Option<Vec<ActionStep>>) -> Result<RunReport> {
        let dir = &self.config.screenshot_dir;
        tokio::fs::create_dir_all(dir).await?;

        let window = self
            .locator
            .wait_for_window(&self.config.window_title, self.config.timings.window_timeout())
            .await?;

        let mut report = RunReport {
            window: Some(window.clone()),
            ..RunReport::default()
        };

        if let Err(e) = self.locator.activate(&window).await {
            tracing::warn!("{}", e);
            report.record_failure(None, "activate window".to_string(), &e);
        }
        self.clock.sleep(self.config.timings.activation_pause()).await;

        match self.sequencer.screenshot("01_initial", &window).await {
            Ok(record) => report.screenshots.push(record),
            Err(e) => {
                tracing::warn!("{}", e);
                report.record_failure(None, "screenshot 01_initial".to_string(), &e);
            }
        }

        let b = window.bounds;
        tracing::info!("Window position: ({}, {})", b.left, b.top);
        tracing::info!("Window size: {}x{}", b.width, b.height);

        match mode {
            Mode::ScreenshotOnly => {
                tracing::info!("Manual mode: taking screenshots only (pass --auto to run the flow)");
            }
            Mode::Auto => {
                let steps = match steps.map_or_else(|| self.onboarding_steps(&window.bounds), Ok) {
                    Ok(steps) => steps,
                    Err(e) => {
                        tracing::error!("Cannot build onboarding steps: {}", e);
                        report.record_failure(None, "build onboarding steps".to_string(), &e);
                        report.aborted = true;
                        return Ok(report);
                    }
                };
                tracing::info!("Auto mode: running {} steps", steps.len());
                report.absorb(self.sequencer.run(&steps, &window).await);
            }
        }

        tracing::info!("Run finished, screenshots in {}", dir.display());
        Ok(report)
    }

    fn onboarding_steps(&self, bounds: &Bounds) -> Result<Vec<ActionStep>> {
        if self.config.gateway_token.is_empty() {
            tracing::warn!("Gateway token is empty; the token field will be cleared");
        }
        scenario::onboarding_steps(&self.config, bounds)
    }

    /// Write the report as JSON next to the screenshots
    pub async fn write_report(&self, report: &RunReport) -> Result<()> {
        let path = self.config.screenshot_dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(report).map_err(anyhow::Error::from)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| Error::Capture(format!("writing {}: {}", path.display(), e)))?;
        tracing::info!("Report: {}", path.display());
        Ok(())
    }
}
