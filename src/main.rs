//! onboard-runner - drives a desktop app's onboarding flow and records screenshots
//!
//! Exit status: 0 when the run completed (individual screenshot or activation
//! failures included), 1 when the window never appeared or setup failed, 2
//! when a click, key press or paste failed and the sequence was aborted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use onboard_runner::config::Config;
use onboard_runner::core::TokioClock;
use onboard_runner::input::{ClipboardService, CommandClipboard, YdotoolDriver};
use onboard_runner::runner::{Mode, Platform, Runner};
use onboard_runner::screenshot::XcapGrabber;
use onboard_runner::{Error, scenario};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "onboard-runner")]
#[command(about = "Drive a desktop app's onboarding flow and capture screenshots")]
struct Cli {
    /// Run the full action sequence instead of only taking the initial screenshot
    #[arg(long)]
    auto: bool,

    /// JSON configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Window title (or part of it) to look for
    #[arg(long)]
    title: Option<String>,

    /// Where screenshots and the run report are written
    #[arg(long)]
    screenshot_dir: Option<PathBuf>,

    /// JSON file with a custom step list, replacing the built-in onboarding flow
    #[arg(long)]
    steps: Option<PathBuf>,

    /// Seconds to wait for the window to appear
    #[arg(long)]
    timeout: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> onboard_runner::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(title) = &self.title {
            config.window_title = title.clone();
        }
        if let Some(dir) = &self.screenshot_dir {
            config.screenshot_dir = dir.clone();
        }
        if let Some(secs) = self.timeout {
            config.timings.window_timeout_ms = secs.saturating_mul(1000);
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    tracing::debug!("Configuration: {:?}", config);

    let steps = cli.steps.as_deref().map(scenario::load_steps).transpose()?;

    let clipboard: Arc<dyn ClipboardService> = match &config.clipboard {
        Some(cmds) => Arc::new(CommandClipboard::new(cmds.copy.clone(), cmds.paste.clone())?),
        None => Arc::new(CommandClipboard::detect()),
    };

    let platform = Platform {
        backend: onboard_runner::backend::create_backend().await?,
        grabber: Arc::new(XcapGrabber),
        driver: Arc::new(YdotoolDriver::new()),
        clipboard,
        clock: Arc::new(TokioClock::new()),
    };

    let mode = if cli.auto { Mode::Auto } else { Mode::ScreenshotOnly };
    let runner = Runner::new(config, platform);

    let report = match runner.run(mode, steps).await {
        Ok(report) => report,
        Err(e @ Error::NotFound { .. }) => {
            tracing::error!("{}", e);
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = runner.write_report(&report).await {
        tracing::warn!("{}", e);
    }

    for failure in &report.failures {
        tracing::warn!("Failed: {} ({})", failure.label, failure.error);
    }
    tracing::info!(
        "{} steps run, {} screenshots, {} failures",
        report.steps_run,
        report.screenshots.len(),
        report.failures.len()
    );

    Ok(if report.aborted {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}
