//! Screenshot checkpoints using xcap
//!
//! Screenshots are evidence for a human reviewer, not assertions. A capture
//! writes `{dir}/{name}.png`, replacing any earlier file with the same name.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use image::{ImageEncoder, RgbaImage};
use serde::Serialize;

use crate::core::Bounds;
use crate::error::{Error, Result};

/// One screenshot written during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenshotRecord {
    pub name: String,
    pub path: PathBuf,
    pub captured_at: SystemTime,
}

/// Source of raw screen pixels
pub trait ScreenGrabber: Send + Sync {
    /// Grab the whole primary screen, or only `region` when given
    fn grab(&self, region: Option<Bounds>) -> anyhow::Result<RgbaImage>;
}

/// Grabber backed by xcap monitor capture
#[derive(Debug, Default)]
pub struct XcapGrabber;

/// Intersect `region` with a monitor placed at `monitor` and return the crop
/// rectangle in monitor-local pixels, or `None` when they do not overlap.
fn crop_rect(monitor: Bounds, region: Bounds) -> Option<(u32, u32, u32, u32)> {
    let left = region.left.max(monitor.left) as i64;
    let top = region.top.max(monitor.top) as i64;
    let right = (region.left as i64 + region.width as i64).min(monitor.left as i64 + monitor.width as i64);
    let bottom = (region.top as i64 + region.height as i64).min(monitor.top as i64 + monitor.height as i64);

    if right <= left || bottom <= top {
        return None;
    }

    Some((
        (left - monitor.left as i64) as u32,
        (top - monitor.top as i64) as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Index of the monitor sharing the most pixels with `region`
fn best_monitor(monitors: &[Bounds], region: Bounds) -> Option<usize> {
    monitors
        .iter()
        .enumerate()
        .filter_map(|(i, m)| crop_rect(*m, region).map(|(_, _, w, h)| (i, w as u64 * h as u64)))
        .max_by_key(|&(_, area)| area)
        .map(|(i, _)| i)
}

fn monitor_bounds(monitor: &xcap::Monitor) -> anyhow::Result<Bounds> {
    Ok(Bounds::new(
        monitor.x()?,
        monitor.y()?,
        monitor.width()?,
        monitor.height()?,
    ))
}

impl ScreenGrabber for XcapGrabber {
    fn grab(&self, region: Option<Bounds>) -> anyhow::Result<RgbaImage> {
        let Some(region) = region else {
            let monitors = xcap::Monitor::all()?;
            let monitor = monitors
                .iter()
                .find(|m| m.is_primary().unwrap_or(false))
                .or(monitors.first())
                .ok_or_else(|| anyhow::anyhow!("No monitors found"))?;
            return Ok(monitor.capture_image()?);
        };

        let monitors = xcap::Monitor::all()?;
        let placements = monitors
            .iter()
            .map(monitor_bounds)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let index = best_monitor(&placements, region)
            .ok_or_else(|| anyhow::anyhow!("Region {:?} is off screen", region))?;
        let monitor = &monitors[index];
        let (x, y, width, height) = crop_rect(placements[index], region)
            .ok_or_else(|| anyhow::anyhow!("Region {:?} is off screen", region))?;

        let full = monitor.capture_image()?;
        Ok(image::imageops::crop_imm(&full, x, y, width, height).to_image())
    }
}

fn encode_png(image: &RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

pub struct ScreenCapture {
    dir: PathBuf,
    grabber: Arc<dyn ScreenGrabber>,
}

impl ScreenCapture {
    pub fn new(dir: impl Into<PathBuf>, grabber: Arc<dyn ScreenGrabber>) -> Self {
        Self {
            dir: dir.into(),
            grabber,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture the screen (or `region`) and save it as `{name}.png`
    pub async fn capture(&self, name: &str, region: Option<Bounds>) -> Result<ScreenshotRecord> {
        let path = self.dir.join(format!("{}.png", name));
        let grabber = self.grabber.clone();

        // xcap is not async, so grabbing and encoding run in a blocking task
        let png = tokio::task::spawn_blocking(move || encode_png(&grabber.grab(region)?))
            .await
            .map_err(|e| Error::Capture(format!("capture task failed: {}", e)))?
            .map_err(|e| Error::Capture(format!("{:#}", e)))?;

        tokio::fs::write(&path, &png)
            .await
            .map_err(|e| Error::Capture(format!("writing {}: {}", path.display(), e)))?;

        tracing::info!("Screenshot: {}", path.display());

        Ok(ScreenshotRecord {
            name: name.to_string(),
            path,
            captured_at: SystemTime::now(),
        })
    }
}
