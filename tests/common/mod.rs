//! Fakes standing in for the desktop so runs need no display server

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use onboard_runner::backend::{WindowBackend, WindowInfo};
use onboard_runner::core::{Bounds, Clock, ManualClock, PlatformWindowId};
use onboard_runner::input::{InputController, InputDriver, KeyChord, MemoryClipboard, MouseButton, Pauses};
use onboard_runner::runner::Platform;
use onboard_runner::screenshot::{ScreenCapture, ScreenGrabber};
use onboard_runner::sequencer::ActionSequencer;

/// Backend whose window shows up once virtual time reaches `appears_at`
pub struct FakeBackend {
    clock: Arc<ManualClock>,
    appears_at: Option<Duration>,
    window: WindowInfo,
    pub focus_fails: bool,
    pub lookups: Mutex<Vec<Duration>>,
}

impl FakeBackend {
    pub fn new(clock: Arc<ManualClock>, title: &str, bounds: Bounds, appears_at: Option<Duration>) -> Self {
        Self {
            clock,
            appears_at,
            window: WindowInfo {
                platform_id: PlatformWindowId::X11(0x0420_0001),
                title: title.to_string(),
                bounds,
                visible: true,
            },
            focus_fails: false,
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookup_times(&self) -> Vec<Duration> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl WindowBackend for FakeBackend {
    async fn list_windows(&self) -> anyhow::Result<Vec<WindowInfo>> {
        let now = self.clock.now();
        self.lookups.lock().unwrap().push(now);

        let mut windows = vec![WindowInfo {
            platform_id: PlatformWindowId::X11(0x0100_0002),
            title: "Terminal".to_string(),
            bounds: Bounds::new(0, 0, 800, 600),
            visible: true,
        }];
        if self.appears_at.is_some_and(|at| now >= at) {
            windows.push(self.window.clone());
        }
        Ok(windows)
    }

    async fn focus_window(&self, _id: &PlatformWindowId) -> anyhow::Result<()> {
        if self.focus_fails {
            anyhow::bail!("window manager refused activation");
        }
        Ok(())
    }

    async fn active_window(&self) -> anyhow::Result<Option<PlatformWindowId>> {
        Ok(None)
    }
}

pub struct SolidGrabber;

impl ScreenGrabber for SolidGrabber {
    fn grab(&self, region: Option<Bounds>) -> anyhow::Result<RgbaImage> {
        let (w, h) = region.map_or((320, 200), |r| (r.width.min(64), r.height.min(64)));
        Ok(RgbaImage::from_pixel(w, h, image::Rgba([30, 60, 90, 255])))
    }
}

/// Grabber whose `fail_on`-th grab (zero-based) fails as if the screen were locked
pub struct FlakyGrabber {
    fail_on: usize,
    grabs: AtomicUsize,
}

impl FlakyGrabber {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            grabs: AtomicUsize::new(0),
        }
    }
}

impl ScreenGrabber for FlakyGrabber {
    fn grab(&self, region: Option<Bounds>) -> anyhow::Result<RgbaImage> {
        if self.grabs.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            anyhow::bail!("screen capture permission denied");
        }
        SolidGrabber.grab(region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Click(i32, i32),
    Key(String),
}

#[derive(Default)]
pub struct RecordingDriver {
    events: Mutex<Vec<InputEvent>>,
    pub fail_clicks: bool,
}

impl RecordingDriver {
    /// Driver whose clicks fail as if ydotool were not installed
    pub fn failing() -> Self {
        Self {
            fail_clicks: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl InputDriver for RecordingDriver {
    async fn click(&self, x: i32, y: i32, _button: MouseButton) -> anyhow::Result<()> {
        if self.fail_clicks {
            anyhow::bail!("ydotool: no such file or directory");
        }
        self.events.lock().unwrap().push(InputEvent::Click(x, y));
        Ok(())
    }

    async fn key(&self, chord: &KeyChord) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(InputEvent::Key(chord.to_string()));
        Ok(())
    }
}

/// Everything a test needs to inspect after a run
pub struct Desk {
    pub clock: Arc<ManualClock>,
    pub backend: Arc<FakeBackend>,
    pub driver: Arc<RecordingDriver>,
    pub clipboard: Arc<MemoryClipboard>,
}

impl Desk {
    pub fn with(backend: FakeBackend, clock: Arc<ManualClock>, driver: RecordingDriver) -> Self {
        Self {
            clock,
            backend: Arc::new(backend),
            driver: Arc::new(driver),
            clipboard: Arc::new(MemoryClipboard::new()),
        }
    }

    /// A Moltz window at (100, 50), 1822x1256, visible from the start
    pub fn moltz() -> Self {
        let clock = Arc::new(ManualClock::new());
        let backend = FakeBackend::new(
            clock.clone(),
            "Moltz",
            Bounds::new(100, 50, 1822, 1256),
            Some(Duration::ZERO),
        );
        Self::with(backend, clock, RecordingDriver::default())
    }

    /// A sequencer writing into `dir` through `grabber`
    pub fn sequencer(&self, dir: &std::path::Path, grabber: Arc<dyn ScreenGrabber>) -> ActionSequencer {
        let input = InputController::new(
            self.driver.clone(),
            self.clipboard.clone(),
            self.clock.clone(),
            Pauses::default(),
        );
        ActionSequencer::new(input, ScreenCapture::new(dir, grabber), self.clock.clone())
    }

    pub fn platform(&self) -> Platform {
        Platform {
            backend: self.backend.clone(),
            grabber: Arc::new(SolidGrabber),
            driver: self.driver.clone(),
            clipboard: self.clipboard.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// PNG file names present in `dir`, sorted
pub fn png_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(".png"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
