//! onboard-runner - scripted UI driver for desktop onboarding flows
//!
//! Finds a native application's window, clicks and types at positions
//! relative to that window, and saves screenshots along the way for a human
//! to review afterwards.
//!
//! ## Pieces
//!
//! - [`locator`]: window discovery with polling and timeout
//! - [`screenshot`]: PNG checkpoints, optionally cropped to the window
//! - [`input`]: pointer clicks, key chords and clipboard-relay text entry
//! - [`sequencer`]: ordered execution of an [`ActionStep`] script
//! - [`runner`]: the whole run as the CLI performs it
//!
//! ## Supported Environments
//!
//! - X11 (native)
//! - XWayland windows on Wayland sessions (input through ydotool/uinput,
//!   focus through KWin on KDE)

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod locator;
pub mod runner;
pub mod scenario;
pub mod screenshot;
pub mod sequencer;

pub use config::Config;
pub use error::{Error, Result};
pub use sequencer::{ActionStep, RunReport};
