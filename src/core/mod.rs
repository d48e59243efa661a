//! Shared data model: geometry, window handles and time

pub mod clock;
pub mod geometry;

pub use clock::{Clock, ManualClock, TokioClock};
pub use geometry::{Bounds, PlatformWindowId, RelativePoint, WindowHandle};
