//! Error taxonomy for a run
//!
//! Only [`Error::NotFound`] is allowed to end the process before the action
//! sequence starts. Everything else is caught where it happens, recorded in
//! the run report, and classified by [`Error::aborts_sequence`].

use std::time::Duration;

use thiserror::Error;

/// Result alias used across the engine
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The target window never appeared within the discovery timeout
    #[error("no window matching {hint:?} appeared after {elapsed:?}")]
    NotFound { hint: String, elapsed: Duration },

    /// Placing text on the system clipboard failed
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// The window could not be brought to the foreground
    #[error("activation warning: {0}")]
    Activation(String),

    /// A screenshot could not be taken or written
    #[error("capture error: {0}")]
    Capture(String),

    /// Pointer or key synthesis failed
    #[error("input error: {0}")]
    Input(String),

    /// A step carries data that cannot be executed against the window
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this failure stops the remaining steps of a sequence.
    ///
    /// Screenshots and window activation are diagnostic aids, so their
    /// failures are reported and skipped. A failed click, key press or paste
    /// leaves the form in an unknown state, and every later step would act on
    /// the wrong thing.
    pub fn aborts_sequence(&self) -> bool {
        !matches!(self, Error::Capture(_) | Error::Activation(_))
    }
}
