//! Small playback types shared between the controller and the UI.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// What the audio backend can fail with.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no audio output device: {0}")]
    Device(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("seek failed: {0}")]
    Seek(String),
    #[error("no track loaded")]
    NothingLoaded,
}

/// Controller-level failures, surfaced to the user as a status message.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("track {0} is out of range")]
    IndexOutOfRange(usize),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A position snapshot produced by the poller for display.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Progress {
    /// True playback position: seek offset + backend elapsed.
    pub position: Duration,
    /// Track length; zero when the metadata probe failed.
    pub length: Duration,
    /// Fractional position in [0, 1]; zero when the length is unknown.
    pub fraction: f32,
}
