//! Error type for sequence loading and playback.
//!
//! Every error is recoverable: the sequence logs it, returns it, and stays
//! in a consistent state. [`SequenceError::kind`] groups variants into the
//! four categories callers usually branch on.

use std::path::PathBuf;

use thiserror::Error;

use super::frame::FrameError;

/// Broad category of a [`SequenceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad load source or loading configuration
    Config,
    /// Frame index rejected
    Index,
    /// A single frame could not be decoded
    Decode,
    /// Operation not valid in the current load state
    Misuse,
    /// Thread spawn or loader thread failure
    System,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("No image files in range: end ({end}) is before start ({start})")]
    EmptyRange { start: i64, end: i64 },

    #[error("Could not find folder {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("No image files found in {}", .0.display())]
    NoImagesFound(PathBuf),

    #[error("Invalid filename pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("{setting} must be set before loading")]
    ConfigLocked { setting: &'static str },

    #[error("Invalid frame rate {0}, expected a positive number")]
    InvalidFrameRate(f64),

    #[error("Asking for negative frame index {0}")]
    NegativeIndex(i64),

    #[error("Frame {index} is out of bounds (sequence has {total} frames)")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("Image failed to load: {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    #[error("Sequence is not loaded")]
    NotLoaded,

    #[error("Failed to start loader thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Loader thread exited without reporting a result")]
    LoaderDisconnected,
}

impl SequenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SequenceError::EmptyRange { .. }
            | SequenceError::FolderNotFound(_)
            | SequenceError::NoImagesFound(_)
            | SequenceError::Pattern { .. }
            | SequenceError::ConfigLocked { .. }
            | SequenceError::InvalidFrameRate(_) => ErrorKind::Config,
            SequenceError::NegativeIndex(_) | SequenceError::IndexOutOfRange { .. } => ErrorKind::Index,
            SequenceError::Decode { .. } => ErrorKind::Decode,
            SequenceError::NotLoaded => ErrorKind::Misuse,
            SequenceError::Spawn(_) | SequenceError::LoaderDisconnected => ErrorKind::System,
        }
    }
}
