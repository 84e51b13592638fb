//! Abstract traits for the sequence collaborators.
//!
//! `core` drives these interfaces without knowing the concrete filesystem,
//! decoder or GPU backend, so tests and headless tools can swap them.
//!
//! Default implementations: [`crate::core::resolver::FsLister`],
//! [`crate::entities::Loader`], [`crate::core::presenter::CpuTexture`] and
//! [`crate::widgets::viewport::EguiTexture`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::error::SequenceError;
use super::frame::{Frame, FrameError};

/// Texture sampling filter for minification/magnification
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(FilterMode::Nearest),
            "linear" => Ok(FilterMode::Linear),
            other => Err(format!("unknown filter '{}', expected nearest|linear", other)),
        }
    }
}

/// Directory listing interface.
///
/// Implementations return paths in lexical order; callers sort again anyway.
pub trait FileLister: Send + Sync {
    /// Whether the folder exists at all (checked before listing).
    fn exists(&self, path: &Path) -> bool;

    /// List regular files in `folder`.
    ///
    /// `extension` keeps only files with that extension (case-insensitive).
    /// `max_frames` stops the scan after that many matches.
    fn list(
        &self,
        folder: &Path,
        extension: Option<&str>,
        max_frames: Option<usize>,
    ) -> Result<Vec<PathBuf>, SequenceError>;
}

/// Image decode interface. Must be callable from the background loader thread.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Frame, FrameError>;
}

/// Single-texture upload interface.
///
/// Each upload replaces the previous contents of the one texture.
pub trait TextureUploader {
    /// Replace the texture contents with `frame`.
    fn upload(&mut self, frame: &Frame);

    /// Apply filters to the held texture right away.
    fn set_filters(&mut self, min: FilterMode, mag: FilterMode);

    /// Release the texture contents (sequence unloaded).
    fn clear(&mut self) {}
}

/// Blanket impl: Arc<T> implements traits if T does
impl<T: FileLister + ?Sized> FileLister for Arc<T> {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn list(
        &self,
        folder: &Path,
        extension: Option<&str>,
        max_frames: Option<usize>,
    ) -> Result<Vec<PathBuf>, SequenceError> {
        (**self).list(folder, extension, max_frames)
    }
}

impl<T: ImageDecoder + ?Sized> ImageDecoder for Arc<T> {
    fn decode(&self, path: &Path) -> Result<Frame, FrameError> {
        (**self).decode(path)
    }
}
