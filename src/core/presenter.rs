//! Texture presenter - keeps one texture in sync with the displayed frame
//!
//! Uploads are skipped when the requested frame index is the one already on
//! the texture, so asking for the same frame every tick is free.

use log::trace;

use crate::entities::{FilterMode, Frame, TextureUploader};

/// Owns the single texture of a sequence and tracks what is on it
#[derive(Debug)]
pub struct TexturePresenter<T> {
    texture: T,
    last_presented: Option<usize>,
    min_filter: FilterMode,
    mag_filter: FilterMode,
}

impl<T: TextureUploader> TexturePresenter<T> {
    pub fn new(texture: T) -> Self {
        Self {
            texture,
            last_presented: None,
            min_filter: FilterMode::default(),
            mag_filter: FilterMode::default(),
        }
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    /// Index of the frame currently on the texture
    pub fn last_presented(&self) -> Option<usize> {
        self.last_presented
    }

    pub fn is_current(&self, index: usize) -> bool {
        self.last_presented == Some(index)
    }

    /// Upload `frame` unless `index` is already on the texture.
    ///
    /// Returns `true` when an upload happened.
    pub fn present(&mut self, index: usize, frame: &Frame) -> bool {
        if self.is_current(index) {
            return false;
        }

        trace!("Uploading frame {} ({}x{})", index, frame.width(), frame.height());
        self.texture.upload(frame);
        self.last_presented = Some(index);
        true
    }

    /// Forget the presented index so the next `present` uploads
    pub fn reset(&mut self) {
        self.last_presented = None;
    }

    /// Release texture contents (unload)
    pub fn clear(&mut self) {
        self.reset();
        self.texture.clear();
    }

    pub fn filters(&self) -> (FilterMode, FilterMode) {
        (self.min_filter, self.mag_filter)
    }

    /// Store the filter pair and apply it to the held texture immediately
    pub fn set_min_mag_filter(&mut self, min: FilterMode, mag: FilterMode) {
        self.min_filter = min;
        self.mag_filter = mag;
        self.texture.set_filters(min, mag);
    }
}

/// CPU-side texture: keeps the last upload as RGBA8 bytes.
///
/// Used for headless playback and for observing uploads in tests.
#[derive(Debug, Clone, Default)]
pub struct CpuTexture {
    rgba: Vec<u8>,
    width: usize,
    height: usize,
    filters: (FilterMode, FilterMode),
    uploads: usize,
}

impl CpuTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_allocated(&self) -> bool {
        !self.rgba.is_empty()
    }

    /// Total uploads since creation
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    pub fn filters(&self) -> (FilterMode, FilterMode) {
        self.filters
    }
}

impl TextureUploader for CpuTexture {
    fn upload(&mut self, frame: &Frame) {
        self.rgba.clear();
        self.rgba.extend_from_slice(&frame.to_rgba8());
        self.width = frame.width();
        self.height = frame.height();
        self.uploads += 1;
    }

    fn set_filters(&mut self, min: FilterMode, mag: FilterMode) {
        self.filters = (min, mag);
    }

    fn clear(&mut self) {
        self.rgba = Vec::new();
        self.width = 0;
        self.height = 0;
    }
}
