//! Image decoder backed by the `image` crate
//!
//! Picks the pixel representation from the file extension:
//! - `exr`: RGBA half floats (`PixelBuffer::F16`)
//! - `hdr`: RGBA 32-bit floats (`PixelBuffer::F32`)
//! - everything else: RGBA8 (`PixelBuffer::U8`)

use std::path::Path;

use half::f16 as F16;
use image::{DynamicImage, ImageError};
use log::debug;

use super::frame::{Frame, FrameError, PixelBuffer, PixelFormat};
use super::traits::ImageDecoder;

/// Stateless image loader used as the default [`ImageDecoder`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Loader;

impl Loader {
    /// Load complete image file into Frame
    pub fn load(path: &Path) -> Result<Frame, FrameError> {
        let ext = path.extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "exr" => Self::load_exr(path),
            "hdr" => Self::load_hdr(path),
            _ => Self::load_generic(path),
        }
    }

    // ===== Float Loading =====

    fn load_exr(path: &Path) -> Result<Frame, FrameError> {
        debug!("Loading EXR with image crate: {}", path.display());

        let img = Self::open(path)?;
        let width = img.width() as usize;
        let height = img.height() as usize;

        // Rgba32F -> f16
        let rgba_img = img.to_rgba32f();
        let buffer: Vec<F16> = rgba_img.as_raw().iter().map(|&c| F16::from_f32(c)).collect();

        Frame::from_buffer(PixelBuffer::F16(buffer), PixelFormat::RgbaF16, width, height)
    }

    fn load_hdr(path: &Path) -> Result<Frame, FrameError> {
        debug!("Loading HDR: {}", path.display());

        let img = Self::open(path)?;
        let width = img.width() as usize;
        let height = img.height() as usize;

        let pixels = img.to_rgba32f().into_raw();
        Frame::from_buffer(PixelBuffer::F32(pixels), PixelFormat::RgbaF32, width, height)
    }

    // ===== Generic Image Loading (PNG, JPEG, TIFF, etc.) =====

    fn load_generic(path: &Path) -> Result<Frame, FrameError> {
        debug!("Loading generic image: {}", path.display());

        let img = Self::open(path)?;
        let width = img.width() as usize;
        let height = img.height() as usize;

        let pixels = img.to_rgba8().into_raw();
        Frame::from_buffer(PixelBuffer::U8(pixels), PixelFormat::Rgba8, width, height)
    }

    fn open(path: &Path) -> Result<DynamicImage, FrameError> {
        image::open(path).map_err(|e| match e {
            ImageError::IoError(io) => FrameError::Io(format!("{}: {}", path.display(), io)),
            ImageError::Unsupported(u) => FrameError::UnsupportedFormat(u.to_string()),
            other => FrameError::Image(format!("Image load error: {}", other)),
        })
    }
}

impl ImageDecoder for Loader {
    fn decode(&self, path: &Path) -> Result<Frame, FrameError> {
        Loader::load(path)
    }
}
