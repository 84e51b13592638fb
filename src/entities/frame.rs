//! Decoded frames with multi-format pixel buffers (U8, F16, F32)
//!
//! **Why**: Different formats require different pixel representations:
//! - JPG/PNG/TIFF/TGA: 8-bit RGBA (u8)
//! - EXR: 16-bit float (half::f16)
//! - HDR: 32-bit float (f32)
//!
//! **Used by**: Frame store (one optional `Frame` per sequence slot),
//! texture presenter (pixel data for upload)
//!
//! # Pixel Formats
//!
//! - `PixelBuffer::U8`: LDR images, 4 bytes/pixel
//! - `PixelBuffer::F16`: EXR, 8 bytes/pixel
//! - `PixelBuffer::F32`: Radiance HDR, 16 bytes/pixel
//!
//! Uploaders that only understand RGBA8 call [`Frame::to_rgba8`], which
//! borrows LDR buffers and converts float buffers by clamping to `0..=1`.

use std::borrow::Cow;

use half::f16 as F16;

/// Pixel buffer format - stores different precision levels
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    U8(Vec<u8>),              // LDR formats (PNG, JPEG, TGA) - 8-bit per channel
    F16(Vec<F16>),            // HDR half-precision (EXR) - 16-bit float per channel
    F32(Vec<f32>),            // HDR full-precision (Radiance HDR) - 32-bit float per channel
}

impl PixelBuffer {
    /// Number of channel values (not pixels) in the buffer
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U8(v) => v.len(),
            PixelBuffer::F16(v) => v.len(),
            PixelBuffer::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pixel format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,     // 8-bit RGBA (LDR)
    RgbaF16,   // 16-bit half-float RGBA (HDR)
    RgbaF32,   // 32-bit float RGBA (HDR)
}

impl PixelFormat {
    /// Bytes used by one RGBA pixel in this format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::RgbaF16 => 8,
            PixelFormat::RgbaF32 => 16,
        }
    }
}

/// One decoded image, RGBA, row-major, top row first
#[derive(Debug, Clone)]
pub struct Frame {
    buffer: PixelBuffer,
    pixel_format: PixelFormat,
    width: usize,
    height: usize,
}

/// Frame decoding errors
#[derive(Debug)]
pub enum FrameError {
    Io(String),
    Image(String),
    UnsupportedFormat(String),
    BufferSize { expected: usize, actual: usize },
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Io(e) => write!(f, "I/O error: {}", e),
            FrameError::Image(e) => write!(f, "Image error: {}", e),
            FrameError::UnsupportedFormat(e) => write!(f, "Unsupported format: {}", e),
            FrameError::BufferSize { expected, actual } => write!(
                f,
                "Pixel buffer holds {} values, expected {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for FrameError {}

impl Frame {
    /// Wrap an already decoded buffer.
    ///
    /// The buffer must hold exactly `width * height * 4` channel values.
    pub fn from_buffer(
        buffer: PixelBuffer,
        pixel_format: PixelFormat,
        width: usize,
        height: usize,
    ) -> Result<Self, FrameError> {
        let expected = width * height * 4;
        if buffer.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: buffer.len(),
            });
        }

        Ok(Self {
            buffer,
            pixel_format,
            width,
            height,
        })
    }

    /// Solid RGBA8 frame, handy for placeholders and tests
    pub fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut buffer = vec![0u8; width * height * 4];
        for px in buffer.chunks_mut(4) {
            px.copy_from_slice(&rgba);
        }

        Self {
            buffer: PixelBuffer::U8(buffer),
            pixel_format: PixelFormat::Rgba8,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Approximate memory held by the pixel data
    pub fn byte_size(&self) -> usize {
        self.width * self.height * self.pixel_format.bytes_per_pixel()
    }

    /// RGBA8 view of the pixels.
    ///
    /// Borrows when the frame is already 8-bit, otherwise converts
    /// (float channels are clamped to `0..=1`, no tone mapping).
    pub fn to_rgba8(&self) -> Cow<'_, [u8]> {
        match &self.buffer {
            PixelBuffer::U8(v) => Cow::Borrowed(v.as_slice()),
            PixelBuffer::F16(v) => Cow::Owned(v.iter().map(|c| float_to_u8(c.to_f32())).collect()),
            PixelBuffer::F32(v) => Cow::Owned(v.iter().map(|&c| float_to_u8(c)).collect()),
        }
    }
}

fn float_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
