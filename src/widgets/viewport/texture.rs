//! egui texture backend for `ImageSequence`
//!
//! Holds one `TextureHandle`; every upload replaces its contents in place.

use std::sync::Arc;

use eframe::egui::{self, ColorImage, TextureFilter, TextureHandle, TextureOptions};
use log::trace;

use crate::entities::{FilterMode, Frame, TextureUploader};

const TEXTURE_NAME: &str = "flipbook-frame";

fn to_egui_filter(mode: FilterMode) -> TextureFilter {
    match mode {
        FilterMode::Nearest => TextureFilter::Nearest,
        FilterMode::Linear => TextureFilter::Linear,
    }
}

pub struct EguiTexture {
    ctx: egui::Context,
    handle: Option<TextureHandle>,
    // Shared with egui so a filter change can re-register the same pixels
    image: Option<Arc<ColorImage>>,
    options: TextureOptions,
    uploads: usize,
}

impl EguiTexture {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            handle: None,
            image: None,
            options: TextureOptions::LINEAR,
            uploads: 0,
        }
    }

    pub fn handle(&self) -> Option<&TextureHandle> {
        self.handle.as_ref()
    }

    /// Texture size in pixels, zero when nothing is uploaded
    pub fn size(&self) -> egui::Vec2 {
        self.handle.as_ref().map_or(egui::Vec2::ZERO, TextureHandle::size_vec2)
    }

    pub fn options(&self) -> TextureOptions {
        self.options
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    fn set_image(&mut self, image: Arc<ColorImage>) {
        match &mut self.handle {
            Some(handle) => handle.set(Arc::clone(&image), self.options),
            None => self.handle = Some(self.ctx.load_texture(TEXTURE_NAME, Arc::clone(&image), self.options)),
        }
        self.image = Some(image);
    }

    /// Pixels currently registered with egui
    pub fn image(&self) -> Option<&Arc<ColorImage>> {
        self.image.as_ref()
    }
}

impl TextureUploader for EguiTexture {
    fn upload(&mut self, frame: &Frame) {
        let rgba = frame.to_rgba8();
        let image = ColorImage::from_rgba_unmultiplied([frame.width(), frame.height()], &rgba);
        trace!("egui upload {}x{}", frame.width(), frame.height());
        self.set_image(Arc::new(image));
        self.uploads += 1;
    }

    fn set_filters(&mut self, min: FilterMode, mag: FilterMode) {
        self.options = TextureOptions {
            magnification: to_egui_filter(mag),
            minification: to_egui_filter(min),
            ..TextureOptions::default()
        };
        if let Some(image) = self.image.take() {
            self.set_image(image);
        }
    }

    fn clear(&mut self) {
        // Dropping the last handle frees the GPU texture
        self.handle = None;
        self.image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_and_filters() {
        let ctx = egui::Context::default();
        let mut texture = EguiTexture::new(ctx);
        assert!(texture.handle().is_none());

        texture.upload(&Frame::solid(4, 2, [255, 0, 0, 255]));
        assert_eq!(texture.size(), egui::vec2(4.0, 2.0));
        assert_eq!(texture.upload_count(), 1);

        let uploaded = Arc::clone(texture.image().unwrap());
        texture.set_filters(FilterMode::Nearest, FilterMode::Nearest);
        // Filter change re-registers the same buffer, no pixel copy
        assert!(Arc::ptr_eq(texture.image().unwrap(), &uploaded));
        assert_eq!(texture.options().magnification, TextureFilter::Nearest);
        assert_eq!(texture.options().minification, TextureFilter::Nearest);
        assert!(texture.handle().is_some());

        texture.clear();
        assert_eq!(texture.size(), egui::Vec2::ZERO);
    }
}
