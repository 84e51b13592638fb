use eframe::egui;
use log::{debug, info};

use super::texture::EguiTexture;

// Zoom constants
const ZOOM_STEP: f32 = 0.025;
const ZOOM_IN_FACTOR: f32 = 1.0 + ZOOM_STEP;
const ZOOM_OUT_FACTOR: f32 = 1.0 / ZOOM_IN_FACTOR;

/// Viewport mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewportMode {
    /// User controls zoom/pan, nothing auto-adjusts
    Manual,
    /// Image fits the panel, refits on resize
    #[default]
    AutoFit,
    /// Image at 100% zoom
    Auto100,
}

/// Pan/zoom state of the image viewport
#[derive(Debug, Clone)]
pub struct ViewportState {
    pub zoom: f32,
    pub pan: egui::Vec2,
    pub mode: ViewportMode,
    pub image_size: egui::Vec2,
    pub viewport_size: egui::Vec2,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
            mode: ViewportMode::AutoFit,
            image_size: egui::Vec2::ZERO,
            viewport_size: egui::Vec2::ZERO,
        }
    }
}

impl ViewportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewport_size(&mut self, size: egui::Vec2) {
        self.viewport_size = size;
        if self.mode == ViewportMode::AutoFit {
            self.apply_fit();
        }
    }

    pub fn set_image_size(&mut self, size: egui::Vec2) {
        self.image_size = size;
        if self.mode == ViewportMode::AutoFit {
            self.apply_fit();
        }
    }

    pub fn set_mode_fit(&mut self) {
        info!("Viewport mode: AutoFit");
        self.mode = ViewportMode::AutoFit;
        self.apply_fit();
    }

    pub fn set_mode_100(&mut self) {
        info!("Viewport mode: Auto100");
        self.mode = ViewportMode::Auto100;
        self.zoom = 1.0;
        self.pan = egui::Vec2::ZERO;
    }

    fn apply_fit(&mut self) {
        if self.image_size.x <= 0.0 || self.image_size.y <= 0.0 {
            return;
        }
        let scale_x = self.viewport_size.x / self.image_size.x;
        let scale_y = self.viewport_size.y / self.image_size.y;
        self.zoom = scale_x.min(scale_y);
        self.pan = egui::Vec2::ZERO;
    }

    /// Zoom keeping the point under the cursor still (switches to Manual)
    pub fn handle_zoom(&mut self, zoom_delta: f32, cursor_pos: egui::Vec2) {
        if zoom_delta.abs() < 0.001 {
            return;
        }

        self.mode = ViewportMode::Manual;

        let old_zoom = self.zoom;
        let zoom_factor = if zoom_delta > 0.0 { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
        self.zoom = (self.zoom * zoom_factor).clamp(0.01, 100.0);

        // Screen space, y down
        let zoom_ratio = self.zoom / old_zoom;
        let cursor_to_center = cursor_pos - self.viewport_size * 0.5;
        self.pan = cursor_to_center - (cursor_to_center - self.pan) * zoom_ratio;

        debug!("Zoom: {:.2}x, Pan: ({:.1}, {:.1})", self.zoom, self.pan.x, self.pan.y);
    }

    pub fn handle_pan(&mut self, delta: egui::Vec2) {
        self.mode = ViewportMode::Manual;
        self.pan += delta;
    }

    /// Image rectangle relative to the viewport's top-left corner
    pub fn image_rect(&self) -> egui::Rect {
        let size = self.image_size * self.zoom;
        let center = (self.viewport_size * 0.5 + self.pan).to_pos2();
        egui::Rect::from_center_size(center, size)
    }

    /// Horizontal position over the image as a fraction in `[0, 1]`
    pub fn scrub_percent(&self, local_x: f32) -> f64 {
        let rect = self.image_rect();
        if rect.width() <= 0.0 {
            return 0.0;
        }
        f64::from(((local_x - rect.min.x) / rect.width()).clamp(0.0, 1.0))
    }

    /// Draw `texture` filling the available space.
    ///
    /// Scroll zooms, secondary/middle drag pans, primary drag scrubs.
    /// Returns the scrub position as a percent of the sequence when scrubbing.
    pub fn show(&mut self, ui: &mut egui::Ui, texture: &EguiTexture) -> Option<f64> {
        let (panel, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        self.set_viewport_size(panel.size());
        self.set_image_size(texture.size());

        ui.painter().rect_filled(panel, 0.0, egui::Color32::from_gray(20));

        if response.double_clicked() {
            self.set_mode_fit();
        }

        if let Some(hover) = response.hover_pos() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            self.handle_zoom(scroll, hover - panel.min);
        }

        if response.dragged_by(egui::PointerButton::Secondary) || response.dragged_by(egui::PointerButton::Middle) {
            self.handle_pan(response.drag_delta());
        }

        if let Some(handle) = texture.handle() {
            let rect = self.image_rect().translate(panel.min.to_vec2());
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter().with_clip_rect(panel).image(handle.id(), rect, uv, egui::Color32::WHITE);
        }

        let scrubbing = response.clicked_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Primary);
        if scrubbing && let Some(pos) = response.interact_pointer_pos() {
            return Some(self.scrub_percent(pos.x - panel.min.x));
        }
        None
    }
}
