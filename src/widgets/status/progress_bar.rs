use eframe::egui;

/// Progress bar for background loads: fill plus "decoded/total" overlay
pub struct ProgressBar {
    current: usize,
    total: usize,
    width: f32,
    height: f32,
    fill_color: egui::Color32,
}

impl ProgressBar {
    /// Default fill color: light gray (0.7, 0.7, 0.7)
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_color(width, height, egui::Color32::from_rgb(178, 178, 178))
    }

    pub fn with_color(width: f32, height: f32, fill_color: egui::Color32) -> Self {
        Self {
            current: 0,
            total: 0,
            width,
            height,
            fill_color,
        }
    }

    pub fn set_progress(&mut self, current: usize, total: usize) {
        self.current = current;
        self.total = total;
    }

    /// Filled fraction in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        if self.total > 0 {
            (self.current as f32 / self.total as f32).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.current, self.total)
    }

    pub fn render(&self, ui: &mut egui::Ui) {
        let progress = self.fraction();

        let (rect, _response) =
            ui.allocate_exact_size(egui::vec2(self.width, self.height), egui::Sense::hover());

        // Background (dark)
        ui.painter().rect_filled(rect, 2.0, egui::Color32::from_gray(40));

        if progress > 0.0 {
            let fill_rect =
                egui::Rect::from_min_size(rect.min, egui::vec2(rect.width() * progress, rect.height()));
            ui.painter().rect_filled(fill_rect, 2.0, self.fill_color);
        }

        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            self.label(),
            egui::FontId::monospace(9.0),
            egui::Color32::from_gray(220),
        );
    }
}
