use flipbook::cli::Args;
use flipbook::config::{self, SequenceSettings};
use flipbook::core::resolver::Source;
use flipbook::widgets::status::ProgressBar;
use flipbook::widgets::viewport::{EguiTexture, ViewportState};
use flipbook::{CpuTexture, FilterMode, ImageSequence, LoadState, LoaderStatus};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use eframe::egui;
use log::{debug, error, info, warn};

/// Viewer state
struct ViewerApp {
    sequence: ImageSequence<EguiTexture>,
    source: Source,
    viewport: ViewportState,
    progress: ProgressBar,
    playing: bool,
    /// Seconds into the sequence, drives time addressing while playing
    clock: f64,
    error_msg: Option<String>,
}

impl ViewerApp {
    fn new(ctx: &egui::Context, source: Source, settings: &SequenceSettings) -> Result<Self> {
        let mut sequence = ImageSequence::with_settings(EguiTexture::new(ctx.clone()), settings)?;

        let error_msg = match sequence.load_source(&source) {
            Ok(state) => {
                info!("Load started: {} ({:?})", source, state);
                None
            }
            Err(e) => {
                error!("Failed to load {}: {}", source, e);
                Some(e.to_string())
            }
        };

        Ok(Self {
            sequence,
            source,
            viewport: ViewportState::new(),
            progress: ProgressBar::new(240.0, 14.0),
            playing: true,
            clock: 0.0,
            error_msg,
        })
    }

    fn poll_loader(&mut self) {
        match self.sequence.update() {
            Some(LoaderStatus::Completed) => {
                info!("{} frames ready", self.sequence.total_frames());
                self.clock = 0.0;
            }
            Some(LoaderStatus::Cancelled) => self.error_msg = Some("Load cancelled".to_string()),
            Some(status) => self.error_msg = Some(format!("Load {:?}: {}", status, self.source)),
            None => {}
        }
    }

    fn seek(&mut self, index: usize) {
        self.playing = false;
        if let Err(e) = self.sequence.set_frame(index as i64) {
            warn!("Seek to {} failed: {}", index, e);
        }
        self.clock = index as f64 / self.sequence.frame_rate();
    }

    fn advance(&mut self, dt: f64) {
        if !self.playing || !self.sequence.is_loaded() {
            return;
        }

        let length = self.sequence.length_in_seconds();
        self.clock = (self.clock + dt) % length.max(f64::EPSILON);
        if let Err(e) = self.sequence.set_frame_for_time(self.clock) {
            debug!("Playback frame unavailable: {}", e);
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let label = if self.playing { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                self.playing = !self.playing;
            }

            let mut fps = self.sequence.frame_rate();
            if ui
                .add(egui::DragValue::new(&mut fps).range(1.0..=240.0).suffix(" fps"))
                .changed()
                && let Err(e) = self.sequence.set_frame_rate(fps)
            {
                self.error_msg = Some(e.to_string());
            }

            let (_, mag) = self.sequence.min_mag_filter();
            let mut nearest = mag == FilterMode::Nearest;
            if ui.checkbox(&mut nearest, "Nearest").changed() {
                let filter = if nearest { FilterMode::Nearest } else { FilterMode::Linear };
                self.sequence.set_min_mag_filter(filter, filter);
            }

            if ui.button("Fit").clicked() {
                self.viewport.set_mode_fit();
            }
            if ui.button("100%").clicked() {
                self.viewport.set_mode_100();
            }

            ui.separator();
            if self.sequence.is_loaded() {
                ui.monospace(format!(
                    "{:>5}/{}  {}x{}  {:.2}s",
                    self.sequence.current_frame(),
                    self.sequence.total_frames(),
                    self.sequence.width(),
                    self.sequence.height(),
                    self.sequence.length_in_seconds()
                ));
            }
        });
    }

    fn timeline(&mut self, ui: &mut egui::Ui) {
        if self.sequence.is_loading() {
            ui.horizontal(|ui| {
                let total = 1000;
                let done = (self.sequence.load_progress() * total as f32) as usize;
                self.progress.set_progress(done, total);
                self.progress.render(ui);
                if ui.button("Cancel").clicked() {
                    self.sequence.cancel_load();
                }
            });
            return;
        }

        if let Some(msg) = &self.error_msg {
            ui.colored_label(egui::Color32::from_rgb(220, 80, 80), msg);
        }

        let total = self.sequence.total_frames();
        if total == 0 {
            return;
        }

        let mut index = self.sequence.current_frame();
        ui.spacing_mut().slider_width = ui.available_width() - 80.0;
        if ui.add(egui::Slider::new(&mut index, 0..=total - 1)).changed() {
            self.seek(index);
        }
        if let Some(path) = self.sequence.frame_path(index) {
            ui.small(path.display().to_string());
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();

        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.playing = !self.playing;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.sequence.cancel_load();
        }

        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.advance(dt);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("timeline").show(ctx, |ui| self.timeline(ui));
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if let Some(percent) = self.viewport.show(ui, self.sequence.texture()) {
                    let index = self.sequence.frame_index_at_percent(percent);
                    self.seek(index);
                }
            });

        if self.playing || self.sequence.is_loading() {
            ctx.request_repaint();
        }
    }
}

/// Load without a window and present every frame once
fn run_headless(source: &Source, settings: &SequenceSettings) -> Result<()> {
    let mut sequence = ImageSequence::with_settings(CpuTexture::new(), settings)?;

    if sequence.load_source(source)? == LoadState::Loading {
        info!("Waiting for background load");
    }
    if sequence.wait_for_load() != LoadState::Loaded {
        bail!("Loading {} failed ({:?})", source, sequence.loader_status());
    }

    let total = sequence.total_frames();
    let mut failed = 0;
    for index in 0..total {
        if sequence.set_frame(index as i64).is_err() {
            failed += 1;
        }
    }

    println!(
        "{}: {} frames, {}x{}, {:.2}s at {} fps, {} uploads, {} failed",
        source,
        total,
        sequence.width(),
        sequence.height(),
        sequence.length_in_seconds(),
        sequence.frame_rate(),
        sequence.texture().upload_count(),
        failed
    );
    Ok(())
}

fn init_logging(args: &Args, path_config: &config::PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::config_file("flipbook.log", path_config));

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging, respects RUST_LOG if set
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level.as_str()))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());
    init_logging(&args, &path_config)?;

    info!("Flipbook starting...");
    debug!("Command-line args: {:?}", args);

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    info!("Config path: {}", settings_path.display());
    let mut settings = SequenceSettings::load(&settings_path)?;
    args.apply_to(&mut settings);

    if args.save_settings {
        settings.save(&settings_path)?;
        info!("Saved settings to {}", settings_path.display());
    }

    let source = args.load_source().map_err(|e| anyhow!(e))?;

    if args.headless {
        return run_headless(&source, &settings);
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Flipbook v{} • {}", env!("CARGO_PKG_VERSION"), source))
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Flipbook",
        native_options,
        Box::new(move |cc| {
            let app = ViewerApp::new(&cc.egui_ctx, source, &settings)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("Viewer failed: {}", e))
}
