//! Image sequence - still images played back like frames of a movie
//!
//! **Why**: Random frame access with no decode lag once a frame is resident,
//! alpha-capable "movies" without codecs, and percent/time addressing.
//!
//! **Used by**: Viewer app (egui texture), headless playback, any render loop
//! that owns a [`TextureUploader`].
//!
//! # Lifecycle
//!
//! ```text
//! Unloaded ──load_sequence/load_folder──▶ Loaded
//!     │                                     ▲
//!     └─load_folder (threaded)─▶ Loading ───┘  (observed via update())
//!                                  │
//!                                  └─cancel / failure─▶ Unloaded
//! ```
//!
//! Every load starts by unloading, which releases all pixels and the texture
//! contents and joins a running loader.
//!
//! # Example
//!
//! ```rust,no_run
//! use flipbook::{CpuTexture, ImageSequence};
//!
//! let mut seq = ImageSequence::new(CpuTexture::new());
//! seq.load_sequence("frames/f", "png", 1, 120, 3)?;
//! seq.set_frame_for_time(1.5)?;
//! println!("{} of {}", seq.current_frame(), seq.total_frames());
//! # Ok::<(), flipbook::SequenceError>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use super::background::{BackgroundLoader, LoadOutcome, LoaderStatus};
use super::cursor::{self, PlaybackCursor};
use super::frame_store::FrameStore;
use super::presenter::TexturePresenter;
use super::resolver::{FsLister, Source};
use crate::config::SequenceSettings;
use crate::entities::{FileLister, FilterMode, Frame, ImageDecoder, Loader, SequenceError, TextureUploader};

/// Load state of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    /// Background load in flight; poll [`ImageSequence::update`]
    Loading,
    Loaded,
}

/// Default pause between background decodes
pub const DEFAULT_YIELD_INTERVAL: Duration = Duration::from_millis(5);

/// A loaded (or loading) image sequence plus its single texture
pub struct ImageSequence<T: TextureUploader> {
    state: LoadState,
    // None while Unloaded or while the background loader owns the store
    store: Option<FrameStore>,
    loader: Option<BackgroundLoader>,
    loader_status: LoaderStatus,
    presenter: TexturePresenter<T>,
    cursor: PlaybackCursor,
    dimensions: Option<(usize, usize)>,

    // Loading configuration, locked outside Unloaded
    max_frames: usize,
    extension: Option<String>,
    threaded: bool,
    yield_interval: Duration,

    lister: Arc<dyn FileLister>,
    decoder: Arc<dyn ImageDecoder>,
}

impl<T: TextureUploader> ImageSequence<T> {
    /// Sequence using the filesystem lister and the `image` crate decoder
    pub fn new(texture: T) -> Self {
        Self::with_collaborators(texture, Arc::new(FsLister), Arc::new(Loader))
    }

    pub fn with_collaborators(
        texture: T,
        lister: Arc<dyn FileLister>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        Self {
            state: LoadState::Unloaded,
            store: None,
            loader: None,
            loader_status: LoaderStatus::Idle,
            presenter: TexturePresenter::new(texture),
            cursor: PlaybackCursor::default(),
            dimensions: None,
            max_frames: 0,
            extension: None,
            threaded: false,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            lister,
            decoder,
        }
    }

    /// Default collaborators configured from `settings`
    pub fn with_settings(texture: T, settings: &SequenceSettings) -> Result<Self, SequenceError> {
        let mut seq = Self::new(texture);
        seq.apply_settings(settings)?;
        Ok(seq)
    }

    // ===== Configuration =====

    /// Apply every field of `settings`. Only allowed while unloaded.
    pub fn apply_settings(&mut self, settings: &SequenceSettings) -> Result<(), SequenceError> {
        self.check_unloaded("settings")?;

        self.cursor.set_frame_rate(settings.frame_rate)?;
        self.max_frames = settings.max_frames;
        self.extension = normalize_extension(settings.extension.as_deref());
        self.threaded = settings.threaded;
        self.yield_interval = settings.yield_interval();
        self.presenter.set_min_mag_filter(settings.min_filter, settings.mag_filter);
        Ok(())
    }

    /// Limit how many files a folder load lists. 0 = no limit.
    pub fn set_max_frames(&mut self, max_frames: usize) -> Result<(), SequenceError> {
        self.check_unloaded("max frames")?;
        self.max_frames = max_frames;
        Ok(())
    }

    /// Only list files with this extension on folder loads. Empty = any.
    pub fn set_extension(&mut self, extension: &str) -> Result<(), SequenceError> {
        self.check_unloaded("extension")?;
        self.extension = normalize_extension(Some(extension));
        Ok(())
    }

    /// Resolve and decode folder loads on a background thread
    pub fn enable_threaded_load(&mut self, enable: bool) -> Result<(), SequenceError> {
        self.check_unloaded("threaded loading")?;
        self.threaded = enable;
        Ok(())
    }

    /// Pause between background decodes (bounds cancel latency and CPU use)
    pub fn set_yield_interval(&mut self, interval: Duration) -> Result<(), SequenceError> {
        self.check_unloaded("yield interval")?;
        self.yield_interval = interval;
        Ok(())
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    fn check_unloaded(&self, setting: &'static str) -> Result<(), SequenceError> {
        if self.state != LoadState::Unloaded {
            error!("{} must be set before loading", setting);
            return Err(SequenceError::ConfigLocked { setting });
        }
        Ok(())
    }

    // ===== Loading =====

    /// Load `prefix` + number + `.ext` for `start..=end`, zero padded to `digits`
    /// (0 = unpadded). Frames decode lazily; frame 0 is decoded right away.
    pub fn load_sequence(
        &mut self,
        prefix: &str,
        ext: &str,
        start: i64,
        end: i64,
        digits: usize,
    ) -> Result<LoadState, SequenceError> {
        self.load_now(Source::Numbered {
            prefix: prefix.to_string(),
            ext: ext.to_string(),
            start,
            end,
            digits,
        })
    }

    /// Load a printf-style pattern such as `shot.%04d.exr` for `start..=end`
    pub fn load_sequence_pattern(&mut self, pattern: &str, start: i64, end: i64) -> Result<LoadState, SequenceError> {
        self.load_now(Source::Pattern {
            pattern: pattern.to_string(),
            start,
            end,
        })
    }

    /// Load every image in `folder` (sorted by name).
    ///
    /// With threaded loading enabled this only starts the background load and
    /// returns `LoadState::Loading`; call [`update`](Self::update) each tick.
    pub fn load_folder(&mut self, folder: impl AsRef<Path>) -> Result<LoadState, SequenceError> {
        self.unload_sequence();

        let source = Source::Folder {
            folder: folder.as_ref().to_path_buf(),
            extension: self.extension.clone(),
            max_frames: (self.max_frames > 0).then_some(self.max_frames),
        };

        if !self.threaded {
            return self.load_resolved(&source);
        }

        let loader = BackgroundLoader::spawn(
            source,
            Arc::clone(&self.lister),
            Arc::clone(&self.decoder),
            self.yield_interval,
        )
        .inspect_err(|e| error!("Could not start background load: {}", e))?;

        info!("Background load started for {}", folder.as_ref().display());
        self.loader = Some(loader);
        self.loader_status = LoaderStatus::Running;
        self.state = LoadState::Loading;
        Ok(self.state)
    }

    /// Load any [`Source`].
    ///
    /// Folder sources use the sequence's own extension, max frames and
    /// threading settings, same as [`load_folder`](Self::load_folder).
    pub fn load_source(&mut self, source: &Source) -> Result<LoadState, SequenceError> {
        match source {
            Source::Folder { folder, .. } => self.load_folder(folder),
            _ => self.load_now(source.clone()),
        }
    }

    fn load_now(&mut self, source: Source) -> Result<LoadState, SequenceError> {
        self.unload_sequence();
        self.load_resolved(&source)
    }

    fn load_resolved(&mut self, source: &Source) -> Result<LoadState, SequenceError> {
        let paths = source.resolve(self.lister.as_ref())?;
        self.complete_loading(FrameStore::new(paths));
        Ok(self.state)
    }

    /// Finalize: take the store, mark loaded, force a real upload of frame 0
    fn complete_loading(&mut self, store: FrameStore) {
        if store.is_empty() {
            error!("Load failed with empty image sequence");
            return;
        }

        self.dimensions = store.first_dimensions();
        self.store = Some(store);
        self.state = LoadState::Loaded;
        self.presenter.reset();
        self.cursor.reset();

        if let Err(e) = self.load_frame(0) {
            warn!("First frame unavailable: {}", e);
        }

        info!(
            "Sequence loaded: {} frames, {}x{}",
            self.total_frames(),
            self.width(),
            self.height()
        );
    }

    /// Poll the background loader; call once per owner tick.
    ///
    /// Returns the loader's final status the first time completion is observed.
    pub fn update(&mut self) -> Option<LoaderStatus> {
        let outcome = self.loader.as_mut()?.poll()?;
        Some(self.handle_outcome(outcome))
    }

    /// Block until an in-flight background load finishes, then finalize it
    pub fn wait_for_load(&mut self) -> LoadState {
        if let Some(outcome) = self.loader.as_mut().and_then(BackgroundLoader::wait) {
            self.handle_outcome(outcome);
        }
        self.state
    }

    fn handle_outcome(&mut self, outcome: LoadOutcome) -> LoaderStatus {
        self.loader = None;
        let status = outcome.status();
        self.loader_status = status;

        match outcome {
            LoadOutcome::Completed { store, decoded, failed } => {
                info!("Background load finished: {} decoded, {} failed", decoded, failed);
                self.complete_loading(store);
            }
            LoadOutcome::Cancelled => {
                info!("Background load cancelled");
                self.state = LoadState::Unloaded;
            }
            LoadOutcome::Failed(e) => {
                error!("Background load failed: {}", e);
                self.state = LoadState::Unloaded;
            }
        }
        status
    }

    /// Request cancellation of the background load. No-op when none runs.
    ///
    /// The loader stops at its next yield point; `update()` then reports
    /// `LoaderStatus::Cancelled` and the sequence stays unloaded.
    pub fn cancel_load(&self) {
        if let Some(loader) = &self.loader {
            loader.cancel();
        }
    }

    /// Release all frames and the texture contents.
    ///
    /// A running background load is cancelled and joined first. Its result
    /// is discarded; `loader_status()` reports how the worker ended.
    pub fn unload_sequence(&mut self) {
        if let Some(mut loader) = self.loader.take() {
            loader.cancel();
            // A load that finished before the cancel keeps its own status
            self.loader_status = loader.wait().map_or(LoaderStatus::Cancelled, |outcome| outcome.status());
        }

        if self.state == LoadState::Loaded {
            info!("Unloading sequence ({} frames)", self.total_frames());
        }

        self.store = None;
        self.dimensions = None;
        self.state = LoadState::Unloaded;
        self.presenter.clear();
        self.cursor.reset();
    }

    // ===== Addressing =====

    /// Show frame `index`.
    ///
    /// Negative indices are rejected without moving the cursor; indices past
    /// the end wrap (`index % total`). The cursor moves even when the target
    /// frame fails to decode; the decode error is returned.
    pub fn set_frame(&mut self, index: i64) -> Result<usize, SequenceError> {
        if self.state != LoadState::Loaded {
            error!("Calling set_frame on uninitialized image sequence");
            return Err(SequenceError::NotLoaded);
        }

        let index = PlaybackCursor::wrap_index(index, self.total_frames())?;
        let result = self.load_frame(index);
        self.cursor.set_current(index);
        result.map(|()| index)
    }

    /// Show the frame at `time` seconds, normalized by the sequence length
    pub fn set_frame_for_time(&mut self, time: f64) -> Result<usize, SequenceError> {
        let index = self.cursor.frame_for_time(time, self.total_frames());
        self.set_frame(index as i64)
    }

    /// Show the frame at `percent` of the sequence (wraps outside `[0, 1]`)
    pub fn set_frame_at_percent(&mut self, percent: f64) -> Result<usize, SequenceError> {
        let index = self.frame_index_at_percent(percent);
        self.set_frame(index as i64)
    }

    pub fn frame_index_at_percent(&self, percent: f64) -> usize {
        cursor::frame_index_at_percent(percent, self.total_frames())
    }

    pub fn percent_at_frame_index(&self, index: usize) -> f64 {
        cursor::percent_at_frame_index(index, self.total_frames())
    }

    /// Decode (if needed) and upload `index` unless it is already on the texture
    fn load_frame(&mut self, index: usize) -> Result<(), SequenceError> {
        if self.presenter.is_current(index) {
            return Ok(());
        }

        let store = self.store.as_mut().ok_or(SequenceError::NotLoaded)?;
        let frame = store.decode(index, self.decoder.as_ref())?;

        if self.dimensions.is_none() {
            self.dimensions = Some(frame.resolution());
        }
        self.presenter.present(index, frame);
        Ok(())
    }

    // ===== Texture =====

    pub fn texture(&self) -> &T {
        self.presenter.texture()
    }

    /// Filters are applied to the held texture immediately
    pub fn set_min_mag_filter(&mut self, min: FilterMode, mag: FilterMode) {
        self.presenter.set_min_mag_filter(min, mag);
    }

    pub fn min_mag_filter(&self) -> (FilterMode, FilterMode) {
        self.presenter.filters()
    }

    // ===== Queries =====

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn loader_status(&self) -> LoaderStatus {
        self.loader_status
    }

    /// Background progress in `[0, 1]`; 1.0 once loaded
    pub fn load_progress(&self) -> f32 {
        match (&self.loader, self.state) {
            (Some(loader), _) => loader.progress().fraction(),
            (None, LoadState::Loaded) => 1.0,
            (None, _) => 0.0,
        }
    }

    /// Width of the first decoded frame, 0 until one decodes
    pub fn width(&self) -> usize {
        self.dimensions.map_or(0, |(w, _)| w)
    }

    pub fn height(&self) -> usize {
        self.dimensions.map_or(0, |(_, h)| h)
    }

    pub fn total_frames(&self) -> usize {
        self.store.as_ref().map_or(0, FrameStore::len)
    }

    pub fn current_frame(&self) -> usize {
        self.cursor.current()
    }

    pub fn frame_rate(&self) -> f64 {
        self.cursor.frame_rate()
    }

    /// Affects later time lookups only; the current frame stays put
    pub fn set_frame_rate(&mut self, frame_rate: f64) -> Result<(), SequenceError> {
        self.cursor.set_frame_rate(frame_rate)
    }

    pub fn length_in_seconds(&self) -> f64 {
        self.cursor.length_in_seconds(self.total_frames())
    }

    pub fn frame_path(&self, index: usize) -> Option<&Path> {
        self.store.as_ref()?.path(index)
    }

    /// Decoded pixels of `index`, if resident
    pub fn pixels(&self, index: usize) -> Option<&Frame> {
        self.store.as_ref()?.frame(index)
    }

    pub fn decoded_count(&self) -> usize {
        self.store.as_ref().map_or(0, FrameStore::decoded_count)
    }
}

impl<T: TextureUploader> Drop for ImageSequence<T> {
    fn drop(&mut self) {
        self.unload_sequence();
    }
}

fn normalize_extension(ext: Option<&str>) -> Option<String> {
    ext.map(|e| e.trim().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presenter::CpuTexture;
    use crate::entities::FrameError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Decodes any path to a 3x2 frame, fails on paths containing "bad"
    #[derive(Default)]
    struct FakeDecoder {
        calls: AtomicUsize,
    }

    impl ImageDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<Frame, FrameError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if path.to_string_lossy().contains("bad") {
                return Err(FrameError::Image("corrupt".into()));
            }
            Ok(Frame::solid(3, 2, [5, 6, 7, 255]))
        }
    }

    /// Lists `n` virtual files
    struct VirtualLister(usize);

    impl FileLister for VirtualLister {
        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn list(&self, folder: &Path, _ext: Option<&str>, max: Option<usize>) -> Result<Vec<PathBuf>, SequenceError> {
            let n = max.map_or(self.0, |m| m.min(self.0));
            Ok((0..n).map(|i| folder.join(format!("{:04}.png", i))).collect())
        }
    }

    fn fake_sequence(n: usize) -> (ImageSequence<CpuTexture>, Arc<FakeDecoder>) {
        let decoder = Arc::new(FakeDecoder::default());
        let seq = ImageSequence::with_collaborators(
            CpuTexture::new(),
            Arc::new(VirtualLister(n)),
            decoder.clone(),
        );
        (seq, decoder)
    }

    #[test]
    fn test_numbered_load_decodes_first_frame_only() {
        let (mut seq, decoder) = fake_sequence(0);
        assert_eq!(seq.load_sequence("f", "png", 1, 3, 3).unwrap(), LoadState::Loaded);

        assert_eq!(seq.total_frames(), 3);
        assert_eq!(seq.frame_path(0), Some(Path::new("f001.png")));
        assert_eq!(seq.frame_path(2), Some(Path::new("f003.png")));
        assert_eq!((seq.width(), seq.height()), (3, 2));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(seq.texture().upload_count(), 1);
    }

    #[test]
    fn test_set_frame_wraps_and_rejects_negative() {
        let (mut seq, _) = fake_sequence(5);
        seq.load_folder("virtual").unwrap();

        assert_eq!(seq.set_frame(7).unwrap(), 2);
        assert_eq!(seq.current_frame(), 2);

        assert!(matches!(seq.set_frame(-1), Err(SequenceError::NegativeIndex(-1))));
        assert_eq!(seq.current_frame(), 2);
    }

    #[test]
    fn test_same_frame_twice_uploads_once() {
        let (mut seq, decoder) = fake_sequence(4);
        seq.load_folder("virtual").unwrap();
        let uploads = seq.texture().upload_count();

        seq.set_frame(2).unwrap();
        seq.set_frame(2).unwrap();
        assert_eq!(seq.texture().upload_count(), uploads + 1);
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 2);

        // Lazily decoded frames stay resident
        seq.set_frame(0).unwrap();
        seq.set_frame(2).unwrap();
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(seq.decoded_count(), 2);
    }

    #[test]
    fn test_addressing_unloaded_is_error() {
        let (mut seq, _) = fake_sequence(3);
        assert!(matches!(seq.set_frame(0), Err(SequenceError::NotLoaded)));
        assert!(matches!(seq.set_frame_at_percent(0.5), Err(SequenceError::NotLoaded)));
        assert!(matches!(seq.set_frame_for_time(1.0), Err(SequenceError::NotLoaded)));
        assert_eq!(seq.total_frames(), 0);
        assert_eq!(seq.length_in_seconds(), 0.0);
    }

    #[test]
    fn test_config_locked_after_load() {
        let (mut seq, _) = fake_sequence(3);
        seq.set_max_frames(2).unwrap();
        seq.set_extension(".PNG").unwrap();
        assert_eq!(seq.extension(), Some("PNG"));

        seq.load_folder("virtual").unwrap();
        assert_eq!(seq.total_frames(), 2);

        assert!(matches!(seq.set_max_frames(10), Err(SequenceError::ConfigLocked { .. })));
        assert!(matches!(seq.enable_threaded_load(true), Err(SequenceError::ConfigLocked { .. })));
        assert!(matches!(seq.set_extension("jpg"), Err(SequenceError::ConfigLocked { .. })));
        assert_eq!(seq.max_frames(), 2);
        assert!(!seq.is_threaded());

        seq.unload_sequence();
        assert!(seq.set_max_frames(10).is_ok());
    }

    #[test]
    fn test_time_and_percent_addressing() {
        let (mut seq, _) = fake_sequence(60);
        seq.load_folder("virtual").unwrap();
        assert_eq!(seq.length_in_seconds(), 2.0);

        assert_eq!(seq.set_frame_for_time(1.0).unwrap(), 30);
        seq.set_frame_rate(60.0).unwrap();
        assert_eq!(seq.current_frame(), 30);
        assert_eq!(seq.length_in_seconds(), 1.0);
        assert_eq!(seq.set_frame_for_time(0.5).unwrap(), 30);
        assert_eq!(seq.set_frame_for_time(0.25).unwrap(), 15);

        assert_eq!(seq.set_frame_at_percent(1.0).unwrap(), 59);
        assert_eq!(seq.set_frame_at_percent(-0.5).unwrap(), 30);
    }

    #[test]
    fn test_unload_releases_everything() {
        let (mut seq, _) = fake_sequence(3);
        seq.load_folder("virtual").unwrap();
        seq.unload_sequence();

        assert!(!seq.is_loaded());
        assert_eq!(seq.total_frames(), 0);
        assert_eq!((seq.width(), seq.height()), (0, 0));
        assert!(!seq.texture().is_allocated());
        assert_eq!(seq.load_progress(), 0.0);
    }

    #[test]
    fn test_threaded_load_then_cancel() {
        let (mut seq, _) = fake_sequence(200);
        seq.enable_threaded_load(true).unwrap();
        seq.set_yield_interval(Duration::from_millis(20)).unwrap();

        assert_eq!(seq.load_folder("virtual").unwrap(), LoadState::Loading);
        assert!(seq.is_loading());
        seq.cancel_load();

        assert_eq!(seq.wait_for_load(), LoadState::Unloaded);
        assert!(!seq.is_loading());
        assert!(!seq.is_loaded());
        assert_eq!(seq.total_frames(), 0);
        assert_eq!(seq.decoded_count(), 0);
        assert_eq!(seq.loader_status(), LoaderStatus::Cancelled);
    }

    #[test]
    fn test_threaded_load_completes_via_update() {
        let (mut seq, decoder) = fake_sequence(4);
        seq.enable_threaded_load(true).unwrap();
        seq.set_yield_interval(Duration::ZERO).unwrap();
        seq.load_folder("virtual").unwrap();

        let mut status = None;
        for _ in 0..1000 {
            status = seq.update();
            if status.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(status, Some(LoaderStatus::Completed));
        assert!(seq.is_loaded());
        assert_eq!(seq.decoded_count(), 4);
        assert_eq!((seq.width(), seq.height()), (3, 2));
        assert_eq!(seq.texture().upload_count(), 1);
        // Everything was preloaded, presenting more frames decodes nothing new
        seq.set_frame(3).unwrap();
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_cancel_without_load_is_noop() {
        let (seq, _) = fake_sequence(3);
        seq.cancel_load();
        assert_eq!(seq.load_state(), LoadState::Unloaded);
        assert_eq!(seq.loader_status(), LoaderStatus::Idle);
    }
}
