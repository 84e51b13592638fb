//! Core engine - resolving, storing, loading and presenting frames
//!
//! These modules form the playback engine, independent of UI.

pub mod background;
pub mod cursor;
pub mod frame_store;
pub mod presenter;
pub mod resolver;
pub mod sequence;

// Re-exports for convenience
pub use background::{BackgroundLoader, LoadOutcome, LoaderProgress, LoaderStatus};
pub use cursor::PlaybackCursor;
pub use frame_store::FrameStore;
pub use presenter::{CpuTexture, TexturePresenter};
pub use resolver::{FsLister, Source};
pub use sequence::{ImageSequence, LoadState};
