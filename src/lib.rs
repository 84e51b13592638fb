//! Flipbook - image sequence playback library
//!
//! Re-exports all modules for use by binary targets.

// Core engine (resolver, frame store, loader, cursor, presenter)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod widgets;

// Re-export commonly used types from core
pub use core::background::LoaderStatus;
pub use core::presenter::CpuTexture;
pub use core::sequence::{ImageSequence, LoadState};

// Re-export entities
pub use entities::{ErrorKind, FilterMode, Frame, SequenceError, TextureUploader};
