//! Frame store - one lazily decoded slot per resolved path
//!
//! Slots are allocated once per load and never reordered; the slot index is
//! the frame's identity until the sequence is unloaded. Decoded pixels stay
//! in their slot (no eviction), so memory grows with the number of distinct
//! frames touched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};

use crate::entities::{Frame, ImageDecoder, SequenceError};

/// One sequence slot: source path plus optional decoded pixels
#[derive(Debug, Clone)]
struct SequenceEntry {
    path: PathBuf,
    pixels: Option<Frame>,
}

impl SequenceEntry {
    fn is_decoded(&self) -> bool {
        self.pixels.is_some()
    }
}

/// Result of [`FrameStore::decode_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeAll {
    Completed { decoded: usize, failed: usize },
    Cancelled,
}

/// Ordered collection of sequence slots
#[derive(Debug, Default)]
pub struct FrameStore {
    entries: Vec<SequenceEntry>,
}

impl FrameStore {
    /// Allocate one empty slot per path, in order
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            entries: paths
                .into_iter()
                .map(|path| SequenceEntry { path, pixels: None })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(|e| e.path.as_path())
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.entries.get(index).and_then(|e| e.pixels.as_ref())
    }

    pub fn is_decoded(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(SequenceEntry::is_decoded)
    }

    pub fn decoded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_decoded()).count()
    }

    /// Resolution of the first decoded slot, in index order
    pub fn first_dimensions(&self) -> Option<(usize, usize)> {
        self.entries
            .iter()
            .find_map(|e| e.pixels.as_ref().map(Frame::resolution))
    }

    /// Decode slot `index` unless it already holds pixels.
    ///
    /// Out-of-range indices and decode failures are logged and returned; a
    /// failed slot stays empty and can be retried later.
    pub fn decode(&mut self, index: usize, decoder: &dyn ImageDecoder) -> Result<&Frame, SequenceError> {
        let total = self.entries.len();
        let Some(entry) = self.entries.get_mut(index) else {
            error!("Calling a frame out of bounds: {} (total {})", index, total);
            return Err(SequenceError::IndexOutOfRange { index, total });
        };

        if entry.pixels.is_none() {
            debug!("Decoding frame {}: {}", index, entry.path.display());
            match decoder.decode(&entry.path) {
                Ok(frame) => entry.pixels = Some(frame),
                Err(source) => {
                    error!("Image failed to load: {}: {}", entry.path.display(), source);
                    return Err(SequenceError::Decode {
                        path: entry.path.clone(),
                        source,
                    });
                }
            }
        }

        entry.pixels.as_ref().ok_or(SequenceError::IndexOutOfRange { index, total })
    }

    /// Decode every slot in order.
    ///
    /// Before each decode the loop sleeps `yield_interval` (if non-zero) and
    /// then checks `cancel`, so a cancel request is honored within one decode
    /// plus one yield. `on_progress` receives the number of slots processed.
    pub fn decode_all(
        &mut self,
        decoder: &dyn ImageDecoder,
        cancel: &AtomicBool,
        yield_interval: Duration,
        mut on_progress: impl FnMut(usize),
    ) -> DecodeAll {
        if self.entries.is_empty() {
            warn!("Calling decode_all on an empty frame store");
            return DecodeAll::Completed { decoded: 0, failed: 0 };
        }

        let mut decoded = 0;
        let mut failed = 0;

        for index in 0..self.entries.len() {
            if !yield_interval.is_zero() {
                thread::sleep(yield_interval);
            }
            if cancel.load(Ordering::Acquire) {
                debug!("decode_all cancelled at frame {}", index);
                return DecodeAll::Cancelled;
            }

            match self.decode(index, decoder) {
                Ok(_) => decoded += 1,
                Err(_) => failed += 1, // already logged
            }
            on_progress(index + 1);
        }

        DecodeAll::Completed { decoded, failed }
    }
}
