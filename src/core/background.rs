//! Background loader - resolves and decodes a whole sequence off the owner thread
//!
//! Lifecycle: `Idle → Running → {Completed, Cancelled, Failed}`.
//!
//! The worker thread takes ownership of a fresh [`FrameStore`] and hands it
//! back through a channel when done, so the owner can never observe a
//! half-filled store. The owner discovers completion by calling
//! [`BackgroundLoader::poll`] from its own tick; nothing is called back into
//! owner code.
//!
//! Cancellation is a single `AtomicBool` checked between decodes. Dropping a
//! running loader cancels it and joins the thread.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use log::{info, trace, warn};

use super::frame_store::{DecodeAll, FrameStore};
use super::resolver::Source;
use crate::entities::{FileLister, ImageDecoder, SequenceError};

/// Background loader state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Message sent by the worker thread exactly once
#[derive(Debug)]
pub enum LoadOutcome {
    Completed {
        store: FrameStore,
        decoded: usize,
        failed: usize,
    },
    Cancelled,
    Failed(SequenceError),
}

impl LoadOutcome {
    pub fn status(&self) -> LoaderStatus {
        match self {
            LoadOutcome::Completed { .. } => LoaderStatus::Completed,
            LoadOutcome::Cancelled => LoaderStatus::Cancelled,
            LoadOutcome::Failed(_) => LoaderStatus::Failed,
        }
    }
}

/// Decode counters published by the worker
#[derive(Debug, Default)]
pub struct LoaderProgress {
    decoded: AtomicUsize,
    total: AtomicUsize,
}

impl LoaderProgress {
    /// Fraction of slots processed, `0.0` until the file list is known
    pub fn fraction(&self) -> f32 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        (self.decoded.load(Ordering::Relaxed) as f32 / total as f32).min(1.0)
    }

    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

/// One in-flight background load
pub struct BackgroundLoader {
    handle: Option<thread::JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
    progress: Arc<LoaderProgress>,
    outcome_rx: Receiver<LoadOutcome>,
    status: LoaderStatus,
}

impl BackgroundLoader {
    /// Spawn the worker thread: resolve `source`, then decode every frame.
    ///
    /// Returns as soon as the thread is running.
    pub fn spawn(
        source: Source,
        lister: Arc<dyn FileLister>,
        decoder: Arc<dyn ImageDecoder>,
        yield_interval: Duration,
    ) -> Result<Self, SequenceError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(LoaderProgress::default());
        let (outcome_tx, outcome_rx) = bounded(1);

        let thread_cancel = Arc::clone(&cancel);
        let thread_progress = Arc::clone(&progress);

        let handle = thread::Builder::new()
            .name("flipbook-loader".to_string())
            .spawn(move || {
                trace!("Loader thread started for {}", source);
                let outcome = run(&source, lister.as_ref(), decoder.as_ref(), &thread_cancel, &thread_progress, yield_interval);
                trace!("Loader thread finished: {:?}", outcome.status());
                // Receiver may already be gone if the owner was dropped
                let _ = outcome_tx.send(outcome);
            })?;

        Ok(Self {
            handle: Some(handle),
            cancel,
            progress,
            outcome_rx,
            status: LoaderStatus::Running,
        })
    }

    pub fn status(&self) -> LoaderStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == LoaderStatus::Running
    }

    pub fn progress(&self) -> &LoaderProgress {
        &self.progress
    }

    /// Request cooperative cancellation. Idempotent; no-op once finished.
    pub fn cancel(&self) {
        if self.is_running() && !self.cancel.swap(true, Ordering::AcqRel) {
            info!("Cancelling background load");
        }
    }

    /// Non-blocking completion check, meant to be called once per owner tick.
    ///
    /// Returns the outcome the first time it is observed, `None` otherwise.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        if !self.is_running() {
            return None;
        }

        match self.outcome_rx.try_recv() {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(self.finish(LoadOutcome::Failed(SequenceError::LoaderDisconnected)))
            }
        }
    }

    /// Block until the worker reports, then return its outcome.
    pub fn wait(&mut self) -> Option<LoadOutcome> {
        if !self.is_running() {
            return None;
        }

        let outcome = self
            .outcome_rx
            .recv()
            .unwrap_or(LoadOutcome::Failed(SequenceError::LoaderDisconnected));
        Some(self.finish(outcome))
    }

    fn finish(&mut self, outcome: LoadOutcome) -> LoadOutcome {
        self.status = outcome.status();
        self.join();
        outcome
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Loader thread panicked");
            }
        }
    }
}

impl Drop for BackgroundLoader {
    fn drop(&mut self) {
        if self.handle.is_some() {
            trace!("Loader dropped while running, cancelling and joining");
            self.cancel.store(true, Ordering::Release);
            self.join();
        }
    }
}

fn run(
    source: &Source,
    lister: &dyn FileLister,
    decoder: &dyn ImageDecoder,
    cancel: &AtomicBool,
    progress: &LoaderProgress,
    yield_interval: Duration,
) -> LoadOutcome {
    let paths = match source.resolve(lister) {
        Ok(paths) => paths,
        Err(e) => return LoadOutcome::Failed(e),
    };

    if cancel.load(Ordering::Acquire) {
        return LoadOutcome::Cancelled;
    }

    let mut store = FrameStore::new(paths);
    progress.total.store(store.len(), Ordering::Relaxed);

    match store.decode_all(decoder, cancel, yield_interval, |n| {
        progress.decoded.store(n, Ordering::Relaxed)
    }) {
        DecodeAll::Completed { decoded, failed } => {
            info!("Background load decoded {} frames ({} failed)", decoded, failed);
            LoadOutcome::Completed { store, decoded, failed }
        }
        // Partially decoded pixels are dropped with the store
        DecodeAll::Cancelled => LoadOutcome::Cancelled,
    }
}
