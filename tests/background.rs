//! Background loading integration tests.
//!
//! Folder loads with threaded loading enabled run on a worker thread and are
//! observed through `update()` / `wait_for_load()`.

use std::path::Path;
use std::time::{Duration, Instant};

use flipbook::{CpuTexture, ImageSequence, LoadState, LoaderStatus, SequenceError};
use image::{Rgba, RgbaImage};

fn write_frames(dir: &Path, count: usize) {
    for i in 0..count {
        RgbaImage::from_pixel(2, 2, Rgba([i as u8, 0, 0, 255]))
            .save(dir.join(format!("frame_{:04}.png", i)))
            .expect("Failed to write test frame");
    }
}

fn threaded_sequence(yield_interval: Duration) -> ImageSequence<CpuTexture> {
    let mut sequence = ImageSequence::new(CpuTexture::new());
    sequence.enable_threaded_load(true).unwrap();
    sequence.set_yield_interval(yield_interval).unwrap();
    sequence
}

#[test]
fn background_load_completes() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 6);

    let mut sequence = threaded_sequence(Duration::ZERO);
    assert_eq!(sequence.load_folder(temporary_directory.path()).unwrap(), LoadState::Loading);
    assert!(sequence.is_loading());
    assert!(!sequence.is_loaded());

    assert_eq!(sequence.wait_for_load(), LoadState::Loaded);
    assert_eq!(sequence.loader_status(), LoaderStatus::Completed);
    assert_eq!(sequence.total_frames(), 6);
    assert_eq!(sequence.decoded_count(), 6);
    assert_eq!(sequence.load_progress(), 1.0);
    assert_eq!((sequence.width(), sequence.height()), (2, 2));
    assert_eq!(sequence.texture().upload_count(), 1);
}

#[test]
fn update_observes_completion_once() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 3);

    let mut sequence = threaded_sequence(Duration::from_millis(1));
    sequence.load_folder(temporary_directory.path()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = sequence.update() {
            break status;
        }
        assert!(Instant::now() < deadline, "Background load did not finish");
        std::thread::sleep(Duration::from_millis(2));
    };

    assert_eq!(status, LoaderStatus::Completed);
    assert!(sequence.is_loaded());
    assert_eq!(sequence.update(), None);
}

#[test]
fn cancel_right_after_start_leaves_nothing_loaded() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 20);

    let mut sequence = threaded_sequence(Duration::from_millis(50));
    sequence.load_folder(temporary_directory.path()).unwrap();
    sequence.cancel_load();
    // Cancelling twice is harmless
    sequence.cancel_load();

    let deadline = Instant::now() + Duration::from_secs(10);
    while sequence.is_loading() {
        sequence.update();
        assert!(Instant::now() < deadline, "Cancelled load did not stop");
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(!sequence.is_loaded());
    assert_eq!(sequence.loader_status(), LoaderStatus::Cancelled);
    assert_eq!(sequence.total_frames(), 0);
    assert_eq!(sequence.decoded_count(), 0);
    assert!(!sequence.texture().is_allocated());
    assert!(matches!(sequence.set_frame(0), Err(SequenceError::NotLoaded)));
}

#[test]
fn unload_after_unobserved_completion_reports_completed() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 1);

    let mut sequence = threaded_sequence(Duration::ZERO);
    sequence.load_folder(temporary_directory.path()).unwrap();

    // Once the only frame is decoded the worker is past its last cancel check
    let deadline = Instant::now() + Duration::from_secs(10);
    while sequence.load_progress() < 1.0 {
        assert!(Instant::now() < deadline, "Background load did not finish");
        std::thread::sleep(Duration::from_millis(2));
    }

    sequence.unload_sequence();
    assert_eq!(sequence.loader_status(), LoaderStatus::Completed);
    assert!(!sequence.is_loaded());
    assert_eq!(sequence.total_frames(), 0);
}

#[test]
fn dimensions_skip_corrupt_first_slot() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(temporary_directory.path().join("frame_0000.png"), b"not a png").unwrap();
    RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]))
        .save(temporary_directory.path().join("frame_0001.png"))
        .expect("Failed to write test frame");
    RgbaImage::from_pixel(8, 8, Rgba([4, 5, 6, 255]))
        .save(temporary_directory.path().join("frame_0002.png"))
        .expect("Failed to write test frame");

    let mut sequence = threaded_sequence(Duration::ZERO);
    sequence.load_folder(temporary_directory.path()).unwrap();
    assert_eq!(sequence.wait_for_load(), LoadState::Loaded);
    assert_eq!(sequence.decoded_count(), 2);
    assert_eq!((sequence.width(), sequence.height()), (4, 2));

    sequence.set_frame(2).unwrap();
    assert_eq!((sequence.width(), sequence.height()), (4, 2));
    assert!(sequence.set_frame(0).is_err());
    assert_eq!((sequence.width(), sequence.height()), (4, 2));
}

#[test]
fn missing_folder_fails_in_background() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");

    let mut sequence = threaded_sequence(Duration::ZERO);
    sequence.load_folder(temporary_directory.path().join("nope")).unwrap();

    assert_eq!(sequence.wait_for_load(), LoadState::Unloaded);
    assert_eq!(sequence.loader_status(), LoaderStatus::Failed);
    assert_eq!(sequence.total_frames(), 0);
}

#[test]
fn config_locked_while_loading() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 10);

    let mut sequence = threaded_sequence(Duration::from_millis(20));
    sequence.load_folder(temporary_directory.path()).unwrap();

    assert!(matches!(
        sequence.set_extension("exr"),
        Err(SequenceError::ConfigLocked { .. })
    ));
    assert!(matches!(
        sequence.enable_threaded_load(false),
        Err(SequenceError::ConfigLocked { .. })
    ));
}

#[test]
fn reload_during_background_load_replaces_it() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 10);

    let mut sequence = threaded_sequence(Duration::from_millis(20));
    sequence.load_folder(temporary_directory.path()).unwrap();

    // Starting a new load cancels and joins the running one first
    sequence.load_folder(temporary_directory.path()).unwrap();
    sequence.cancel_load();
    assert_eq!(sequence.wait_for_load(), LoadState::Unloaded);
}

#[test]
fn drop_while_loading_joins_worker() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    write_frames(temporary_directory.path(), 20);

    let mut sequence = threaded_sequence(Duration::from_millis(50));
    sequence.load_folder(temporary_directory.path()).unwrap();

    let started = Instant::now();
    drop(sequence);
    assert!(started.elapsed() < Duration::from_secs(5));
}
