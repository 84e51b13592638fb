//! UI Widgets - egui components for the viewer
//!
//! Each widget is self-contained; the app feeds them sequence state each frame.

pub mod status;
pub mod viewport;
