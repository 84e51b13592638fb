//! Viewport - shows the sequence texture with fit/100%/manual zoom and scrubbing

pub mod texture;
pub mod viewport;

pub use texture::EguiTexture;
pub use viewport::{ViewportMode, ViewportState};
