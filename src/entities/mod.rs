//! Entities module - frame data, decoder and collaborator interfaces
//!
//! Everything here is independent of the playback engine in `core`:
//! - `frame`: decoded pixel buffers
//! - `loader`: default image decoder
//! - `traits`: lister/decoder/uploader seams
//! - `error`: sequence error taxonomy

pub mod error;
pub mod frame;
pub mod loader;
pub mod traits;

pub use error::{ErrorKind, SequenceError};
pub use frame::{Frame, FrameError, PixelBuffer, PixelFormat};
pub use loader::Loader;
pub use traits::{FileLister, FilterMode, ImageDecoder, TextureUploader};
