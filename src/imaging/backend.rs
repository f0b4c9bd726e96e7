//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the resize engine
//! needs: identify (read pixel dimensions without a full decode) and resize
//! (decode, resample into an exact box, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Everything works on
//! in-memory blobs; nothing touches the filesystem.

use super::params::ResizeParams;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to load image: {0}")]
    Decode(String),
    #[error("Failed to create resized image: {0}")]
    Encode(String),
}

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} × {} px", self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve a rayon pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Resample into the exact box and return the encoded output.
    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError>;
}
