//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. The resize engine
//! in [`process`](crate::process) decides the target box; the
//! [`backend`](super::backend) does the pixel work. Keeping them apart lets
//! tests swap in a recording backend.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`ResizeParams`]: source bytes, exact target box, quality.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Parameters for resampling one source into an exact pixel box.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams<'a> {
    /// Encoded source image, any supported input format.
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
