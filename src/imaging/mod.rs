//! Image processing: pure Rust, in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize → JPEG** | CatmullRom (bicubic) + `JpegEncoder` at quality 95 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for inch → pixel math per mode (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{DPI, constrained_dimensions, requested_pixels, target_dimensions};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
