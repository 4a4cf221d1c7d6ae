//! Image enhancement in pure Rust, no system libraries.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Bound** | [`bounded_dimensions`] + Lanczos3 resize |
//! | **Grayscale + contrast** | [`grayscale_contrast`] (rayon, per pixel) |
//! | **Sharpen** | [`sharpen`] (rayon, per row) |
//! | **Encode** | JPEG at quality 90 |
//!
//! The module is split into:
//! - **Calculations**: Pure per-value math (unit testable)
//! - **Parameters**: Fixed enhancement settings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`enhance`] and the pixel passes

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::bounded_dimensions;
pub use operations::{EnhancedImage, enhance, grayscale_contrast, sharpen};
pub use params::{EnhanceParams, MAX_DIMENSION, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
