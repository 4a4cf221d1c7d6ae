//! Parameter types for image enhancement.
//!
//! These structs describe *what* the enhancement does, not *how*. The pixel
//! passes live in [`operations`](super::operations); decode/resize/encode is
//! delegated to the [`backend`](super::backend).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`EnhanceParams`]: Dimension bound, contrast level, and output quality.
//!   The values are fixed defaults; nothing in the pipeline tunes them.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the JPEG encoder takes.
    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Longest edge, in pixels, an enhanced image may have.
pub const MAX_DIMENSION: u32 = 2560;

/// Contrast level on a 0–100 scale.
pub const CONTRAST: f32 = 30.0;

/// Settings for one enhancement pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceParams {
    /// Neither output dimension exceeds this.
    pub max_dimension: u32,
    /// Contrast level fed to [`contrast_factor`](super::calculations::contrast_factor).
    pub contrast: f32,
    /// Encoding quality of the final payload.
    pub quality: Quality,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            contrast: CONTRAST,
            quality: Quality::default(),
        }
    }
}
