//! Enhancement of a raw capture into an extraction-ready payload.
//!
//! ```text
//! RawCapture ─▶ bound ─▶ grayscale+contrast ─▶ sharpen ─▶ encode ─▶ EnhancedImage
//! ```
//!
//! [`enhance`] never fails. If a backend step errors, the original capture is
//! re-encoded untouched; a degraded image is still worth sending. Only when
//! even that encode fails does the result carry an empty payload, which the
//! extraction client rejects before going to the network.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{apply_contrast, bounded_dimensions, contrast_factor, luma, sharpen_value};
use super::params::EnhanceParams;
use crate::capture::RawCapture;
use image::RgbaImage;
use rayon::prelude::*;
use tracing::{debug, error, warn};

/// Encoded, enhanced image ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EnhancedImage {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Run the full enhancement on a capture. Consumes the capture.
pub fn enhance(
    backend: &dyn ImageBackend,
    capture: RawCapture,
    params: &EnhanceParams,
) -> EnhancedImage {
    match try_enhance(backend, capture.image(), params) {
        Ok(enhanced) => enhanced,
        Err(e) => {
            warn!(error = %e, "enhancement failed, sending original capture");
            passthrough(backend, capture.into_image(), params)
        }
    }
}

fn try_enhance(
    backend: &dyn ImageBackend,
    original: &RgbaImage,
    params: &EnhanceParams,
) -> Result<EnhancedImage, BackendError> {
    let (width, height) = bounded_dimensions(original.dimensions(), params.max_dimension);
    let mut working = if (width, height) != original.dimensions() {
        debug!(
            from_w = original.width(),
            from_h = original.height(),
            width,
            height,
            "downscaling capture"
        );
        backend.resize(original, width, height)?
    } else {
        original.clone()
    };

    grayscale_contrast(&mut working, params.contrast);
    let sharpened = sharpen(&working);

    let bytes = backend.encode(&sharpened, params.quality)?;
    Ok(EnhancedImage {
        bytes,
        mime_type: backend.mime_type(),
        width,
        height,
    })
}

fn passthrough(backend: &dyn ImageBackend, image: RgbaImage, params: &EnhanceParams) -> EnhancedImage {
    let (width, height) = image.dimensions();
    let bytes = match backend.encode(&image, params.quality) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "could not encode original capture either");
            Vec::new()
        }
    };
    EnhancedImage {
        bytes,
        mime_type: backend.mime_type(),
        width,
        height,
    }
}

/// Replace every pixel's colour channels with its contrast-stretched luma.
///
/// Alpha is left as it was.
pub fn grayscale_contrast(image: &mut RgbaImage, contrast: f32) {
    let factor = contrast_factor(contrast);
    let pixels: &mut [u8] = image;
    pixels.par_chunks_mut(4).for_each(|px| {
        let v = apply_contrast(luma(px[0], px[1], px[2]), factor);
        px[0] = v;
        px[1] = v;
        px[2] = v;
    });
}

/// Apply the orthogonal 3×3 sharpen kernel to interior pixels.
///
/// Reads only from `input`, so every output pixel sees pre-sharpen
/// neighbours. Border rows and columns, and the alpha channel everywhere,
/// are copied unchanged. Expects a grayscale image: the kernel is evaluated
/// on the red channel and written to all three colour channels.
pub fn sharpen(input: &RgbaImage) -> RgbaImage {
    let mut output = input.clone();
    let (w, h) = (input.width() as usize, input.height() as usize);
    if w < 3 || h < 3 {
        return output;
    }

    let src: &[u8] = input;
    let stride = w * 4;
    let at = |x: usize, y: usize| src[y * stride + x * 4];

    let dst: &mut [u8] = &mut output;
    dst.par_chunks_mut(stride)
        .enumerate()
        .skip(1)
        .take(h - 2)
        .for_each(|(y, row)| {
            for x in 1..w - 1 {
                let v = sharpen_value(
                    at(x, y),
                    at(x, y - 1),
                    at(x, y + 1),
                    at(x - 1, y),
                    at(x + 1, y),
                );
                let i = x * 4;
                row[i] = v;
                row[i + 1] = v;
                row[i + 2] = v;
            }
        });
    output
}
