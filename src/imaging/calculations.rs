//! Pure calculation functions for enhancement.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale dimensions down so neither edge exceeds `max_dimension`.
///
/// The longer edge lands exactly on the bound and the other edge follows the
/// same ratio, rounded and never below 1. Dimensions already inside the bound
/// are returned unchanged.
///
/// # Examples
/// ```
/// # use cardscan::imaging::bounded_dimensions;
/// assert_eq!(bounded_dimensions((5120, 2880), 2560), (2560, 1440));
/// assert_eq!(bounded_dimensions((800, 600), 2560), (800, 600));
/// ```
pub fn bounded_dimensions(source: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= max_dimension && h <= max_dimension {
        return (w, h);
    }

    let ratio = max_dimension as f64 / w.max(h) as f64;
    if w >= h {
        let h = ((h as f64 * ratio).round() as u32).max(1);
        (max_dimension, h)
    } else {
        let w = ((w as f64 * ratio).round() as u32).max(1);
        (w, max_dimension)
    }
}

/// Perceived brightness of an RGB triple (Rec. 601 weights).
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Contrast multiplier for a contrast level on the 0–100 scale.
///
/// `259·(c+255) / (255·(259-c))`, which is 1.0 at `c = 0`.
pub fn contrast_factor(contrast: f32) -> f32 {
    (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast))
}

/// Stretch a luma value around mid-gray and clamp into a channel value.
pub fn apply_contrast(luma: f32, factor: f32) -> u8 {
    (factor * (luma - 128.0) + 128.0).round().clamp(0.0, 255.0) as u8
}

/// 3×3 sharpen with centre weight 5 and −1 on the orthogonal neighbours.
///
/// The result saturates at the channel range.
pub fn sharpen_value(center: u8, up: u8, down: u8, left: u8, right: u8) -> u8 {
    let v = 5 * center as i32 - up as i32 - down as i32 - left as i32 - right as i32;
    v.clamp(0, 255) as u8
}
