//! Bottom-right region-of-interest selection.
//!
//! The watermark is always stamped near the bottom-right corner, so the
//! scan region is a square scaled from the image's smaller dimension plus
//! a padding ring, anchored at the corner and clamped to the buffer.

/// An axis-aligned rectangle in image coordinates.
///
/// Always lies within the bounds of the buffer it was computed for;
/// `width`/`height` may be zero for degenerate inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge, in pixels.
    pub x: u32,
    /// Top edge, in pixels.
    pub y: u32,
    /// Width, in pixels.
    pub width: u32,
    /// Height, in pixels.
    pub height: u32,
}

impl Rect {
    /// Number of pixels covered by the rectangle.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Compute the bottom-right scan region for a buffer of the given size.
///
/// `roi_size = floor(min(width, height) * roi_fraction)` and
/// `padding = floor(roi_size * padding_fraction)`. The region is anchored
/// at the bottom-right corner and clamped so it never exceeds the buffer;
/// for very small images it degenerates toward the whole image.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bottom_right_roi(
    buffer_width: u32,
    buffer_height: u32,
    roi_fraction: f32,
    padding_fraction: f32,
) -> Rect {
    let roi_size =
        (f64::from(buffer_width.min(buffer_height)) * f64::from(roi_fraction)).floor() as u32;
    let padding = (f64::from(roi_size) * f64::from(padding_fraction)).floor() as u32;
    let span = roi_size + padding;

    let x = buffer_width.saturating_sub(span);
    let y = buffer_height.saturating_sub(span);
    Rect {
        x,
        y,
        width: span.min(buffer_width - x),
        height: span.min(buffer_height - y),
    }
}
