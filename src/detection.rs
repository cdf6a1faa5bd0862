//! Detection gate deciding whether a candidate mask is a real watermark.
//!
//! Two guards, both strict: the masked pixel count must exceed
//! `min_masked_count` (rejects noise-level speckle) and the masked share
//! of the scan region must stay below `max_area_ratio` (rejects images
//! whose bottom-right corner is simply a plain white background).

use crate::mask::Mask;
use crate::roi::Rect;

/// Outcome of scanning the bottom-right region for a watermark.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Candidate mask in ROI-local coordinates, after dilation.
    pub mask: Mask,
    /// Number of masked pixels.
    pub masked_pixels: usize,
    /// Masked pixels as a fraction of the ROI area (0 for an empty ROI).
    pub area_ratio: f32,
    /// The scanned region, in image coordinates.
    pub roi: Rect,
    /// Whether the mask passed both gate thresholds.
    pub detected: bool,
}

/// Apply the count/ratio gate to a candidate mask.
///
/// Declares `detected` iff `masked_pixels > min_masked_count` and
/// `area_ratio < max_area_ratio`, both strict. An empty ROI never
/// detects.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn evaluate(
    mask: Mask,
    roi: Rect,
    min_masked_count: usize,
    max_area_ratio: f32,
) -> DetectionResult {
    let masked_pixels = mask.count_set();
    let area = roi.area();
    let area_ratio = if area == 0 {
        0.0
    } else {
        masked_pixels as f32 / area as f32
    };
    let detected = masked_pixels > min_masked_count && area_ratio < max_area_ratio;

    log::debug!(
        "gate: {masked_pixels} masked pixels in {}x{} roi (ratio {area_ratio:.4}) -> detected={detected}",
        roi.width,
        roi.height,
    );

    DetectionResult {
        mask,
        masked_pixels,
        area_ratio,
        roi,
        detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mask_with_count(width: u32, height: u32, count: usize) -> Mask {
        let mut mask = Mask::new(width, height);
        let mut remaining = count;
        'outer: for y in 0..height {
            for x in 0..width {
                if remaining == 0 {
                    break 'outer;
                }
                mask.set(x, y);
                remaining -= 1;
            }
        }
        mask
    }

    fn roi(width: u32, height: u32) -> Rect {
        Rect { x: 0, y: 0, width, height }
    }

    #[rstest]
    // count at the floor is rejected regardless of ratio
    #[case::count_at_floor(80, 100, 100, false)]
    // 81 / 324 = 0.25 exactly: ratio guard is strict
    #[case::ratio_at_ceiling(81, 18, 18, false)]
    // 81 / 361 ~ 0.2244: both guards pass
    #[case::just_inside_both(81, 19, 19, true)]
    #[case::zero_count(0, 50, 50, false)]
    // everything masked: plain white corner
    #[case::saturated_region(400, 20, 20, false)]
    fn gate_boundaries(
        #[case] count: usize,
        #[case] w: u32,
        #[case] h: u32,
        #[case] expected: bool,
    ) {
        let result = evaluate(mask_with_count(w, h, count), roi(w, h), 80, 0.25);
        assert_eq!(result.detected, expected);
        assert_eq!(result.masked_pixels, count);
    }

    #[test]
    fn empty_roi_never_detects() {
        let result = evaluate(Mask::new(0, 0), roi(0, 0), 80, 0.25);
        assert!(!result.detected);
        assert_eq!(result.masked_pixels, 0);
        assert!(result.area_ratio.abs() < f32::EPSILON);
    }

    #[test]
    fn result_carries_roi_and_ratio() {
        let result = evaluate(mask_with_count(30, 30, 200), roi(30, 30), 80, 0.25);
        assert_eq!(result.roi, roi(30, 30));
        let expected = 200.0 / 900.0;
        assert!((result.area_ratio - expected).abs() < 1e-6);
        assert!(result.detected);
    }
}
