//! Core watermark removal engine.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageEncoder, ImageFormat, RgbaImage};

use crate::detection::{self, DetectionResult};
use crate::error::{Error, Result};
use crate::inpaint;
use crate::mask::Mask;
use crate::roi::{self, Rect};

/// Detection and inpainting thresholds, immutable per run.
///
/// Defaults follow the deterministic diffusion-fill parameter set:
/// an 18% ROI with 8% padding, 235/200 white/alpha floors, two dilation
/// generations, and an 80-pixel / 25% detection gate.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Maximum image dimension after loading; larger images are downscaled.
    pub max_dimension: u32,
    /// ROI side as a fraction of the smaller image dimension.
    pub roi_fraction: f32,
    /// Extra padding as a fraction of the ROI side.
    pub roi_padding_fraction: f32,
    /// Color channel floor for the near-white test (exclusive).
    pub white_floor: u8,
    /// Alpha floor for the opacity test (exclusive).
    pub alpha_floor: u8,
    /// Number of 8-connected dilation generations applied to the mask.
    pub dilation_iterations: u32,
    /// Minimum masked pixel count for detection (exclusive).
    pub min_masked_count: usize,
    /// Maximum masked share of the ROI for detection (exclusive).
    pub max_area_ratio: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            roi_fraction: 0.18,
            roi_padding_fraction: 0.08,
            white_floor: 235,
            alpha_floor: 200,
            dilation_iterations: 2,
            min_masked_count: 80,
            max_area_ratio: 0.25,
        }
    }
}

/// Options controlling file processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Inpaint the candidate mask even when the detection gate rejects it.
    pub force: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (no watermark detected).
    pub skipped: bool,
    /// Number of masked pixels found in the scan region.
    pub masked_pixels: usize,
    /// Human-readable status message.
    pub message: String,
}

/// The watermark engine holding the run's thresholds.
///
/// Create once and reuse for multiple images; every invocation allocates
/// its own buffers, so one engine can serve parallel workers.
#[derive(Debug, Clone, Default)]
pub struct WatermarkEngine {
    thresholds: Thresholds,
}

impl WatermarkEngine {
    /// Create an engine with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit thresholds.
    #[must_use]
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds this engine was configured with.
    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// The bottom-right scan region for an image of the given size.
    #[must_use]
    pub fn roi_for(&self, width: u32, height: u32) -> Rect {
        roi::bottom_right_roi(
            width,
            height,
            self.thresholds.roi_fraction,
            self.thresholds.roi_padding_fraction,
        )
    }

    /// Scan the bottom-right region for a watermark candidate.
    ///
    /// Builds the near-white mask, dilates it, and applies the
    /// count/ratio gate. Does not modify the image.
    #[must_use]
    pub fn detect(&self, image: &RgbaImage) -> DetectionResult {
        let roi = self.roi_for(image.width(), image.height());
        let region = imageops::crop_imm(image, roi.x, roi.y, roi.width, roi.height).to_image();

        let mut mask = Mask::white_pixels(
            &region,
            self.thresholds.white_floor,
            self.thresholds.alpha_floor,
        );
        mask.dilate(self.thresholds.dilation_iterations);

        detection::evaluate(
            mask,
            roi,
            self.thresholds.min_masked_count,
            self.thresholds.max_area_ratio,
        )
    }

    /// Detect and, if the gate accepts, inpaint the watermark in place.
    ///
    /// Never fails: when the gate rejects, the image passes through
    /// unmodified and the returned result has `detected == false`.
    pub fn remove(&self, image: &mut RgbaImage) -> DetectionResult {
        let result = self.detect(image);
        if result.detected {
            self.inpaint_in_place(image, &result);
        }
        result
    }

    /// Inpaint the candidate mask into `image`, regardless of the gate.
    fn inpaint_in_place(&self, image: &mut RgbaImage, detection: &DetectionResult) {
        let roi = detection.roi;
        if roi.is_empty() || detection.masked_pixels == 0 {
            return;
        }

        let mut region =
            imageops::crop_imm(&*image, roi.x, roi.y, roi.width, roi.height).to_image();
        let mut work = detection.mask.clone();
        let residual = inpaint::diffuse_fill(&mut region, &mut work);
        if residual > 0 {
            log::debug!("inpaint left {residual} masked pixels unfilled");
        }
        imageops::replace(image, &region, i64::from(roi.x), i64::from(roi.y));
    }

    /// Process a single image file: load, resize, detect, inpaint, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            skipped: false,
            masked_pixels: 0,
            message: String::new(),
        };

        let bytes = match std::fs::read(input) {
            Ok(b) => b,
            Err(e) => {
                result.message = format!("Failed to read: {e}");
                return result;
            }
        };

        let mut image = match decode_and_resize(&bytes, self.thresholds.max_dimension) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let detection = self.detect(&image);
        result.masked_pixels = detection.masked_pixels;

        if detection.detected || opts.force {
            self.inpaint_in_place(&mut image, &detection);
        } else {
            result.skipped = true;
            result.success = true;
            result.message = format!(
                "No watermark detected ({} masked pixels, ratio {:.3})",
                detection.masked_pixels, detection.area_ratio,
            );
            return result;
        }

        if let Some(parent) = output.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&image, output) {
            Ok(()) => {
                result.success = true;
                result.message = "Watermark removed".to_string();
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image found.
    ///
    /// # Panics
    ///
    /// Panics if any directory entry has no filename (should not happen for
    /// regular files).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<_> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .filter(|e| is_supported_image(e.path().as_path()))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    success: false,
                    skipped: false,
                    masked_pixels: 0,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult {
                    path: output_dir.to_path_buf(),
                    success: false,
                    skipped: false,
                    masked_pixels: 0,
                    message: format!("Failed to create output directory: {e}"),
                }];
            }
        }

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|entry| self.process_entry(entry, output_dir, opts))
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries
                .iter()
                .map(|entry| self.process_entry(entry, output_dir, opts))
                .collect()
        }
    }

    fn process_entry(
        &self,
        entry: &std::fs::DirEntry,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let input_path = entry.path();
        let filename = input_path.file_name().unwrap();
        let output_path = output_dir.join(filename).with_extension("png");
        self.process_file(&input_path, &output_path, opts)
    }
}

/// Decode encoded image bytes and constrain to a maximum dimension.
///
/// When either dimension exceeds `max_dimension`, the image is downscaled
/// so the larger dimension equals `max_dimension` and the other is
/// `round(other * max_dimension / larger)`, preserving aspect ratio.
/// Images already within the limit are returned at their original size;
/// no upscaling occurs.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not a decodable image.
pub fn decode_and_resize(bytes: &[u8], max_dimension: u32) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)
        .map_err(Error::Decode)?
        .to_rgba8();
    Ok(resize_to_fit(image, max_dimension))
}

/// Downscale `image` so its larger dimension equals `max_dimension`.
///
/// Returns the image unchanged when both dimensions are already within
/// the limit. Resampling is bilinear; the output dimensions follow the
/// rounding rule exactly.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resize_to_fit(image: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return image;
    }

    let scaled = |dim: u32, larger: u32| -> u32 {
        let exact = f64::from(dim) * f64::from(max_dimension) / f64::from(larger);
        (exact.round() as u32).max(1)
    };

    let (new_w, new_h) = if width > height {
        (max_dimension, scaled(height, width))
    } else {
        (scaled(width, height), max_dimension)
    };

    imageops::resize(&image, new_w, new_h, FilterType::Triangle)
}

/// Encode an image to PNG bytes losslessly.
///
/// # Errors
///
/// Returns [`Error::Encode`] if serialization fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut out);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(Error::Encode)?;
    Ok(out)
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an image to a lossless output format.
///
/// PNG, BMP, and WebP (lossless in this encoder) are accepted; lossy
/// targets are rejected so repaired pixels survive serialization intact.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for lossy or unknown formats, and
/// [`Error::Encode`] or [`Error::Io`] if writing fails.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.save(path).map_err(Error::Encode)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Output is always PNG: `"photo.jpg"` becomes `"photo_cleaned.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_cleaned.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn resize_law_landscape() {
        let img = RgbaImage::new(300, 100);
        let out = resize_to_fit(img, 150);
        assert_eq!(out.dimensions(), (150, 50));
    }

    #[test]
    fn resize_law_portrait() {
        let img = RgbaImage::new(100, 300);
        let out = resize_to_fit(img, 150);
        assert_eq!(out.dimensions(), (50, 150));
    }

    #[test]
    fn resize_rounds_to_nearest() {
        // 100 * 100 / 333 = 30.03 -> 30
        let img = RgbaImage::new(333, 100);
        let out = resize_to_fit(img, 100);
        assert_eq!(out.dimensions(), (100, 30));

        // 150 * 100 / 201 = 74.6 -> 75
        let img = RgbaImage::new(201, 150);
        let out = resize_to_fit(img, 100);
        assert_eq!(out.dimensions(), (100, 75));
    }

    #[test]
    fn resize_is_noop_within_limit() {
        let img = RgbaImage::from_pixel(640, 480, Rgba([1, 2, 3, 4]));
        let out = resize_to_fit(img.clone(), 2048);
        assert_eq!(out.dimensions(), (640, 480));
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn resize_never_upscales_square_at_limit() {
        let img = RgbaImage::new(2048, 2048);
        let out = resize_to_fit(img, 2048);
        assert_eq!(out.dimensions(), (2048, 2048));
    }

    #[test]
    fn resize_extreme_aspect_keeps_min_dimension_of_one() {
        let img = RgbaImage::new(10_000, 2);
        let out = resize_to_fit(img, 100);
        assert_eq!(out.dimensions(), (100, 1));
    }

    #[test]
    fn decode_and_resize_round_trips_png() {
        let img = RgbaImage::from_pixel(40, 30, Rgba([12, 34, 56, 255]));
        let bytes = encode_png(&img).unwrap();
        let decoded = decode_and_resize(&bytes, 2048).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn decode_and_resize_applies_dimension_cap() {
        let img = RgbaImage::new(400, 200);
        let bytes = encode_png(&img).unwrap();
        let decoded = decode_and_resize(&bytes, 100).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        let err = decode_and_resize(b"not an image", 2048).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn default_output_path_targets_png() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_cleaned.png"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "image_cleaned.png"
        );
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn save_image_rejects_lossy_target() {
        let img = RgbaImage::new(4, 4);
        let err = save_image(&img, Path::new("/tmp/out.jpg")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn roi_for_uses_configured_fractions() {
        let engine = WatermarkEngine::new();
        let roi = engine.roi_for(1000, 800);
        // floor(800 * 0.18) = 144, padding floor(144 * 0.08) = 11
        assert_eq!((roi.width, roi.height), (155, 155));
        assert_eq!((roi.x, roi.y), (845, 645));
    }

    #[test]
    fn detect_on_blank_image_finds_nothing() {
        let engine = WatermarkEngine::new();
        let img = RgbaImage::from_pixel(200, 200, Rgba([10, 20, 30, 255]));
        let result = engine.detect(&img);
        assert!(!result.detected);
        assert_eq!(result.masked_pixels, 0);
    }

    #[test]
    fn remove_passthrough_keeps_buffer_identical() {
        let engine = WatermarkEngine::new();
        let mut img = RgbaImage::from_pixel(200, 200, Rgba([10, 20, 30, 255]));
        let before = img.clone();
        let result = engine.remove(&mut img);
        assert!(!result.detected);
        assert_eq!(img.as_raw(), before.as_raw());
    }

    #[test]
    fn detect_mask_dimensions_match_roi() {
        let engine = WatermarkEngine::new();
        let img = RgbaImage::from_pixel(640, 480, Rgba([200, 200, 200, 255]));
        let result = engine.detect(&img);
        assert_eq!(result.mask.width(), result.roi.width);
        assert_eq!(result.mask.height(), result.roi.height);
    }

    #[test]
    fn detect_rejects_all_white_corner() {
        // plain white image: the whole ROI masks, ratio 1.0 trips the gate
        let engine = WatermarkEngine::new();
        let img = RgbaImage::from_pixel(400, 400, Rgba([255, 255, 255, 255]));
        let result = engine.detect(&img);
        assert!(result.masked_pixels > 0);
        assert!(!result.detected);
    }
}
