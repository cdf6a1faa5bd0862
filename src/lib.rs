//! Remove near-white bottom-right watermarks via diffusion inpainting.
//!
//! Photo tools often stamp a light, opaque logo near an image's
//! bottom-right corner. This crate scans that corner for near-white
//! opaque pixels, dilates the resulting mask over anti-aliased stamp
//! edges, gates the candidate on count/ratio thresholds to avoid false
//! positives, and repairs accepted regions by iteratively averaging each
//! masked pixel from its unmasked neighbors.
//!
//! # Quick Start
//!
//! ```no_run
//! use corner_watermark_removal::WatermarkEngine;
//!
//! let engine = WatermarkEngine::new();
//! let mut img = image::open("photo.jpg").unwrap().to_rgba8();
//! let result = engine.remove(&mut img);
//! if result.detected {
//!     img.save("cleaned.png").unwrap();
//! }
//! ```
//!
//! # Detection
//!
//! Detection is a pure scan with no side effects: the bottom-right region
//! is classified and gated, and images without a detected watermark pass
//! through untouched.
//!
//! ```no_run
//! use corner_watermark_removal::WatermarkEngine;
//!
//! let engine = WatermarkEngine::new();
//! let img = image::open("photo.jpg").unwrap().to_rgba8();
//! let result = engine.detect(&img);
//! println!(
//!     "Detected: {} ({} masked pixels, ratio {:.3})",
//!     result.detected, result.masked_pixels, result.area_ratio
//! );
//! ```

#![deny(missing_docs)]

pub mod detection;
mod engine;
pub mod error;
pub mod inpaint;
pub mod mask;
pub mod roi;

pub use detection::DetectionResult;
pub use engine::{
    decode_and_resize, default_output_path, encode_png, is_supported_image, resize_to_fit,
    save_image, ProcessOptions, ProcessResult, Thresholds, WatermarkEngine,
};
pub use error::{Error, Result};
pub use mask::Mask;
pub use roi::Rect;
