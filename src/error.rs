//! Error types for the corner-watermark-removal crate.

/// Errors that can occur while loading, saving, or encoding images.
///
/// The detection and inpainting stages never fail: an undetected watermark
/// is a passthrough result and a residual mask is a partially-filled
/// result, so only the I/O boundaries produce errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// The output image could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format is not supported (only lossless formats are).
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("jpeg".to_string());
        assert!(unsupported.to_string().contains("jpeg"));
    }

    #[test]
    fn decode_error_wraps_image_error() {
        let inner = image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::GenericFeature("bad".to_string()),
            ),
        );
        let err = Error::Decode(inner);
        assert!(err.to_string().contains("failed to decode"));
    }
}
