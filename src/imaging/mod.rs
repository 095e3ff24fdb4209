//! Image normalization: decode, orient, bound, re-encode.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Inspect** | byte sniffing + `image` / `avif-parse` headers |
//! | **Decode** | `image` decoders, `rav1d` for AVIF |
//! | **Orient** | EXIF orientation via `ImageDecoder::orientation` (not AVIF `irot`/`imir`) |
//! | **Resize** | Lanczos3, never upscales |
//! | **Encode** | palette PNG, lossy WebP, AVIF (rav1e), progressive JPEG |
//!
//! The module is split into:
//! - **Format**: content sniffing and the four output families
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing one normalization
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`optimize_image`], combining calculations + backend

mod avif;
pub mod backend;
mod calculations;
mod format;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
pub use calculations::{exceeds_bounds, fit_within};
pub use format::{FormatFamily, SourceFormat};
pub use operations::{
    ImageProcessOptions, ImageProcessResult, optimize_image, optimize_image_with_backend,
    plan_normalize,
};
pub use params::{DEFAULT_MAX_DIMENSION, NormalizeParams, OutputEncoding, Quality};
pub use rust_backend::RustBackend;

/// Lowercase extensions the batch scanner treats as images.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "avif", "heic", "heif", "gif", "tif", "tiff", "bmp",
];

/// Whether `path` has one of [`SUPPORTED_EXTENSIONS`] (case-insensitive).
pub fn is_supported_image(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn supported_extensions_ignore_case() {
        assert!(is_supported_image(Path::new("a/reef.JPG")));
        assert!(is_supported_image(Path::new("photo.heic")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no-extension")));
    }
}
