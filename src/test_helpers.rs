//! Shared test utilities.
//!
//! Site builders for the geo tests and synthetic image writers for the
//! imaging and batch tests. Images are gradients so encoders and the palette
//! quantizer have real content to work with.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! let sites = vec![site("a", -8.27, 115.59), site_in("b", -8.34, 115.51, "Amed, Bali")];
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("reef.jpg"), 400, 300);
//! ```

use crate::geo::DiveSite;
use image::{DynamicImage, ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

// =========================================================================
// Dive sites
// =========================================================================

/// A site with no location or country, named after its id.
pub fn site(id: &str, latitude: f64, longitude: f64) -> DiveSite {
    DiveSite {
        id: id.to_string(),
        name: format!("Site {id}"),
        latitude,
        longitude,
        location: None,
        country: None,
    }
}

/// A site with a location string.
pub fn site_in(id: &str, latitude: f64, longitude: f64, location: &str) -> DiveSite {
    DiveSite {
        location: Some(location.to_string()),
        ..site(id, latitude, longitude)
    }
}

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a baseline JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(
            gradient(width, height).as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
}

/// Write an RGBA PNG of the given size with a horizontal alpha ramp.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 200, (255 - x % 128) as u8])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// AVIF bytes of the given size, encoded with rav1e.
pub fn encode_test_avif(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut out, 10, 85);
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    out
}
