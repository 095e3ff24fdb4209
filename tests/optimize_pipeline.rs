//! End-to-end normalization through the production backend on synthetic
//! images written to a temp directory.

use image::{ImageEncoder, RgbImage, RgbaImage};
use reefmap::imaging::{
    BackendError, FormatFamily, ImageProcessOptions, SourceFormat, optimize_image,
};
use std::path::Path;
use tempfile::TempDir;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    })
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90)
        .write_image(
            gradient(width, height).as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    out
}

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 40, 255])
    })
    .save_with_format(path, image::ImageFormat::Png)
    .unwrap();
}

/// Insert an EXIF APP1 segment carrying only an Orientation tag right after SOI.
fn with_exif_orientation(jpeg: Vec<u8>, orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08"); // big-endian header, IFD at 8
    tiff.extend_from_slice(&1u16.to_be_bytes()); // one entry
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes()); // count
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    app1.extend_from_slice(b"Exif\x00\x00");
    app1.extend_from_slice(&tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn large_jpeg_is_bounded_and_stays_jpeg() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wreck.jpg");
    std::fs::write(&path, jpeg_bytes(4000, 3000)).unwrap();

    let result = optimize_image(&path, &ImageProcessOptions::default()).unwrap();

    assert!(result.was_resized);
    assert!(result.width <= 1600 && result.height <= 1600);
    assert_eq!((result.width, result.height), (1600, 1200));
    assert_eq!(result.format, FormatFamily::Jpeg);
    assert_eq!(result.output_path, path);
    assert_eq!(result.byte_size, std::fs::metadata(&path).unwrap().len());
}

#[test]
fn small_png_is_not_resized_and_stays_png() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("chart.png");
    write_png(&path, 800, 600);

    let result = optimize_image(&path, &ImageProcessOptions::default()).unwrap();

    assert!(!result.was_resized);
    assert_eq!((result.width, result.height), (800, 600));
    assert_eq!(result.format, FormatFamily::Png);
}

#[test]
fn explicit_output_leaves_input_untouched() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in.jpg");
    let output = tmp.path().join("out.jpg");
    let original = jpeg_bytes(300, 200);
    std::fs::write(&input, &original).unwrap();

    let options = ImageProcessOptions {
        max_width: Some(150),
        output_path: Some(output.clone()),
        ..Default::default()
    };
    let result = optimize_image(&input, &options).unwrap();

    assert_eq!(result.output_path, output);
    assert_eq!((result.width, result.height), (150, 100));
    assert_eq!(std::fs::read(&input).unwrap(), original);
}

#[test]
fn exif_rotation_is_applied_before_bounding() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("portrait.jpg");
    // Stored landscape, tagged "rotate 90° clockwise" (6).
    std::fs::write(&path, with_exif_orientation(jpeg_bytes(400, 200), 6)).unwrap();

    let options = ImageProcessOptions {
        max_width: Some(100),
        max_height: Some(100),
        ..Default::default()
    };
    let result = optimize_image(&path, &options).unwrap();

    assert!(result.was_resized);
    assert_eq!((result.width, result.height), (50, 100));
}

#[test]
fn misnamed_file_is_encoded_by_content() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("actually-png.jpg");
    write_png(&path, 64, 64);

    let result = optimize_image(&path, &ImageProcessOptions::default()).unwrap();
    assert_eq!(result.format, FormatFamily::Png);
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(SourceFormat::detect(&bytes), SourceFormat::Png);
}

#[test]
fn garbage_input_is_decode_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.jpg");
    std::fs::write(&path, b"these are field notes, not a photo").unwrap();

    let result = optimize_image(&path, &ImageProcessOptions::default());
    assert!(matches!(result, Err(BackendError::Decode(_))));
}

#[test]
fn missing_input_is_read_error() {
    let tmp = TempDir::new().unwrap();
    let result = optimize_image(&tmp.path().join("gone.jpg"), &ImageProcessOptions::default());
    assert!(matches!(result, Err(BackendError::Read { .. })));
}
