//! Pure Rust image backend (libwebp aside, which `webp` builds from source).
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Detect | leading-byte sniff, see [`SourceFormat::detect`] |
//! | Decode (JPEG, PNG, WebP, GIF, TIFF, BMP) | `image` crate decoders |
//! | Decode (AVIF) | `avif-parse` + `rav1d`, see [`avif`](super::avif) |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → PNG | exact or `color_quant::NeuQuant` palette + `png` indexed writer, `Compression::Best` |
//! | Encode → WebP | `webp` (libwebp), lossy, method 4 |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | Encode → JPEG | `jpeg-encoder`, progressive with optimized Huffman tables |
//!
//! Orientation is only corrected for formats decoded through `image`. AVIF
//! `irot`/`imir` transforms are not exposed by `avif-parse`, so AVIF sources
//! keep their stored orientation.
//!
//! Encoding happens in memory. An existing output file is replaced by
//! renaming a fully written temporary file over it, so neither a failed
//! encode nor a failed write leaves a truncated original behind.

use super::avif::{avif_dimensions, decode_avif};
use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
use super::calculations::fit_within;
use super::format::SourceFormat;
use super::params::{NormalizeParams, OutputEncoding};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;

/// NeuQuant sampling factor: 1 examines every pixel (slowest, best palette).
const PALETTE_SAMPLE_FACTOR: i32 = 1;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, BackendError> {
    std::fs::read(path).map_err(|source| BackendError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn header_dimensions(bytes: &[u8], format: SourceFormat) -> Result<Dimensions, BackendError> {
    match format {
        SourceFormat::Avif | SourceFormat::Heif => avif_dimensions(bytes),
        _ => {
            let (width, height) = ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()
                .map_err(|e| BackendError::Decode(e.to_string()))?
                .into_dimensions()
                .map_err(|e| BackendError::Decode(e.to_string()))?;
            Ok(Dimensions { width, height })
        }
    }
}

/// Decode to pixels with EXIF orientation applied.
fn decode_oriented(bytes: &[u8], format: SourceFormat) -> Result<DynamicImage, BackendError> {
    match format {
        SourceFormat::Avif => return decode_avif(bytes),
        SourceFormat::Heif => {
            return Err(BackendError::Decode(
                "HEIF (HEVC) payloads have no available decoder".into(),
            ));
        }
        _ => {}
    }

    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(e.to_string()))?
        .into_decoder()
        .map_err(|e| BackendError::Decode(e.to_string()))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

fn encode(img: &DynamicImage, encoding: OutputEncoding) -> Result<Vec<u8>, BackendError> {
    match encoding {
        OutputEncoding::Png { quality } => encode_palette_png(img, quality),
        OutputEncoding::Webp { quality, method } => encode_webp(img, quality, method),
        OutputEncoding::Avif { quality, speed } => encode_avif(img, quality, speed),
        OutputEncoding::Jpeg { quality } => encode_jpeg(img, quality),
    }
}

/// Palette size for a PNG quality: 256 colours at 100, proportionally fewer
/// below, never under 16.
fn palette_colors(quality: u32) -> usize {
    ((quality as usize * 256) / 100).clamp(16, 256)
}

/// Palette entries (RGBA) plus one index per pixel.
type Palette = (Vec<[u8; 4]>, Vec<u8>);

/// Exact palette when the image has at most `max_colors` distinct colours.
fn exact_palette(pixels: &[u8], max_colors: usize) -> Option<Palette> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut palette: Vec<[u8; 4]> = Vec::new();
    let mut indices = Vec::with_capacity(pixels.len() / 4);
    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&color) {
            Some(&index) => index,
            None => {
                if palette.len() == max_colors {
                    return None;
                }
                let index = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, index);
                index
            }
        };
        indices.push(index);
    }
    Some((palette, indices))
}

/// NeuQuant palette, keeping only the entries some pixel maps to.
fn quantized_palette(pixels: &[u8], max_colors: usize) -> Palette {
    let quant = color_quant::NeuQuant::new(PALETTE_SAMPLE_FACTOR, max_colors, pixels);
    let trained = quant.color_map_rgba();

    let mut remap: [Option<u8>; 256] = [None; 256];
    let mut palette: Vec<[u8; 4]> = Vec::new();
    let indices = pixels
        .chunks_exact(4)
        .map(|px| {
            let slot = quant.index_of(px);
            *remap[slot].get_or_insert_with(|| {
                let c = &trained[slot * 4..slot * 4 + 4];
                palette.push([c[0], c[1], c[2], c[3]]);
                (palette.len() - 1) as u8
            })
        })
        .collect();
    (palette, indices)
}

/// Smallest PNG bit depth that can address `entries` palette slots.
fn palette_bit_depth(entries: usize) -> (png::BitDepth, usize) {
    match entries {
        0..=2 => (png::BitDepth::One, 1),
        3..=4 => (png::BitDepth::Two, 2),
        5..=16 => (png::BitDepth::Four, 4),
        _ => (png::BitDepth::Eight, 8),
    }
}

/// Pack one index per pixel into `bits`-wide samples, rows padded to a byte.
fn pack_indices(indices: &[u8], width: usize, bits: usize) -> Vec<u8> {
    if bits == 8 {
        return indices.to_vec();
    }
    let per_byte = 8 / bits;
    let mut packed = Vec::with_capacity(indices.len() / per_byte + 1);
    for row in indices.chunks(width.max(1)) {
        for group in row.chunks(per_byte) {
            let byte = group
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &index)| acc | index << (8 - bits * (i + 1)));
            packed.push(byte);
        }
    }
    packed
}

fn encode_palette_png(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let has_alpha = rgba.pixels().any(|p| p[3] != u8::MAX);

    let max_colors = palette_colors(quality);
    let (palette, indices) = exact_palette(rgba.as_raw(), max_colors)
        .unwrap_or_else(|| quantized_palette(rgba.as_raw(), max_colors));
    let (depth, bits) = palette_bit_depth(palette.len());

    let png_err = |e: png::EncodingError| BackendError::Encode(format!("PNG: {e}"));
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(depth);
        encoder.set_palette(
            palette
                .iter()
                .flat_map(|c| [c[0], c[1], c[2]])
                .collect::<Vec<u8>>(),
        );
        if has_alpha {
            encoder.set_trns(palette.iter().map(|c| c[3]).collect::<Vec<u8>>());
        }
        encoder.set_compression(png::Compression::Best);
        let mut writer = encoder.write_header().map_err(png_err)?;
        writer
            .write_image_data(&pack_indices(&indices, width as usize, bits))
            .map_err(png_err)?;
        writer.finish().map_err(png_err)?;
    }
    Ok(out)
}

fn encode_webp(img: &DynamicImage, quality: u32, method: u8) -> Result<Vec<u8>, BackendError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());

    let mut config = webp::WebPConfig::new()
        .map_err(|_| BackendError::Encode("WebP: invalid default config".into()))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = method as i32;

    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|e| BackendError::Encode(format!("WebP: {e:?}")))?;
    Ok(encoded.to_vec())
}

fn encode_avif(img: &DynamicImage, quality: u32, speed: u8) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut out, speed, quality as u8);
    let pixels = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    pixels
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("AVIF: {e}")))?;
    Ok(out)
}

fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let too_large = || {
        BackendError::Encode(format!(
            "JPEG: {}x{} exceeds the format's 65535 px limit",
            rgb.width(),
            rgb.height()
        ))
    };
    let width = u16::try_from(rgb.width()).map_err(|_| too_large())?;
    let height = u16::try_from(rgb.height()).map_err(|_| too_large())?;

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality as u8);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
    Ok(out)
}

/// Write `bytes` to `path`. An existing file is replaced atomically and keeps
/// its permissions.
fn write_output(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let write_err = |source: std::io::Error| BackendError::Write {
        path: path.to_path_buf(),
        source,
    };
    let Ok(existing) = std::fs::metadata(path) else {
        return std::fs::write(path, bytes).map_err(write_err);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file()
        .set_permissions(existing.permissions())
        .map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn inspect(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let bytes = read_file(path)?;
        let format = SourceFormat::detect(&bytes);
        let dimensions = match header_dimensions(&bytes, format) {
            Ok(dims) => Some(dims),
            Err(e) => {
                log::warn!("{}: unreadable header ({e}), continuing", path.display());
                None
            }
        };
        Ok(ImageInfo {
            format,
            dimensions,
            byte_size: bytes.len() as u64,
        })
    }

    fn normalize(&self, params: &NormalizeParams) -> Result<Dimensions, BackendError> {
        let bytes = read_file(&params.source)?;
        let format = SourceFormat::detect(&bytes);
        let img = decode_oriented(&bytes, format)?;
        drop(bytes);

        let decoded = Dimensions {
            width: img.width(),
            height: img.height(),
        };
        let target = fit_within(decoded, params.max_width, params.max_height);
        let img = if target == decoded {
            img
        } else {
            log::debug!(
                "{}: {}x{} → {}x{}",
                params.source.display(),
                decoded.width,
                decoded.height,
                target.width,
                target.height
            );
            img.resize_exact(target.width, target.height, FilterType::Lanczos3)
        };

        let encoded = encode(&img, params.encoding)?;
        write_output(&params.output, &encoded)?;

        Ok(decoded)
    }
}
