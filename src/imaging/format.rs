//! Source format detection and format families.
//!
//! Detection sniffs the file's leading bytes; extensions are never trusted
//! since uploads are routinely misnamed. ISO-BMFF files (`ftyp` box) are told
//! apart by brand: any `avif`/`avis` brand means AVIF, the HEVC brands mean
//! HEIF. Everything else is delegated to [`image::guess_format`].

use serde::Serialize;
use std::fmt;

const AVIF_BRANDS: [&[u8; 4]; 2] = [b"avif", b"avis"];
const HEIF_BRANDS: [&[u8; 4]; 8] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// Container format detected from file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
    Heif,
    Gif,
    Tiff,
    Bmp,
    Unknown,
}

/// Encoder category a source is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFamily {
    Png,
    Webp,
    Avif,
    Jpeg,
}

impl SourceFormat {
    /// Sniff the format from the first bytes of a file.
    pub fn detect(bytes: &[u8]) -> Self {
        if let Some(brands) = ftyp_brands(bytes) {
            if brands.iter().any(|b| AVIF_BRANDS.contains(b)) {
                return Self::Avif;
            }
            if brands.iter().any(|b| HEIF_BRANDS.contains(b)) {
                return Self::Heif;
            }
        }

        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => Self::Jpeg,
            Ok(image::ImageFormat::Png) => Self::Png,
            Ok(image::ImageFormat::WebP) => Self::Webp,
            Ok(image::ImageFormat::Avif) => Self::Avif,
            Ok(image::ImageFormat::Gif) => Self::Gif,
            Ok(image::ImageFormat::Tiff) => Self::Tiff,
            Ok(image::ImageFormat::Bmp) => Self::Bmp,
            _ => Self::Unknown,
        }
    }

    /// Unrecognized and legacy formats degrade to JPEG.
    pub fn family(self) -> FormatFamily {
        match self {
            Self::Png => FormatFamily::Png,
            Self::Webp => FormatFamily::Webp,
            Self::Avif | Self::Heif => FormatFamily::Avif,
            Self::Jpeg | Self::Gif | Self::Tiff | Self::Bmp | Self::Unknown => FormatFamily::Jpeg,
        }
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpeg",
        };
        f.write_str(name)
    }
}

/// Major + compatible brands of a leading `ftyp` box, if there is one.
fn ftyp_brands(bytes: &[u8]) -> Option<Vec<&[u8; 4]>> {
    if bytes.len() < 16 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    let size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = size.clamp(16, bytes.len());

    // major brand at 8..12, minor version at 12..16, compatible brands after
    let mut brands: Vec<&[u8; 4]> = Vec::new();
    brands.extend(<&[u8; 4]>::try_from(&bytes[8..12]).ok());
    brands.extend(
        bytes[16..end]
            .chunks_exact(4)
            .filter_map(|c| <&[u8; 4]>::try_from(c).ok()),
    );
    Some(brands)
}
