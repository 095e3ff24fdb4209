//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which plans the
//! normalization) and the [`backend`](super::backend) (which does the pixel
//! work), so a mock backend can verify the plan without encoding anything.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality, clamped to 40–90 (default 72).
//! - [`OutputEncoding`]: encoder plus its format-adjusted settings.
//! - [`NormalizeParams`]: everything one normalization needs (source,
//!   output, size bound, encoding).

use super::format::FormatFamily;
use std::path::PathBuf;

/// Default bound for both width and height, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1600;

/// Quality setting for lossy encoding, always within 40–90.
///
/// The floor keeps uploads from turning to mush; the ceiling stops
/// photographic content from ballooning for no visible gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub const MIN: u32 = 40;
    pub const MAX: u32 = 90;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(72)
    }
}

/// Chosen encoder with its final settings.
///
/// Built by [`OutputEncoding::for_family`], which applies the per-format
/// quality adjustment to an already clamped [`Quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// Palette-quantized PNG at maximum deflate effort.
    Png { quality: u32 },
    /// Lossy WebP; `method` is libwebp's 0–6 effort scale.
    Webp { quality: u32, method: u8 },
    /// AVIF via rav1e; `speed` is 1 (slowest) – 10 (fastest).
    Avif { quality: u32, speed: u8 },
    /// Baseline JPEG.
    Jpeg { quality: u32 },
}

impl OutputEncoding {
    const PNG_QUALITY_BOOST: u32 = 10;
    const PNG_QUALITY_CAP: u32 = 95;
    const AVIF_QUALITY_CUT: u32 = 10;
    const AVIF_QUALITY_FLOOR: u32 = 35;
    const WEBP_METHOD: u8 = 4;
    const AVIF_SPEED: u8 = 6;

    pub fn for_family(family: FormatFamily, quality: Quality) -> Self {
        let q = quality.value();
        match family {
            FormatFamily::Png => Self::Png {
                quality: (q + Self::PNG_QUALITY_BOOST).min(Self::PNG_QUALITY_CAP),
            },
            FormatFamily::Webp => Self::Webp {
                quality: q,
                method: Self::WEBP_METHOD,
            },
            FormatFamily::Avif => Self::Avif {
                quality: q
                    .saturating_sub(Self::AVIF_QUALITY_CUT)
                    .max(Self::AVIF_QUALITY_FLOOR),
                speed: Self::AVIF_SPEED,
            },
            FormatFamily::Jpeg => Self::Jpeg { quality: q },
        }
    }

    pub fn family(self) -> FormatFamily {
        match self {
            Self::Png { .. } => FormatFamily::Png,
            Self::Webp { .. } => FormatFamily::Webp,
            Self::Avif { .. } => FormatFamily::Avif,
            Self::Jpeg { .. } => FormatFamily::Jpeg,
        }
    }

    pub fn quality(self) -> u32 {
        match self {
            Self::Png { quality }
            | Self::Webp { quality, .. }
            | Self::Avif { quality, .. }
            | Self::Jpeg { quality } => quality,
        }
    }
}

/// Parameters for a single decode → orient → resize → encode → write run.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub encoding: OutputEncoding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(10).value(), 40);
        assert_eq!(Quality::new(40).value(), 40);
        assert_eq!(Quality::new(65).value(), 65);
        assert_eq!(Quality::new(90).value(), 90);
        assert_eq!(Quality::new(150).value(), 90);
    }

    #[test]
    fn quality_default_is_72() {
        assert_eq!(Quality::default().value(), 72);
    }

    #[test]
    fn png_gets_boosted_quality() {
        let enc = OutputEncoding::for_family(FormatFamily::Png, Quality::default());
        assert_eq!(enc, OutputEncoding::Png { quality: 82 });
    }

    #[test]
    fn png_boost_is_capped() {
        // 90 + 10 would be 100.
        let enc = OutputEncoding::for_family(FormatFamily::Png, Quality::new(100));
        assert_eq!(enc.quality(), 95);
    }

    #[test]
    fn webp_keeps_quality_with_mid_effort() {
        let enc = OutputEncoding::for_family(FormatFamily::Webp, Quality::new(80));
        assert_eq!(
            enc,
            OutputEncoding::Webp {
                quality: 80,
                method: 4
            }
        );
    }

    #[test]
    fn avif_gets_reduced_quality() {
        let enc = OutputEncoding::for_family(FormatFamily::Avif, Quality::default());
        assert_eq!(enc.quality(), 62);
    }

    #[test]
    fn avif_reduction_is_floored() {
        // Clamped to 40 first, then 40 - 10 = 30 hits the 35 floor.
        let enc = OutputEncoding::for_family(FormatFamily::Avif, Quality::new(0));
        assert_eq!(enc.quality(), 35);
    }

    #[test]
    fn jpeg_uses_quality_as_is() {
        let enc = OutputEncoding::for_family(FormatFamily::Jpeg, Quality::new(55));
        assert_eq!(enc, OutputEncoding::Jpeg { quality: 55 });
    }

    #[test]
    fn family_roundtrips_through_encoding() {
        for family in [
            FormatFamily::Png,
            FormatFamily::Webp,
            FormatFamily::Avif,
            FormatFamily::Jpeg,
        ] {
            assert_eq!(
                OutputEncoding::for_family(family, Quality::default()).family(),
                family
            );
        }
    }
}
