//! High-level image operations.
//!
//! These functions combine calculations with backend execution: inspect the
//! source, plan a [`NormalizeParams`], hand it to the backend, then inspect
//! what was written.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{exceeds_bounds, fit_within};
use super::format::FormatFamily;
use super::params::{DEFAULT_MAX_DIMENSION, NormalizeParams, OutputEncoding, Quality};
use super::rust_backend::RustBackend;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Caller overrides for a normalization. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageProcessOptions {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub quality: Option<u32>,
    /// Where to write. `None` overwrites the input.
    pub output_path: Option<PathBuf>,
}

impl ImageProcessOptions {
    pub fn max_width(&self) -> u32 {
        self.max_width.unwrap_or(DEFAULT_MAX_DIMENSION)
    }

    pub fn max_height(&self) -> u32 {
        self.max_height.unwrap_or(DEFAULT_MAX_DIMENSION)
    }

    pub fn quality(&self) -> Quality {
        self.quality.map(Quality::new).unwrap_or_default()
    }
}

/// What was written, measured from the output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageProcessResult {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pub format: FormatFamily,
    pub was_resized: bool,
}

/// Plan a normalization without executing it.
///
/// The encoding follows the *detected* family of the source, never its
/// extension.
pub fn plan_normalize(
    source: &Path,
    family: FormatFamily,
    options: &ImageProcessOptions,
) -> NormalizeParams {
    NormalizeParams {
        source: source.to_path_buf(),
        output: options
            .output_path
            .clone()
            .unwrap_or_else(|| source.to_path_buf()),
        max_width: options.max_width(),
        max_height: options.max_height(),
        encoding: OutputEncoding::for_family(family, options.quality()),
    }
}

/// Normalize one image with the production backend.
pub fn optimize_image(input: &Path, options: &ImageProcessOptions) -> Result<ImageProcessResult> {
    optimize_image_with_backend(&RustBackend::new(), input, options)
}

/// Normalize one image: inspect, decode with orientation, bound, re-encode,
/// write, re-inspect.
pub fn optimize_image_with_backend(
    backend: &impl ImageBackend,
    input: &Path,
    options: &ImageProcessOptions,
) -> Result<ImageProcessResult> {
    let source = backend.inspect(input)?;
    let params = plan_normalize(input, source.format.family(), options);

    log::debug!(
        "{}: {:?} → {} (quality {})",
        input.display(),
        source.format,
        params.encoding.family(),
        params.encoding.quality()
    );

    let decoded = backend.normalize(&params)?;
    let original = source.dimensions.unwrap_or(decoded);
    let was_resized = exceeds_bounds(original, params.max_width, params.max_height);

    let written = backend.inspect(&params.output)?;
    let Dimensions { width, height } = written
        .dimensions
        .unwrap_or_else(|| fit_within(decoded, params.max_width, params.max_height));

    Ok(ImageProcessResult {
        output_path: params.output,
        width,
        height,
        byte_size: written.byte_size,
        format: written.format.family(),
        was_resized,
    })
}
