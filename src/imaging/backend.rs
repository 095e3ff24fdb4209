//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs:
//! `inspect` (read metadata without decoding pixels) and `normalize` (the
//! full decode → orient → resize → encode → write run).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! [`MockBackend`](tests::MockBackend) to check planning logic without
//! touching pixels.

use super::format::SourceFormat;
use super::params::NormalizeParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of a single normalization.
///
/// Unsupported-but-recognizable formats are *not* an error: they are encoded
/// as JPEG. Nothing here is retried.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What can be learned about a file without decoding its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: SourceFormat,
    /// Header dimensions as stored (before EXIF orientation). `None` when the
    /// header could not be parsed.
    pub dimensions: Option<Dimensions>,
    pub byte_size: u64,
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Read format, stored dimensions and size. Only an unreadable file is an
    /// error; a malformed header yields `dimensions: None`.
    fn inspect(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Decode, orient, bound, encode and write. Returns the dimensions of the
    /// decoded, oriented source (before resizing).
    fn normalize(&self, params: &NormalizeParams) -> Result<Dimensions, BackendError>;
}
