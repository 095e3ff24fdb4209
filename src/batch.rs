//! Directory-wide normalization.
//!
//! Walks a directory for images, normalizes each one in place, and keeps the
//! [`cache`](crate::cache) ledger so the next run skips files it already
//! produced.
//!
//! ## Flow
//!
//! ```text
//! walk root (sorted)  →  par_iter over files  →  collect outcomes  →  update ledger
//!                          │ hash content
//!                          │ ledger says current? → Skipped
//!                          │ else optimize_image → Normalized / Failed
//!                          └ event → Sender (printer thread)
//! ```
//!
//! Per-file failures are reported as [`BatchEvent::Failed`] and collected in
//! the summary; only a failure to walk the directory or write the ledger
//! aborts the run.
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon) on
//! whatever pool the caller installed (the CLI sizes the global pool from
//! `[processing] max_processes`). The ledger is read-only during the parallel
//! phase and updated on the calling thread afterwards.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::imaging::{
    ImageBackend, ImageProcessOptions, ImageProcessResult, RustBackend, is_supported_image,
    optimize_image_with_backend,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Progress event, sent once per file as soon as it is done.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Content matches what a previous run wrote; left untouched.
    Skipped { rel_path: String },
    Normalized {
        rel_path: String,
        original_bytes: u64,
        result: ImageProcessResult,
    },
    Failed { rel_path: String, error: String },
}

/// Outcome of a whole batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub cache_stats: CacheStats,
    /// Relative path and message of every file that could not be normalized.
    pub failures: Vec<(String, String)>,
    /// Bytes before and after, over normalized files only.
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl BatchSummary {
    pub fn processed(&self) -> u32 {
        self.cache_stats.total()
    }
}

/// Every supported image under `root`, sorted by path.
pub fn find_images(root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut images = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// `root`-relative path with forward slashes, used as the ledger key.
fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize every image under `root` in place with the production backend.
pub fn batch_normalize(
    root: &Path,
    options: &ImageProcessOptions,
    use_cache: bool,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    batch_normalize_with_backend(&RustBackend::new(), root, options, use_cache, events)
}

/// Per-file result carried from the parallel phase back to the ledger.
enum Outcome {
    Skipped,
    Normalized {
        result: ImageProcessResult,
        output_hash: Option<String>,
        original_bytes: u64,
    },
    Failed(String),
}

/// Normalize every image under `root` using a specific backend.
///
/// `options.output_path` is ignored: batch runs always write in place.
pub fn batch_normalize_with_backend(
    backend: &impl ImageBackend,
    root: &Path,
    options: &ImageProcessOptions,
    use_cache: bool,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    let images = find_images(root)?;
    log::info!("{} images under {}", images.len(), root.display());

    let mut ledger = if use_cache {
        CacheManifest::load(root)
    } else {
        CacheManifest::empty()
    };
    let in_place = ImageProcessOptions {
        output_path: None,
        ..options.clone()
    };
    let params_hash = cache::hash_params(
        in_place.max_width(),
        in_place.max_height(),
        in_place.quality().value(),
    );

    let outcomes: Vec<(String, Outcome)> = images
        .par_iter()
        .map(|path| {
            let rel_path = relative_key(root, path);
            let outcome = normalize_one(backend, path, &rel_path, &ledger, &params_hash, &in_place);
            if let Some(tx) = &events {
                // Receiver gone means nobody is listening; keep working.
                tx.send(event_for(&rel_path, &outcome)).ok();
            }
            (rel_path, outcome)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (rel_path, outcome) in &outcomes {
        match outcome {
            Outcome::Skipped => summary.cache_stats.hit(),
            Outcome::Normalized {
                result,
                output_hash,
                original_bytes,
            } => {
                summary.cache_stats.miss();
                summary.bytes_before += original_bytes;
                summary.bytes_after += result.byte_size;
                if let Some(hash) = output_hash {
                    ledger.insert(rel_path.clone(), hash.clone(), params_hash.clone());
                }
            }
            Outcome::Failed(error) => {
                summary.cache_stats.miss();
                summary.failures.push((rel_path.clone(), error.clone()));
            }
        }
    }

    ledger.retain_paths(outcomes.iter().map(|(p, _)| p.as_str()));
    ledger.save(root)?;
    Ok(summary)
}

fn normalize_one(
    backend: &impl ImageBackend,
    path: &Path,
    rel_path: &str,
    ledger: &CacheManifest,
    params_hash: &str,
    options: &ImageProcessOptions,
) -> Outcome {
    let original = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    if ledger.is_current(rel_path, &cache::hash_bytes(&original), params_hash) {
        log::debug!("{rel_path}: unchanged since last run");
        return Outcome::Skipped;
    }

    match optimize_image_with_backend(backend, path, options) {
        Ok(result) => {
            let output_hash = cache::hash_file(&result.output_path)
                .map_err(|e| log::warn!("{rel_path}: not cached, rehash failed: {e}"))
                .ok();
            Outcome::Normalized {
                result,
                output_hash,
                original_bytes: original.len() as u64,
            }
        }
        Err(e) => {
            log::warn!("{rel_path}: {e}");
            Outcome::Failed(e.to_string())
        }
    }
}

fn event_for(rel_path: &str, outcome: &Outcome) -> BatchEvent {
    let rel_path = rel_path.to_string();
    match outcome {
        Outcome::Skipped => BatchEvent::Skipped { rel_path },
        Outcome::Normalized {
            result,
            original_bytes,
            ..
        } => BatchEvent::Normalized {
            rel_path,
            original_bytes: *original_bytes,
            result: result.clone(),
        },
        Outcome::Failed(error) => BatchEvent::Failed {
            rel_path,
            error: error.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_jpeg, create_test_png};
    use std::fs;
    use tempfile::TempDir;

    fn small_options() -> ImageProcessOptions {
        ImageProcessOptions {
            max_width: Some(64),
            max_height: Some(64),
            ..Default::default()
        }
    }

    #[test]
    fn find_images_recurses_and_filters() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("trip/day1")).unwrap();
        create_test_jpeg(&tmp.path().join("b.jpg"), 8, 8);
        create_test_png(&tmp.path().join("trip/day1/a.PNG"), 8, 8);
        fs::write(tmp.path().join("notes.txt"), "log").unwrap();

        let found: Vec<String> = find_images(tmp.path())
            .unwrap()
            .iter()
            .map(|p| relative_key(tmp.path(), p))
            .collect();
        assert_eq!(found, vec!["b.jpg", "trip/day1/a.PNG"]);
    }

    #[test]
    fn find_images_missing_root_is_walk_error() {
        let tmp = TempDir::new().unwrap();
        let result = find_images(&tmp.path().join("missing"));
        assert!(matches!(result, Err(BatchError::Walk(_))));
    }

    #[test]
    fn batch_normalizes_in_place_and_reports_events() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("big.jpg"), 200, 100);
        create_test_png(&tmp.path().join("small.png"), 32, 32);

        let (tx, rx) = std::sync::mpsc::channel();
        let summary = batch_normalize(tmp.path(), &small_options(), true, Some(tx)).unwrap();

        assert_eq!(summary.cache_stats.misses, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(image::image_dimensions(tmp.path().join("big.jpg")).unwrap(), (64, 32));

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::Normalized { rel_path, result, .. }
                if rel_path == "big.jpg" && result.was_resized
        )));
        assert!(cache::manifest_path(tmp.path()).exists());
    }

    #[test]
    fn second_run_skips_own_output() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("reef.jpg"), 120, 90);

        batch_normalize(tmp.path(), &small_options(), true, None).unwrap();
        let after_first = fs::read(tmp.path().join("reef.jpg")).unwrap();

        let summary = batch_normalize(tmp.path(), &small_options(), true, None).unwrap();
        assert_eq!(summary.cache_stats.hits, 1);
        assert_eq!(summary.cache_stats.misses, 0);
        assert_eq!(fs::read(tmp.path().join("reef.jpg")).unwrap(), after_first);
    }

    #[test]
    fn no_cache_reprocesses() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("reef.jpg"), 120, 90);

        batch_normalize(tmp.path(), &small_options(), true, None).unwrap();
        let summary = batch_normalize(tmp.path(), &small_options(), false, None).unwrap();
        assert_eq!(summary.cache_stats.hits, 0);
        assert_eq!(summary.cache_stats.misses, 1);
    }

    #[test]
    fn changed_params_reprocess() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("reef.jpg"), 120, 90);

        batch_normalize(tmp.path(), &small_options(), true, None).unwrap();
        let tighter = ImageProcessOptions {
            max_width: Some(32),
            max_height: Some(32),
            ..Default::default()
        };
        let summary = batch_normalize(tmp.path(), &tighter, true, None).unwrap();
        assert_eq!(summary.cache_stats.misses, 1);
    }

    #[test]
    fn broken_file_is_collected_not_fatal() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("good.jpg"), 16, 16);
        fs::write(tmp.path().join("broken.png"), b"\x89PNG\r\n\x1a\nnope").unwrap();

        let summary = batch_normalize(tmp.path(), &small_options(), true, None).unwrap();
        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "broken.png");

        // Failed files are not recorded, so they are retried next run.
        let ledger = CacheManifest::load(tmp.path());
        assert!(ledger.entries.contains_key("good.jpg"));
        assert!(!ledger.entries.contains_key("broken.png"));
    }
}
