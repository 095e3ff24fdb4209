//! Normalization ledger for incremental batch runs.
//!
//! Normalization is lossy and writes in place, so running `batch` twice over
//! the same directory would re-compress every upload and compound the loss.
//! This module records what each file looked like *after* it was normalized,
//! letting the next run recognize its own output and leave it alone.
//!
//! ## Cache keys
//!
//! Entries are keyed by the image path relative to the batch root and store:
//!
//! - **`output_hash`**: SHA-256 of the bytes the normalizer wrote. Content
//!   based rather than mtime based so it survives copies and `git checkout`.
//!
//! - **`params_hash`**: SHA-256 of the bounding box and quality the file was
//!   normalized with. Changing either in `reefmap.toml` re-processes
//!   everything once.
//!
//! A file is skipped when its current content hash equals the recorded
//! `output_hash` **and** the parameters match. A file replaced by a new
//! upload under the same name hashes differently and is processed again.
//!
//! ## Storage
//!
//! The ledger is a JSON file at `<root>/.reefmap-cache.json`. A missing,
//! corrupt or version-mismatched ledger loads as empty.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `batch` to start from an empty ledger. The ledger is
//! still written at the end, so the following run is incremental again.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the ledger file within the batch root.
const MANIFEST_FILENAME: &str = ".reefmap-cache.json";

/// Version of the ledger format. Bump this to invalidate all existing ledgers
/// when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// Recorded state of one normalized file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub output_hash: String,
    pub params_hash: String,
}

/// On-disk ledger mapping relative image paths to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty ledger (used for `--no-cache` or a first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the batch root. Returns an empty ledger if the file doesn't
    /// exist or can't be parsed (version mismatch, corruption).
    pub fn load(root: &Path) -> Self {
        let path = manifest_path(root);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("ignoring unreadable cache {}: {e}", path.display());
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            log::info!(
                "cache version {} != {MANIFEST_VERSION}, starting fresh",
                manifest.version
            );
            return Self::empty();
        }
        manifest
    }

    /// Save to the batch root.
    pub fn save(&self, root: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(root), json)
    }

    /// Whether `rel_path` currently holds exactly what a previous run wrote
    /// under the same parameters.
    pub fn is_current(&self, rel_path: &str, content_hash: &str, params_hash: &str) -> bool {
        self.entries
            .get(rel_path)
            .is_some_and(|e| e.output_hash == content_hash && e.params_hash == params_hash)
    }

    /// Record the output of a normalization.
    pub fn insert(&mut self, rel_path: String, output_hash: String, params_hash: String) {
        self.entries.insert(
            rel_path,
            CacheEntry {
                output_hash,
                params_hash,
            },
        );
    }

    /// Drop entries whose path is not in `seen` (deleted or renamed files).
    pub fn retain_paths<'a>(&mut self, seen: impl IntoIterator<Item = &'a str>) {
        let seen: std::collections::HashSet<&str> = seen.into_iter().collect();
        self.entries.retain(|path, _| seen.contains(path.as_str()));
    }
}

/// SHA-256 of a byte slice, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// SHA-256 hash of the normalization parameters.
///
/// Quality is hashed after clamping, so `quality = 95` and `quality = 90`
/// share entries.
pub fn hash_params(max_width: u32, max_height: u32, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"normalize\0");
    hasher.update(max_width.to_le_bytes());
    hasher.update(max_height.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} unchanged, {} normalized ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} normalized", self.misses)
        }
    }
}

/// Resolve the ledger path for a batch root.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILENAME)
}
