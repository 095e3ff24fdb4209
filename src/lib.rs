//! # reefmap
//!
//! The two algorithmic cores behind a dive-site map with user photo uploads:
//! clustering map markers by great-circle proximity, and normalizing uploaded
//! photos into bounded, web-sized files.
//!
//! # Architecture: Two Independent Components
//!
//! ```text
//! geo      sites + zoom  →  clusters / individual sites   (pure, no I/O)
//! imaging  upload file   →  normalized file in place       (decode → orient → resize → encode)
//! ```
//!
//! Both are stateless and safe to call concurrently. Everything else in the
//! crate is plumbing for the `reefmap` binary: configuration, reading site
//! files, batch runs over a directory, and terminal output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geo`] | Haversine distance, zoom-tiered greedy clustering, region bounds |
//! | [`imaging`] | Format sniffing, EXIF-aware decode, bounded resize, per-format encoders |
//! | [`config`] | `reefmap.toml` loading, validation and merging over stock defaults |
//! | [`sites`] | Dive-site JSON input for the CLI |
//! | [`batch`] | Parallel in-place normalization of a directory tree |
//! | [`cache`] | Content-hash ledger so batch runs skip their own output |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Seed-Relative Clustering
//!
//! Clustering is a single greedy pass where each site joins the first seed
//! within the zoom tier's radius. Membership is measured to the seed only, so
//! clusters are not transitive and depend on input order. The map layer relies
//! on this exact behaviour, so it is kept rather than replaced with DBSCAN or
//! a quadtree.
//!
//! ## Content Decides the Encoder
//!
//! The output format follows the *detected* input format, never the file
//! extension: PNGs stay PNG (palette-quantized), WebP stays WebP, AVIF and
//! HEIF become AVIF, and everything else becomes JPEG. A default run writes
//! back to the input path.
//!
//! ## Pure-Rust Decoding
//!
//! Decoding uses the `image` crate plus `rav1d` for AVIF, so the binary needs
//! no system codec libraries. libwebp is the one C dependency, built from
//! source by the `webp` crate for lossy WebP output.

pub mod batch;
pub mod cache;
pub mod config;
pub mod geo;
pub mod imaging;
pub mod output;
pub mod sites;

#[cfg(test)]
pub(crate) mod test_helpers;
