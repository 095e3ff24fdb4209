//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Cluster
//!
//! ```text
//! Zoom 3 (1500 km)
//! Bali Region (3 sites) @ -8.3100, 115.5700
//!     Tulamben Wreck
//!     Blue Lagoon
//!     Manta Point
//! Individual
//!     Blue Corner
//! 1 cluster, 1 individual site
//! ```
//!
//! ## Bounds
//!
//! ```text
//! Latitude:  -8.7000 .. 7.1300
//! Longitude: 115.4000 .. 134.2200
//! ```
//!
//! ## Optimize
//!
//! ```text
//! uploads/reef.jpg → 1600x1200 jpeg, 412.3 KB (resized)
//! ```
//!
//! ## Batch
//!
//! ```text
//! trips/reef.jpg: 1600x1200 jpeg, 2.1 MB → 412.3 KB
//! trips/old.png: unchanged
//! trips/broken.heic: failed (Decode failed: ...)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchSummary};
use crate::geo::{ClusterResult, RegionBounds, distance_threshold_km};
use crate::imaging::ImageProcessResult;

// ============================================================================
// Shared helpers
// ============================================================================

/// Indentation for a given depth.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human byte size: `512 B`, `12.5 KB`, `3.2 MB`.
pub fn human_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

// ============================================================================
// Cluster
// ============================================================================

/// Format a clustering result for terminal display.
pub fn format_cluster_output(result: &ClusterResult, zoom: f64) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(match distance_threshold_km(zoom) {
        Some(km) => format!("Zoom {} ({} km)", zoom, km),
        None => format!("Zoom {} (individual sites)", zoom),
    });

    for cluster in &result.clusters {
        lines.push(format!(
            "{} ({}) @ {:.4}, {:.4}",
            cluster.region,
            plural(cluster.sites.len(), "site", "sites"),
            cluster.centroid.latitude,
            cluster.centroid.longitude
        ));
        for site in &cluster.sites {
            lines.push(format!("{}{}", indent(1), site.name));
        }
    }

    if !result.individual_sites.is_empty() {
        lines.push("Individual".to_string());
        for site in &result.individual_sites {
            lines.push(format!("{}{}", indent(1), site.name));
        }
    }

    lines.push(format!(
        "{}, {}",
        plural(result.clusters.len(), "cluster", "clusters"),
        plural(
            result.individual_sites.len(),
            "individual site",
            "individual sites"
        )
    ));
    lines
}

/// Print clustering output to stdout.
pub fn print_cluster_output(result: &ClusterResult, zoom: f64) {
    for line in format_cluster_output(result, zoom) {
        println!("{}", line);
    }
}

// ============================================================================
// Bounds
// ============================================================================

pub fn format_bounds_output(bounds: &RegionBounds) -> Vec<String> {
    if !bounds.is_valid() {
        return vec!["No sites".to_string()];
    }
    vec![
        format!("Latitude:  {:.4} .. {:.4}", bounds.min_lat, bounds.max_lat),
        format!("Longitude: {:.4} .. {:.4}", bounds.min_lng, bounds.max_lng),
    ]
}

pub fn print_bounds_output(bounds: &RegionBounds) {
    for line in format_bounds_output(bounds) {
        println!("{}", line);
    }
}

// ============================================================================
// Optimize
// ============================================================================

/// One line per normalized file.
pub fn format_optimize_result(result: &ImageProcessResult) -> String {
    format!(
        "{} \u{2192} {}x{} {}, {}{}",
        result.output_path.display(),
        result.width,
        result.height,
        result.format,
        human_bytes(result.byte_size),
        if result.was_resized { " (resized)" } else { "" }
    )
}

pub fn print_optimize_result(result: &ImageProcessResult) {
    println!("{}", format_optimize_result(result));
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Skipped { rel_path } => vec![format!("{}: unchanged", rel_path)],
        BatchEvent::Normalized {
            rel_path,
            original_bytes,
            result,
        } => vec![format!(
            "{}: {}x{} {}, {} \u{2192} {}",
            rel_path,
            result.width,
            result.height,
            result.format,
            human_bytes(*original_bytes),
            human_bytes(result.byte_size)
        )],
        BatchEvent::Failed { rel_path, error } => {
            vec![format!("{}: failed ({})", rel_path, error)]
        }
    }
}

/// Closing lines of a batch run.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![format!("Cache: {}", summary.cache_stats)];
    if summary.bytes_before > 0 {
        lines.push(format!(
            "Size: {} \u{2192} {}",
            human_bytes(summary.bytes_before),
            human_bytes(summary.bytes_after)
        ));
    }
    if !summary.failures.is_empty() {
        lines.push(format!(
            "{} failed:",
            plural(summary.failures.len(), "file", "files")
        ));
        for (path, error) in &summary.failures {
            lines.push(format!("{}{}: {}", indent(1), path, error));
        }
    }
    lines
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}
