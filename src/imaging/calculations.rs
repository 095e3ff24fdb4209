//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// Whether a source strictly exceeds the bound on either axis.
pub fn exceeds_bounds(source: Dimensions, max_width: u32, max_height: u32) -> bool {
    source.width > max_width || source.height > max_height
}

/// Largest size that fits inside `max_width × max_height` with the source
/// aspect ratio. Never upscales: sources already inside the box are returned
/// unchanged.
///
/// # Examples
/// ```
/// # use reefmap::imaging::{Dimensions, fit_within};
/// // 4000x3000 into a 1600 box → 1600x1200
/// let fitted = fit_within(Dimensions { width: 4000, height: 3000 }, 1600, 1600);
/// assert_eq!((fitted.width, fitted.height), (1600, 1200));
///
/// // 800x600 already fits
/// let fitted = fit_within(Dimensions { width: 800, height: 600 }, 1600, 1600);
/// assert_eq!((fitted.width, fitted.height), (800, 600));
/// ```
pub fn fit_within(source: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    if !exceeds_bounds(source, max_width, max_height) || source.width == 0 || source.height == 0 {
        return source;
    }

    let scale = f64::min(
        max_width as f64 / source.width as f64,
        max_height as f64 / source.height as f64,
    );

    // Rounding can push the constrained edge one pixel over; clamp it back.
    let width = ((source.width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let height = ((source.height as f64 * scale).round() as u32).clamp(1, max_height.max(1));

    Dimensions { width, height }
}
