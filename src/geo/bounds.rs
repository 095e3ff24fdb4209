//! Bounding box of a set of sites.

use super::DiveSite;
use serde::Serialize;

/// Latitude/longitude extent of a set of sites, in degrees.
///
/// Produced by [`region_bounds`]. An empty input yields NaN in every field;
/// check [`is_valid`](Self::is_valid) before fitting a viewport to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl RegionBounds {
    /// True when all four edges are real numbers.
    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.max_lat, self.min_lng, self.max_lng]
            .iter()
            .all(|v| !v.is_nan())
    }
}

/// Min/max reduction over the sites' coordinates.
///
/// The fold starts from NaN: `f64::min`/`f64::max` return the other operand
/// when one side is NaN, so any non-empty input replaces it and an empty input
/// leaves NaN behind.
pub fn region_bounds(sites: &[DiveSite]) -> RegionBounds {
    sites.iter().fold(
        RegionBounds {
            min_lat: f64::NAN,
            max_lat: f64::NAN,
            min_lng: f64::NAN,
            max_lng: f64::NAN,
        },
        |acc, site| RegionBounds {
            min_lat: acc.min_lat.min(site.latitude),
            max_lat: acc.max_lat.max(site.latitude),
            min_lng: acc.min_lng.min(site.longitude),
            max_lng: acc.max_lng.max(site.longitude),
        },
    )
}
