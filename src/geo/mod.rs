//! Map marker clustering: pure functions, no I/O.
//!
//! | Operation | Function |
//! |---|---|
//! | **Distance** | [`haversine_km`] on a 6371 km sphere |
//! | **Zoom policy** | [`distance_threshold_km`], three fixed tiers |
//! | **Clustering** | [`cluster_sites`], greedy single pass, seed-relative |
//! | **Bounds** | [`region_bounds`], min/max reduction for viewport fitting |
//!
//! Everything here is synchronous and stateless. Malformed coordinates are
//! never rejected: they flow through the math and produce NaN distances,
//! which never satisfy a threshold.

mod bounds;
mod clustering;
mod distance;

pub use bounds::{RegionBounds, region_bounds};
pub use clustering::{
    Centroid, ClusterResult, DiveSite, INDIVIDUAL_ZOOM, RegionalCluster, cluster_sites,
    distance_threshold_km,
};
pub use distance::{EARTH_RADIUS_KM, haversine_km};
