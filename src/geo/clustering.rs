//! Regional clustering of dive-site markers.
//!
//! ## Zoom policy
//!
//! ```text
//! zoom >= 5        → no clustering, every site is its own marker
//! zoom <= 2        → 2000 km
//! zoom <= 3        → 1500 km
//! otherwise (< 5)  → 1000 km
//! ```
//!
//! The tiers are exact, not an approximation of a continuous falloff.
//!
//! ## Grouping
//!
//! A single greedy pass in input order. Each unassigned site becomes a seed
//! and pulls in every other unassigned site within the threshold **of the
//! seed**. Membership is not transitive: two members of the same cluster can
//! be up to twice the threshold apart, and a site near a member but far from
//! the seed is left for a later seed. Map output depends on this, so it is
//! kept as is.

use super::distance::haversine_km;
use serde::{Deserialize, Serialize};

/// Zoom level at and above which sites are never clustered.
pub const INDIVIDUAL_ZOOM: f64 = 5.0;

const FALLBACK_REGION: &str = "Regional Cluster";

/// A dive site as supplied by the data layer.
///
/// Only `latitude`/`longitude` take part in clustering; `country` and
/// `location` are used to label the cluster a site seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveSite {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Free-form place string, most specific first: `"Tulamben, Bali, Indonesia"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Planar mean of member coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
}

/// Two or more sites grouped around a seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalCluster {
    pub id: String,
    pub region: String,
    /// Seed first, then joiners in input order.
    pub sites: Vec<DiveSite>,
    pub centroid: Centroid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterResult {
    pub clusters: Vec<RegionalCluster>,
    pub individual_sites: Vec<DiveSite>,
}

/// Grouping radius for a zoom level, or `None` when sites should be shown
/// individually.
pub fn distance_threshold_km(zoom: f64) -> Option<f64> {
    if zoom >= INDIVIDUAL_ZOOM {
        None
    } else if zoom <= 2.0 {
        Some(2000.0)
    } else if zoom <= 3.0 {
        Some(1500.0)
    } else {
        Some(1000.0)
    }
}

/// Group sites into regional clusters for the given zoom level.
///
/// Every input site lands in exactly one place: a cluster's `sites` or
/// `individual_sites`. Never fails; an empty input gives an empty result.
pub fn cluster_sites(sites: &[DiveSite], zoom: f64) -> ClusterResult {
    let Some(threshold) = distance_threshold_km(zoom) else {
        return ClusterResult {
            clusters: Vec::new(),
            individual_sites: sites.to_vec(),
        };
    };

    let mut assigned = vec![false; sites.len()];
    let mut result = ClusterResult::default();

    for (i, seed) in sites.iter().enumerate() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        let mut members = vec![seed];
        for (j, other) in sites.iter().enumerate().skip(i + 1) {
            if assigned[j] {
                continue;
            }
            let d = haversine_km(
                (seed.latitude, seed.longitude),
                (other.latitude, other.longitude),
            );
            // NaN compares false, so malformed coordinates never join.
            if d <= threshold {
                assigned[j] = true;
                members.push(other);
            }
        }

        if members.len() == 1 {
            result.individual_sites.push(seed.clone());
        } else {
            result.clusters.push(RegionalCluster {
                id: format!("cluster-{}", seed.id),
                region: format!("{} Region", region_label(seed)),
                centroid: centroid(&members),
                sites: members.into_iter().cloned().collect(),
            });
        }
    }

    log::debug!(
        "zoom {zoom}: {} sites → {} clusters, {} individual",
        sites.len(),
        result.clusters.len(),
        result.individual_sites.len()
    );

    result
}

/// Country, else the last comma-separated token of the location, else the
/// fallback. Blank values count as absent.
fn region_label(seed: &DiveSite) -> &str {
    let non_blank = |s: &str| !s.trim().is_empty();

    seed.country
        .as_deref()
        .filter(|c| non_blank(c))
        .or_else(|| {
            seed.location
                .as_deref()
                .and_then(|loc| loc.rsplit(',').next())
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or(FALLBACK_REGION)
}

fn centroid(members: &[&DiveSite]) -> Centroid {
    let n = members.len() as f64;
    let (lat_sum, lng_sum) = members
        .iter()
        .fold((0.0, 0.0), |(lat, lng), s| (lat + s.latitude, lng + s.longitude));
    Centroid {
        latitude: lat_sum / n,
        longitude: lng_sum / n,
    }
}
