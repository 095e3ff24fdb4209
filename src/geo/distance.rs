//! Great-circle distance.

/// Mean Earth radius used for all distance math.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two `(latitude, longitude)`
/// pairs given in degrees.
///
/// ```
/// # use reefmap::geo::haversine_km;
/// // One degree of latitude is ~111.19 km on a 6371 km sphere.
/// let d = haversine_km((0.0, 0.0), (1.0, 0.0));
/// assert!((d - 111.19).abs() < 0.01);
/// ```
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lng1) = a;
    let (lat2, lng2) = b;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn same_point_is_zero() {
        assert_abs_diff_eq!(haversine_km((12.5, -70.0), (12.5, -70.0)), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = (-8.27, 115.59);
        let b = (-16.92, 145.77);
        assert_abs_diff_eq!(haversine_km(a, b), haversine_km(b, a), epsilon = 1e-9);
    }

    #[test]
    fn quarter_meridian() {
        // Equator to pole: a quarter of the circumference.
        let expected = std::f64::consts::PI * EARTH_RADIUS_KM / 2.0;
        assert_abs_diff_eq!(haversine_km((0.0, 0.0), (90.0, 0.0)), expected, epsilon = 1e-6);
    }

    #[test]
    fn antipodal_points() {
        let expected = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert_abs_diff_eq!(haversine_km((0.0, 0.0), (0.0, 180.0)), expected, epsilon = 1e-6);
    }

    #[test]
    fn crosses_antimeridian_the_short_way() {
        // 179.5°E to 179.5°W is one degree of longitude at the equator.
        let d = haversine_km((0.0, 179.5), (0.0, -179.5));
        assert_abs_diff_eq!(d, 111.19, epsilon = 0.01);
    }

    #[test]
    fn nan_propagates() {
        assert!(haversine_km((f64::NAN, 0.0), (0.0, 0.0)).is_nan());
    }
}
