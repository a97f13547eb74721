//! Geodesy primitives: great-circle distance, initial bearing, and the
//! degree/nautical-mile conversion used by corridor buffering.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_TO_NM: f64 = 0.539957;

/// A geographic point. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Great-circle distance between two points, in nautical miles.
pub fn distance_nm(a: GeoPoint, b: GeoPoint) -> f64 {
    if a.lat == b.lat && a.lon == b.lon {
        return 0.0;
    }
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c * KM_TO_NM
}

/// Initial bearing from `a` to `b`, clockwise from true north, in `[0, 360)`.
/// Returns 0 when `a == b` (undefined case).
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    if a.lat == b.lat && a.lon == b.lon {
        return 0.0;
    }
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();
    (theta + 360.0) % 360.0
}

/// Approximate latitude-equivalent degrees for a distance in nautical miles.
/// Only intended for buffering where axis-aligned error is acceptable.
pub fn nm_to_degrees(nm: f64) -> f64 {
    nm / 60.0
}

/// Fold an angle into `[0, 180]`, the convention used for true wind angle.
pub fn fold_twa(angle_deg: f64) -> f64 {
    let a = angle_deg.abs() % 360.0;
    a.min(360.0 - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_commutative_and_zero_for_identical_points() {
        let a = GeoPoint::new(54.5, 18.6);
        let b = GeoPoint::new(54.6, 18.7);
        assert_eq!(distance_nm(a, a), 0.0);
        assert!((distance_nm(a, b) - distance_nm(b, a)).abs() < 1e-9);
    }

    #[test]
    fn distance_trivial_leg_matches_expected_nm() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let d = distance_nm(s, e);
        assert!((d - 7.3).abs() / 7.3 < 0.05, "got {d}");
    }

    #[test]
    fn bearing_cardinal_directions() {
        let a = GeoPoint::new(0.0, 0.0);
        let north = GeoPoint::new(1.0, 0.0);
        let east = GeoPoint::new(0.0, 1.0);
        assert!(bearing_deg(a, north) < 1.0);
        assert!((bearing_deg(a, east) - 90.0).abs() < 1.0);
    }

    #[test]
    fn bearing_undefined_for_identical_points_returns_zero() {
        let a = GeoPoint::new(12.0, 34.0);
        assert_eq!(bearing_deg(a, a), 0.0);
    }

    #[test]
    fn fold_twa_symmetric_around_0_and_180() {
        assert_eq!(fold_twa(0.0), 0.0);
        assert_eq!(fold_twa(180.0), 180.0);
        assert_eq!(fold_twa(200.0), 160.0);
        assert_eq!(fold_twa(-30.0), 30.0);
        assert_eq!(fold_twa(350.0), 10.0);
    }
}
