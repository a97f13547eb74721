//! Obstacle geometry: polygon storage and segment/polygon intersection.
//!
//! The core only needs segment-segment intersection, point-in-polygon, and
//! segment-polygon intersection, so this is a small from-scratch module
//! rather than a dependency on a general planar-geometry crate.

use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Shoal,
    Island,
    Platform,
    Restricted,
}

/// A simple closed polygon obstacle. Ring winding is not assumed; the
/// intersection predicate below is winding-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub kind: ObstacleKind,
    pub ring: Vec<GeoPoint>,
    pub min_depth_m: Option<f64>,
}

impl Obstacle {
    pub fn new(id: impl Into<String>, kind: ObstacleKind, ring: Vec<GeoPoint>) -> Self {
        Self {
            id: id.into(),
            kind,
            ring,
            min_depth_m: None,
        }
    }

    fn bbox(&self) -> (f64, f64, f64, f64) {
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lon = f64::MAX;
        let mut max_lon = f64::MIN;
        for p in &self.ring {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lon = min_lon.min(p.lon);
            max_lon = max_lon.max(p.lon);
        }
        (min_lat, max_lat, min_lon, max_lon)
    }
}

/// True iff the two segments (in lon/lat space, treated as a plane) cross,
/// including a touching endpoint.
fn segments_intersect(p1: GeoPoint, p2: GeoPoint, p3: GeoPoint, p4: GeoPoint) -> bool {
    fn orientation(a: GeoPoint, b: GeoPoint, c: GeoPoint) -> f64 {
        (b.lon - a.lon) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lon - a.lon)
    }
    fn on_segment(a: GeoPoint, b: GeoPoint, c: GeoPoint) -> bool {
        c.lat >= a.lat.min(b.lat) - 1e-12
            && c.lat <= a.lat.max(b.lat) + 1e-12
            && c.lon >= a.lon.min(b.lon) - 1e-12
            && c.lon <= a.lon.max(b.lon) + 1e-12
    }

    let d1 = orientation(p3, p4, p1);
    let d2 = orientation(p3, p4, p2);
    let d3 = orientation(p1, p2, p3);
    let d4 = orientation(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(p3, p4, p1))
        || (d2 == 0.0 && on_segment(p3, p4, p2))
        || (d3 == 0.0 && on_segment(p1, p2, p3))
        || (d4 == 0.0 && on_segment(p1, p2, p4))
}

/// Ray-casting point-in-polygon test. Winding-agnostic.
fn point_in_polygon(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = ring[i];
        let pj = ring[j];
        let intersects = (pi.lat > point.lat) != (pj.lat > point.lat)
            && point.lon
                < (pj.lon - pi.lon) * (point.lat - pi.lat) / (pj.lat - pi.lat) + pi.lon;
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True iff the straight segment `(a, b)` intersects `obstacle`'s closed
/// interior: either it crosses an edge of the ring, or one of its endpoints
/// lies inside the ring. Touching the boundary counts as crossing.
pub fn crosses(a: GeoPoint, b: GeoPoint, obstacle: &Obstacle) -> bool {
    let (min_lat, max_lat, min_lon, max_lon) = obstacle.bbox();
    let seg_min_lat = a.lat.min(b.lat);
    let seg_max_lat = a.lat.max(b.lat);
    let seg_min_lon = a.lon.min(b.lon);
    let seg_max_lon = a.lon.max(b.lon);
    if seg_max_lat < min_lat || seg_min_lat > max_lat || seg_max_lon < min_lon || seg_min_lon > max_lon
    {
        return false;
    }

    if point_in_polygon(a, &obstacle.ring) || point_in_polygon(b, &obstacle.ring) {
        return true;
    }

    let n = obstacle.ring.len();
    for i in 0..n {
        let e1 = obstacle.ring[i];
        let e2 = obstacle.ring[(i + 1) % n];
        if segments_intersect(a, b, e1, e2) {
            return true;
        }
    }
    false
}

/// Short-circuiting bulk query over all obstacles.
pub fn any_crosses(a: GeoPoint, b: GeoPoint, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|o| crosses(a, b, o))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_obstacle() -> Obstacle {
        Obstacle::new(
            "o1",
            ObstacleKind::Shoal,
            vec![
                GeoPoint::new(54.54, 18.63),
                GeoPoint::new(54.54, 18.67),
                GeoPoint::new(54.56, 18.67),
                GeoPoint::new(54.56, 18.63),
            ],
        )
    }

    #[test]
    fn segment_through_obstacle_interior_crosses() {
        let o = rect_obstacle();
        let a = GeoPoint::new(54.50, 18.60);
        let b = GeoPoint::new(54.60, 18.70);
        assert!(crosses(a, b, &o));
    }

    #[test]
    fn segment_far_away_does_not_cross() {
        let o = rect_obstacle();
        let a = GeoPoint::new(10.0, 10.0);
        let b = GeoPoint::new(11.0, 11.0);
        assert!(!crosses(a, b, &o));
    }

    #[test]
    fn endpoint_inside_polygon_counts_as_crossing() {
        let o = rect_obstacle();
        let inside = GeoPoint::new(54.55, 18.65);
        let outside = GeoPoint::new(54.40, 18.50);
        assert!(crosses(inside, outside, &o));
    }

    #[test]
    fn any_crosses_short_circuits_on_first_hit() {
        let obstacles = vec![rect_obstacle()];
        let a = GeoPoint::new(54.50, 18.60);
        let b = GeoPoint::new(54.60, 18.70);
        assert!(any_crosses(a, b, &obstacles));
        assert!(!any_crosses(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.1, 0.1),
            &obstacles
        ));
    }

    #[test]
    fn winding_agnostic() {
        let mut o = rect_obstacle();
        o.ring.reverse();
        let a = GeoPoint::new(54.50, 18.60);
        let b = GeoPoint::new(54.60, 18.70);
        assert!(crosses(a, b, &o));
    }
}
