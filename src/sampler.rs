//! Corridor sampler (C5): Poisson-disk sampling inside a buffered
//! origin-destination corridor, producing the vertex set for the graph
//! builder.

use crate::error::PlanError;
use crate::geo::{distance_nm, nm_to_degrees, GeoPoint};
use crate::model::Deadline;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::PI;

const MAX_CANDIDATES: usize = 30;

/// The buffered region around the straight origin-destination line: a
/// capsule (stadium) shape, S-E segment buffered by `margin_nm`. Modelled
/// as a distance-to-segment test rather than an explicit polygon, which is
/// equivalent to the "convex hull of circles at S, E plus rectangular
/// joins" construction described for this module.
struct Corridor {
    s: GeoPoint,
    e: GeoPoint,
    margin_nm: f64,
}

impl Corridor {
    fn contains(&self, p: GeoPoint) -> bool {
        distance_to_segment_nm(p, self.s, self.e) <= self.margin_nm
    }
}

/// Closest-point-on-segment distance, in nautical miles. Segment geometry
/// is done in plain lat/lon space (acceptable for the corridor's scale);
/// the actual distance metric is the great-circle one from C1.
fn distance_to_segment_nm(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let (ax, ay) = (a.lon, a.lat);
    let (bx, by) = (b.lon, b.lat);
    let (px, py) = (p.lon, p.lat);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq <= f64::EPSILON {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let closest = GeoPoint::new(ay + t * dy, ax + t * dx);
    distance_nm(p, closest)
}

/// Buckets a point for the spatial grid. Longitude is scaled by
/// `cos(ref_lat)` before bucketing so a cell spans roughly the same real
/// distance on both axes — without this, cells near the poles would be
/// much narrower in nm along longitude than along latitude, and the 3x3
/// neighbour search below could miss points that are actually within
/// `min_distance_nm`.
fn cell_of(p: GeoPoint, cell_size_deg: f64, lon_scale: f64) -> (i64, i64) {
    (
        (p.lat / cell_size_deg).floor() as i64,
        (p.lon * lon_scale / cell_size_deg).floor() as i64,
    )
}

/// Derives a per-request RNG seed: the request's explicit seed if given,
/// otherwise a deterministic hash of origin/destination/resolution/margin
/// so repeated identical requests reproduce identical sample sets.
pub fn derive_seed(
    seed: Option<u64>,
    origin: GeoPoint,
    destination: GeoPoint,
    grid_resolution_nm: f64,
    corridor_margin_nm: f64,
) -> u64 {
    if let Some(s) = seed {
        return s;
    }
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    origin.lat.to_bits().hash(&mut hasher);
    origin.lon.to_bits().hash(&mut hasher);
    destination.lat.to_bits().hash(&mut hasher);
    destination.lon.to_bits().hash(&mut hasher);
    grid_resolution_nm.to_bits().hash(&mut hasher);
    corridor_margin_nm.to_bits().hash(&mut hasher);
    hasher.finish()
}

/// Generates the sample grid inside the corridor between `origin` and
/// `destination`. Both endpoints are always present in the output and are
/// seeded into the accepted set up front, so neither the Poisson loop nor
/// the final point set can place another sample within `min_distance_nm`
/// of either of them.
pub fn sample_corridor(
    origin: GeoPoint,
    destination: GeoPoint,
    grid_resolution_nm: f64,
    corridor_margin_nm: f64,
    seed: u64,
    deadline: &Deadline,
) -> Result<Vec<GeoPoint>, PlanError> {
    let min_distance_nm = grid_resolution_nm;
    let corridor = Corridor {
        s: origin,
        e: destination,
        margin_nm: corridor_margin_nm,
    };

    let cell_size_deg = nm_to_degrees(min_distance_nm) / std::f64::consts::SQRT_2;
    // A single reference latitude for the whole corridor keeps the grid's
    // lon bucketing isotropic; the corridor spans at most a few degrees so
    // the cos(lat) approximation barely drifts across it. Candidate
    // placement below still uses each point's own latitude for the
    // physically-correct offset.
    let bucket_lon_scale = ((origin.lat + destination.lat) / 2.0).to_radians().cos().max(1e-6);
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut accepted: Vec<GeoPoint> = Vec::new();

    let insert = |accepted: &mut Vec<GeoPoint>, grid: &mut HashMap<(i64, i64), Vec<usize>>, p: GeoPoint| {
        let idx = accepted.len();
        accepted.push(p);
        grid.entry(cell_of(p, cell_size_deg, bucket_lon_scale)).or_default().push(idx);
        idx
    };

    insert(&mut accepted, &mut grid, origin);
    insert(&mut accepted, &mut grid, destination);

    let mut active: Vec<usize> = vec![0];
    let mut rng = StdRng::seed_from_u64(seed);

    let r_deg = nm_to_degrees(min_distance_nm);

    let is_valid = |accepted: &[GeoPoint], grid: &HashMap<(i64, i64), Vec<usize>>, candidate: GeoPoint| -> bool {
        if !corridor.contains(candidate) {
            return false;
        }
        // Cell size is r/sqrt(2), so two points exactly `min_distance_nm`
        // apart can land up to 2 cells apart on an axis (r/cell_size ~=
        // 1.414, rounding up) — a 3x3 neighbourhood isn't wide enough to
        // always find them; search 5x5 instead.
        let (cx, cy) = cell_of(candidate, cell_size_deg, bucket_lon_scale);
        for dx in -2..=2 {
            for dy in -2..=2 {
                if let Some(indices) = grid.get(&(cx + dx, cy + dy)) {
                    for &idx in indices {
                        if distance_nm(accepted[idx], candidate) < min_distance_nm {
                            return false;
                        }
                    }
                }
            }
        }
        true
    };

    while !active.is_empty() {
        if deadline.expired() {
            return Err(PlanError::Timeout);
        }
        let pick = rng.gen_range(0..active.len());
        let active_idx = active.swap_remove(pick);
        let base = accepted[active_idx];
        let mut placed = false;
        for _ in 0..MAX_CANDIDATES {
            let angle = rng.gen_range(0.0..(2.0 * PI));
            let radius_deg = rng.gen_range(r_deg..(2.0 * r_deg));
            // Longitude degrees are compressed by cos(lat) relative to
            // latitude degrees; inflate the longitude delta so the
            // candidate actually lands `radius_deg` (in lat-equivalent
            // degrees) away regardless of bearing.
            let offset_lon_scale = base.lat.to_radians().cos().max(1e-6);
            let candidate = GeoPoint::new(
                base.lat + radius_deg * angle.cos(),
                base.lon + radius_deg * angle.sin() / offset_lon_scale,
            );
            if !candidate.is_valid() {
                continue;
            }
            if is_valid(&accepted, &grid, candidate) {
                let idx = insert(&mut accepted, &mut grid, candidate);
                active.push(active_idx);
                active.push(idx);
                placed = true;
                break;
            }
        }
        if !placed {
            continue;
        }
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::new(Duration::from_secs(30))
    }

    #[test]
    fn output_always_contains_both_endpoints() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let seed = derive_seed(Some(1), s, e, 0.5, 2.0);
        let points = sample_corridor(s, e, 0.5, 2.0, seed, &deadline()).unwrap();
        assert!(points.contains(&s));
        assert!(points.contains(&e));
    }

    #[test]
    fn pairwise_min_distance_respected() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let seed = derive_seed(Some(7), s, e, 0.5, 2.0);
        let points = sample_corridor(s, e, 0.5, 2.0, seed, &deadline()).unwrap();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let d = distance_nm(points[i], points[j]);
                assert!(d >= 0.5 * 0.95, "points {} and {} too close: {d}", i, j);
            }
        }
    }

    #[test]
    fn all_points_inside_corridor() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let seed = derive_seed(Some(3), s, e, 0.5, 2.0);
        let corridor = Corridor { s, e, margin_nm: 2.0 };
        let points = sample_corridor(s, e, 0.5, 2.0, seed, &deadline()).unwrap();
        for p in &points {
            assert!(corridor.contains(*p));
        }
    }

    #[test]
    fn large_resolution_yields_exactly_endpoints() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let d = distance_nm(s, e);
        let seed = derive_seed(Some(5), s, e, d * 3.0, 2.0);
        let points = sample_corridor(s, e, d * 3.0, 2.0, seed, &deadline()).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn deterministic_given_same_seed() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let points_a = sample_corridor(s, e, 0.5, 2.0, 42, &deadline()).unwrap();
        let points_b = sample_corridor(s, e, 0.5, 2.0, 42, &deadline()).unwrap();
        assert_eq!(points_a, points_b);
    }

    #[test]
    fn timeout_when_deadline_already_expired() {
        let s = GeoPoint::new(54.50, 18.60);
        let e = GeoPoint::new(54.60, 18.70);
        let expired = Deadline::new(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        let result = sample_corridor(s, e, 0.1, 2.0, 1, &expired);
        assert!(matches!(result, Err(PlanError::Timeout)));
    }
}
