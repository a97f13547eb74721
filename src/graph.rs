//! Graph builder (C6): assembles a time-weighted visibility graph over a
//! sample grid, filtering edges against obstacle geometry.

use crate::error::PlanError;
use crate::geo::{bearing_deg, distance_nm, fold_twa, GeoPoint};
use crate::model::Deadline;
use crate::obstacle::{any_crosses, Obstacle};
use crate::polar::PolarCurve;
use crate::wind::{WindField, WindSample};
use rayon::prelude::*;

/// Edge multiplier applied to `grid_resolution_nm` to bound candidate
/// pairs; beyond this range two vertices are never directly connected.
pub const MAX_EDGE_RESOLUTION_FACTOR: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub to: usize,
    pub distance_nm: f64,
    pub bearing_deg: f64,
    pub wind: WindSample,
    pub boat_speed_kts: f64,
    pub time_hours: f64,
}

/// Undirected simple graph over a sample grid. Vertices are indices into
/// the originating `Vec<GeoPoint>`; adjacency is stored both directions so
/// traversal in either direction recomputes leg metadata from its own
/// origin vertex (the graph itself stays undirected for search purposes).
#[derive(Debug, Clone)]
pub struct RouteGraph {
    pub vertices: Vec<GeoPoint>,
    pub adjacency: Vec<Vec<Edge>>,
}

impl RouteGraph {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|a| a.len()).sum::<usize>() / 2
    }
}

/// Builds the graph. Pair evaluation is embarrassingly parallel, so the
/// candidate-pair pass runs over rayon; the resulting adjacency is
/// assembled back into a plain `Vec<Vec<Edge>>` afterward.
pub fn build_graph(
    vertices: Vec<GeoPoint>,
    obstacles: &[Obstacle],
    wind_field: &WindField,
    default_wind: WindSample,
    polar: &PolarCurve,
    grid_resolution_nm: f64,
    deadline: &Deadline,
) -> Result<RouteGraph, PlanError> {
    let max_edge_nm = grid_resolution_nm * MAX_EDGE_RESOLUTION_FACTOR;
    let n = vertices.len();

    let mut pairs = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
    for u in 0..n {
        for v in (u + 1)..n {
            pairs.push((u, v));
        }
    }

    if deadline.expired() {
        return Err(PlanError::Timeout);
    }

    let directed_edges: Vec<(usize, usize, Edge, Edge)> = pairs
        .par_iter()
        .filter_map(|&(u, v)| {
            let a = vertices[u];
            let b = vertices[v];
            let d = distance_nm(a, b);
            if d > max_edge_nm {
                return None;
            }
            if any_crosses(a, b, obstacles) {
                return None;
            }

            let edge_uv = leg_edge(v, a, b, d, wind_field, default_wind, polar)?;
            let edge_vu = leg_edge(u, b, a, d, wind_field, default_wind, polar)?;
            Some((u, v, edge_uv, edge_vu))
        })
        .collect();

    if deadline.expired() {
        return Err(PlanError::Timeout);
    }

    let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); n];
    for (u, v, edge_uv, edge_vu) in directed_edges {
        adjacency[u].push(edge_uv);
        adjacency[v].push(edge_vu);
    }

    Ok(RouteGraph { vertices, adjacency })
}

/// Leg metadata for traversing from `origin` to `to`, sampling wind at
/// `origin` (the deliberate asymmetry described by the graph builder:
/// the field is coarse enough that this approximation is accepted even
/// though the graph itself is undirected). Returns `None` when the boat
/// cannot sail the leg (`boat_speed == 0`), which discards the edge.
fn leg_edge(
    to: usize,
    origin: GeoPoint,
    destination: GeoPoint,
    distance: f64,
    wind_field: &WindField,
    default_wind: WindSample,
    polar: &PolarCurve,
) -> Option<Edge> {
    let wind = wind_field.wind_at(origin, WindSample { point: origin, ..default_wind });
    let bearing = bearing_deg(origin, destination);
    let twa = fold_twa(bearing - wind.direction_deg);
    let boat_speed = polar.boat_speed(twa, wind.speed_ms);
    if boat_speed <= 0.0 {
        return None;
    }
    Some(Edge {
        to,
        distance_nm: distance,
        bearing_deg: bearing,
        wind,
        boat_speed_kts: boat_speed,
        time_hours: distance / boat_speed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn default_wind() -> WindSample {
        WindSample::new(GeoPoint::new(0.0, 0.0), 5.0, 270.0, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    fn deadline() -> Deadline {
        Deadline::new(std::time::Duration::from_secs(30))
    }

    #[test]
    fn builds_edges_within_range_and_not_crossing_obstacles() {
        let vertices = vec![
            GeoPoint::new(54.50, 18.60),
            GeoPoint::new(54.60, 18.70),
            GeoPoint::new(10.0, 10.0),
        ];
        let field = WindField::default();
        let polar = PolarCurve::default_curve();
        // origin-destination distance is ~7.3 nm; a resolution of 2.0 nm
        // gives max_edge_nm = 10.0 nm, wide enough to connect them while
        // still excluding the far-away third vertex.
        let graph = build_graph(vertices, &[], &field, default_wind(), &polar, 2.0, &deadline()).unwrap();
        assert!(graph.adjacency[0].iter().any(|e| e.to == 1));
        assert!(!graph.adjacency[0].iter().any(|e| e.to == 2));
    }

    #[test]
    fn obstacle_blocks_edge() {
        use crate::obstacle::{Obstacle, ObstacleKind};
        let vertices = vec![GeoPoint::new(54.50, 18.60), GeoPoint::new(54.60, 18.70)];
        let obstacle = Obstacle::new(
            "o1",
            ObstacleKind::Shoal,
            vec![
                GeoPoint::new(54.54, 18.63),
                GeoPoint::new(54.54, 18.67),
                GeoPoint::new(54.56, 18.67),
                GeoPoint::new(54.56, 18.63),
            ],
        );
        let field = WindField::default();
        let polar = PolarCurve::default_curve();
        let graph = build_graph(vertices, &[obstacle], &field, default_wind(), &polar, 5.0, &deadline()).unwrap();
        assert!(graph.adjacency[0].is_empty());
    }

    #[test]
    fn head_to_wind_edge_is_discarded() {
        let vertices = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
        let field = WindField::default();
        let polar = PolarCurve::default_curve();
        // Wind from due east (90deg) blowing toward due west; travelling
        // east (bearing 90) into a wind from 90 is straight upwind.
        let wind = WindSample::new(GeoPoint::new(0.0, 0.0), 10.0, 90.0, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let graph = build_graph(vertices, &[], &field, wind, &polar, 5.0, &deadline()).unwrap();
        assert!(graph.adjacency[0].is_empty());
    }
}
