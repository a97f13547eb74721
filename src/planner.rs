//! Planner facade (C8): the single entry point the outer API invokes.
//! Orchestrates C1-C7 and owns no state between calls.

use crate::astar;
use crate::error::PlanError;
use crate::geo::{bearing_deg, distance_nm};
use crate::graph::{self, RouteGraph};
use crate::model::{Leg, Route, RouteRequest};
use crate::obstacle::Obstacle;
use crate::polar::PolarCurve;
use crate::sampler;
use crate::wind::{WindField, WindSample};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

fn validate(request: &RouteRequest) -> Result<(), PlanError> {
    if !request.origin.is_valid() {
        return Err(PlanError::InvalidRequest("origin coordinates out of range".into()));
    }
    if !request.destination.is_valid() {
        return Err(PlanError::InvalidRequest("destination coordinates out of range".into()));
    }
    if request.origin.lat == request.destination.lat && request.origin.lon == request.destination.lon {
        return Err(PlanError::InvalidRequest("origin equals destination".into()));
    }
    if !(0.1..=2.0).contains(&request.grid_resolution_nm) {
        return Err(PlanError::InvalidRequest("grid_resolution_nm out of [0.1, 2.0]".into()));
    }
    if !(0.5..=10.0).contains(&request.corridor_margin_nm) {
        return Err(PlanError::InvalidRequest("corridor_margin_nm out of [0.5, 10.0]".into()));
    }
    Ok(())
}

/// Builds per-leg metadata for a vertex path, recomputing wind/bearing/
/// speed at each leg's own origin vertex (the graph's undirected adjacency
/// stores both directions, so this is a plain edge lookup, not a re-fetch).
fn build_legs(graph: &RouteGraph, path: &[usize]) -> Vec<Leg> {
    let mut legs = Vec::with_capacity(path.len().saturating_sub(1));
    for w in path.windows(2) {
        let (u, v) = (w[0], w[1]);
        let edge = graph.adjacency[u]
            .iter()
            .find(|e| e.to == v)
            .expect("path edges must exist in the graph that produced them");
        legs.push(Leg {
            from: graph.vertices[u],
            to: graph.vertices[v],
            bearing_deg: edge.bearing_deg,
            distance_nm: edge.distance_nm,
            wind: edge.wind,
            boat_speed_kts: edge.boat_speed_kts,
            time_hours: edge.time_hours,
        });
    }
    legs
}

/// Outcome of a planning attempt. `Fallback` carries both the degenerate
/// straight-line route *and* the `NoRouteFound` signal that produced it, so
/// the caller can decide whether to present the fallback route or treat it
/// as an error (§7: "the facade's caller decides whether to present the
/// fallback or an error") instead of the signal being discarded once the
/// fallback route exists.
#[derive(Debug)]
pub enum PlanOutcome {
    Found(Route),
    Fallback { route: Route, reason: PlanError },
}

impl PlanOutcome {
    /// The route to present regardless of which variant this is.
    pub fn route(&self) -> &Route {
        match self {
            PlanOutcome::Found(route) => route,
            PlanOutcome::Fallback { route, .. } => route,
        }
    }

    pub fn into_route(self) -> Route {
        match self {
            PlanOutcome::Found(route) => route,
            PlanOutcome::Fallback { route, .. } => route,
        }
    }
}

fn fallback_route(
    request: &RouteRequest,
    wind_field: &WindField,
    default_wind: WindSample,
    polar: &PolarCurve,
    calculation_seconds: f64,
) -> Route {
    let origin = request.origin;
    let destination = request.destination;
    let distance = distance_nm(origin, destination);
    let bearing = bearing_deg(origin, destination);
    let wind = wind_field.wind_at(origin, WindSample { point: origin, ..default_wind });
    let twa = crate::geo::fold_twa(bearing - wind.direction_deg);
    let boat_speed = polar.boat_speed(twa, wind.speed_ms);
    let time_hours = if boat_speed > 0.0 {
        distance / boat_speed
    } else {
        f64::INFINITY
    };
    let leg = Leg {
        from: origin,
        to: destination,
        bearing_deg: bearing,
        distance_nm: distance,
        wind,
        boat_speed_kts: boat_speed,
        time_hours,
    };
    Route::from_legs(
        Uuid::new_v4(),
        request.name.clone(),
        vec![origin, destination],
        vec![leg],
        true,
        calculation_seconds,
        wind.timestamp,
    )
}

/// Core entry point: `plan(request, obstacles, wind_field, polar) -> Route`.
pub fn plan(
    request: &RouteRequest,
    obstacles: &[Obstacle],
    wind_field: &WindField,
    polar: &PolarCurve,
) -> Result<PlanOutcome, PlanError> {
    let started = Instant::now();
    validate(request)?;

    let default_wind = WindSample::default_at(request.origin, Utc::now());
    let deadline = request.deadline();

    let seed = sampler::derive_seed(
        request.sampler_seed,
        request.origin,
        request.destination,
        request.grid_resolution_nm,
        request.corridor_margin_nm,
    );
    let vertices = sampler::sample_corridor(
        request.origin,
        request.destination,
        request.grid_resolution_nm,
        request.corridor_margin_nm,
        seed,
        &deadline,
    )?;

    let graph = graph::build_graph(
        vertices,
        obstacles,
        wind_field,
        default_wind,
        polar,
        request.grid_resolution_nm,
        &deadline,
    )?;

    let start = astar::nearest_vertex(&graph, request.origin);
    let goal = astar::nearest_vertex(&graph, request.destination);

    // Tighter and always admissible for this request's own polar curve,
    // rather than the flat default (§4.7 "peak speed × max wind factor is
    // acceptable and tighter").
    let v_ref_kts = polar.max_speed_kts().max(astar::DEFAULT_V_REF_KTS);
    let path = astar::search(&graph, start, goal, v_ref_kts, &deadline)?;

    let calculation_seconds = started.elapsed().as_secs_f64();

    match path {
        Some(vertex_path) => {
            let legs = build_legs(&graph, &vertex_path);
            let waypoints: Vec<_> = vertex_path.iter().map(|&i| graph.vertices[i]).collect();
            let weather_timestamp = legs.first().map(|l| l.wind.timestamp).unwrap_or_else(Utc::now);
            Ok(PlanOutcome::Found(Route::from_legs(
                Uuid::new_v4(),
                request.name.clone(),
                waypoints,
                legs,
                false,
                calculation_seconds,
                weather_timestamp,
            )))
        }
        None => {
            let reason = PlanError::NoRouteFound;
            tracing::warn!("{reason}; returning direct-leg fallback route");
            let route = fallback_route(request, wind_field, default_wind, polar, calculation_seconds);
            Ok(PlanOutcome::Fallback { route, reason })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::obstacle::ObstacleKind;

    fn uniform_wind_field(speed_ms: f64, direction_deg: f64) -> WindField {
        WindField::new(vec![WindSample::new(
            GeoPoint::new(54.55, 18.65),
            speed_ms,
            direction_deg,
            Utc::now(),
        )])
    }

    fn s1_request() -> RouteRequest {
        RouteRequest {
            origin: GeoPoint::new(54.50, 18.60),
            destination: GeoPoint::new(54.60, 18.70),
            grid_resolution_nm: 0.5,
            corridor_margin_nm: 2.0,
            polar: None,
            max_calculation_time_seconds: None,
            sampler_seed: Some(1),
            boat_profile_id: None,
            name: None,
        }
    }

    #[test]
    fn s1_trivial_overwater_leg() {
        let request = s1_request();
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let route = plan(&request, &[], &wind_field, &polar).unwrap().into_route();
        assert!(route.waypoints.len() >= 2);
        let direct = distance_nm(request.origin, request.destination);
        assert!((route.total_distance_nm - direct).abs() / direct < 0.5);
    }

    #[test]
    fn s2_obstacle_forces_detour() {
        let request = s1_request();
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let direct_route = plan(&request, &[], &wind_field, &polar).unwrap().into_route();

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
        let detour_route = plan(&request, std::slice::from_ref(&obstacle), &wind_field, &polar)
            .unwrap()
            .into_route();
        assert!(detour_route.total_distance_nm >= direct_route.total_distance_nm);
        for w in detour_route.waypoints.windows(2) {
            assert!(!crate::obstacle::crosses(w[0], w[1], &obstacle));
        }
    }

    #[test]
    fn s3_upwind_leg_requires_tacking() {
        let request = s1_request();
        // Wind blowing from the same bearing the boat must travel: a dead
        // headwind on the direct S-E line, stalling the default polar at
        // TWA 0 (§4.4 "a result of 0 indicates cannot sail this leg") and
        // forcing the search onto a zig-zag path through other samples.
        let head_on_bearing = bearing_deg(request.origin, request.destination);
        let wind_field = uniform_wind_field(8.0, head_on_bearing);
        let polar = PolarCurve::default_curve();
        let route = plan(&request, &[], &wind_field, &polar).unwrap().into_route();
        assert!(!route.fallback);
        assert!(route.legs.len() >= 2, "a dead-upwind direct leg is unsailable, tacking must emerge");
        for leg in &route.legs {
            let twa = crate::geo::fold_twa(leg.bearing_deg - leg.wind.direction_deg);
            assert!(twa > 30.0, "every leg must bear off the wind by more than 30 degrees, got {twa}");
        }
        let direct_distance = distance_nm(request.origin, request.destination);
        let direct_wind_aligned_time = direct_distance / polar.max_speed_kts();
        assert!(route.total_time_hours > direct_wind_aligned_time);
    }

    #[test]
    fn s5_large_corridor_times_out() {
        // A corridor sized to force well over 1e5 Poisson-disk samples
        // (large margin, fine resolution) under a deadline tight enough
        // that the sampler cannot finish before it expires.
        let mut request = s1_request();
        request.origin = GeoPoint::new(54.30, 18.30);
        request.destination = GeoPoint::new(54.80, 19.00);
        request.grid_resolution_nm = 0.1;
        request.corridor_margin_nm = 10.0;
        request.max_calculation_time_seconds = Some(0);
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let result = plan(&request, &[], &wind_field, &polar);
        assert!(matches!(result, Err(PlanError::Timeout)));
    }

    #[test]
    fn s4_encircled_destination_falls_back() {
        let request = s1_request();
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let e = request.destination;
        let ring = Obstacle::new(
            "ring",
            ObstacleKind::Restricted,
            vec![
                GeoPoint::new(e.lat - 0.02, e.lon - 0.02),
                GeoPoint::new(e.lat - 0.02, e.lon + 0.02),
                GeoPoint::new(e.lat + 0.02, e.lon + 0.02),
                GeoPoint::new(e.lat + 0.02, e.lon - 0.02),
            ],
        );
        let outcome = plan(&request, &[ring], &wind_field, &polar).unwrap();
        assert!(matches!(outcome, PlanOutcome::Fallback { reason: PlanError::NoRouteFound, .. }));
        let route = outcome.into_route();
        assert!(route.fallback);
        assert_eq!(route.waypoints, vec![request.origin, request.destination]);
    }

    #[test]
    fn s6_deterministic_given_same_seed() {
        let request = s1_request();
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let route_a = plan(&request, &[], &wind_field, &polar).unwrap().into_route();
        let route_b = plan(&request, &[], &wind_field, &polar).unwrap().into_route();
        assert_eq!(route_a.waypoints, route_b.waypoints);
    }

    #[test]
    fn rejects_origin_equal_destination() {
        let mut request = s1_request();
        request.destination = request.origin;
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let result = plan(&request, &[], &wind_field, &polar);
        assert!(matches!(result, Err(PlanError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_out_of_range_resolution() {
        let mut request = s1_request();
        request.grid_resolution_nm = 5.0;
        let wind_field = uniform_wind_field(5.0, 270.0);
        let polar = PolarCurve::default_curve();
        let result = plan(&request, &[], &wind_field, &polar);
        assert!(matches!(result, Err(PlanError::InvalidRequest(_))));
    }
}
