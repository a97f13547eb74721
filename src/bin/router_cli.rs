//! Offline CLI debugger: computes a route directly against the core
//! planner, without the HTTP surface or persistence. Useful for exercising
//! the sampler/graph/search pipeline against a uniform wind field.

use clap::Parser;
use sailroute::geo::GeoPoint;
use sailroute::gpx;
use sailroute::model::RouteRequest;
use sailroute::planner;
use sailroute::polar::PolarCurve;
use sailroute::wind::{WindField, WindSample};
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Plan a time-optimal sailing route offline, against a uniform wind field")]
struct Args {
    #[arg(long, allow_hyphen_values = true)]
    origin_lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    origin_lon: f64,
    #[arg(long, allow_hyphen_values = true)]
    dest_lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    dest_lon: f64,

    #[arg(long, default_value_t = 5.0)]
    wind_speed_ms: f64,
    #[arg(long, default_value_t = 270.0)]
    wind_direction_deg: f64,

    #[arg(long, default_value_t = 0.5)]
    grid_resolution_nm: f64,
    #[arg(long, default_value_t = 2.0)]
    corridor_margin_nm: f64,
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    gpx: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let request = RouteRequest {
        origin: GeoPoint::new(args.origin_lat, args.origin_lon),
        destination: GeoPoint::new(args.dest_lat, args.dest_lon),
        grid_resolution_nm: args.grid_resolution_nm,
        corridor_margin_nm: args.corridor_margin_nm,
        polar: None,
        max_calculation_time_seconds: None,
        sampler_seed: args.seed,
        boat_profile_id: None,
        name: Some("cli route".to_string()),
    };

    let wind_field = WindField::new(vec![WindSample::new(
        request.origin,
        args.wind_speed_ms,
        args.wind_direction_deg,
        chrono::Utc::now(),
    )]);
    let polar = PolarCurve::default_curve();

    let started = Instant::now();
    match planner::plan(&request, &[], &wind_field, &polar) {
        Ok(outcome) => {
            if let planner::PlanOutcome::Fallback { reason, .. } = &outcome {
                eprintln!("warning: {reason}; showing direct-leg fallback route");
            }
            let route = outcome.into_route();
            println!(
                "route: {} waypoints, {:.2} nm, {:.2} h (fallback={}), computed in {:?}",
                route.waypoints.len(),
                route.total_distance_nm,
                route.total_time_hours,
                route.fallback,
                started.elapsed()
            );
            for (i, leg) in route.legs.iter().enumerate() {
                println!(
                    "  leg {i}: {:.1} nm @ {:.0}\u{b0}, wind {:.1} m/s from {:.0}\u{b0}, boat speed {:.2} kts, {:.2} h",
                    leg.distance_nm, leg.bearing_deg, leg.wind.speed_ms, leg.wind.direction_deg, leg.boat_speed_kts, leg.time_hours
                );
            }
            if args.gpx {
                println!("\n{}", gpx::to_gpx(&route));
            }
        }
        Err(e) => {
            eprintln!("planning failed: {e}");
            std::process::exit(1);
        }
    }
}
