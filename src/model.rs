//! Request/response data model shared across the core components.

use crate::geo::GeoPoint;
use crate::polar::PolarCurve;
use crate::wind::WindSample;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const DEFAULT_GRID_RESOLUTION_NM: f64 = 0.5;
pub const DEFAULT_CORRIDOR_MARGIN_NM: f64 = 2.0;
pub const DEFAULT_MAX_CALCULATION_TIME_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    #[serde(default = "default_resolution")]
    pub grid_resolution_nm: f64,
    #[serde(default = "default_margin")]
    pub corridor_margin_nm: f64,
    #[serde(default)]
    pub polar: Option<PolarCurve>,
    #[serde(default)]
    pub max_calculation_time_seconds: Option<u64>,
    #[serde(default)]
    pub sampler_seed: Option<u64>,
    #[serde(default)]
    pub boat_profile_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_resolution() -> f64 {
    DEFAULT_GRID_RESOLUTION_NM
}

fn default_margin() -> f64 {
    DEFAULT_CORRIDOR_MARGIN_NM
}

impl RouteRequest {
    /// `(north, south, east, west)` bounds buffered by the corridor margin,
    /// used for fetching obstacles/weather ahead of sampling.
    pub fn buffered_bounds(&self) -> (f64, f64, f64, f64) {
        let margin_deg = crate::geo::nm_to_degrees(self.corridor_margin_nm) * 1.5;
        let north = self.origin.lat.max(self.destination.lat) + margin_deg;
        let south = self.origin.lat.min(self.destination.lat) - margin_deg;
        let east = self.origin.lon.max(self.destination.lon) + margin_deg;
        let west = self.origin.lon.min(self.destination.lon) - margin_deg;
        (north, south, east, west)
    }

    pub fn deadline(&self) -> Deadline {
        let secs = self
            .max_calculation_time_seconds
            .unwrap_or(DEFAULT_MAX_CALCULATION_TIME_SECONDS);
        Deadline::new(Duration::from_secs(secs))
    }
}

/// Wall-clock deadline checked between iterations of the sampler and the
/// A* search. Carries no state beyond a start instant and a budget, so it
/// is cheap to check frequently.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub bearing_deg: f64,
    pub distance_nm: f64,
    pub wind: WindSample,
    pub boat_speed_kts: f64,
    pub time_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub name: Option<String>,
    pub waypoints: Vec<GeoPoint>,
    pub legs: Vec<Leg>,
    pub total_distance_nm: f64,
    pub total_time_hours: f64,
    pub max_wind_speed_ms: f64,
    pub avg_wind_speed_ms: f64,
    pub fallback: bool,
    pub calculation_seconds: f64,
    pub weather_timestamp: chrono::DateTime<chrono::Utc>,
}

impl Route {
    pub fn from_legs(
        id: Uuid,
        name: Option<String>,
        waypoints: Vec<GeoPoint>,
        legs: Vec<Leg>,
        fallback: bool,
        calculation_seconds: f64,
        weather_timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let total_distance_nm = legs.iter().map(|l| l.distance_nm).sum();
        let total_time_hours = legs.iter().map(|l| l.time_hours).sum();
        let max_wind_speed_ms = legs
            .iter()
            .map(|l| l.wind.speed_ms)
            .fold(0.0_f64, f64::max);
        let avg_wind_speed_ms = if legs.is_empty() {
            0.0
        } else {
            legs.iter().map(|l| l.wind.speed_ms).sum::<f64>() / legs.len() as f64
        };
        Self {
            id,
            name,
            waypoints,
            legs,
            total_distance_nm,
            total_time_hours,
            max_wind_speed_ms,
            avg_wind_speed_ms,
            fallback,
            calculation_seconds,
            weather_timestamp,
        }
    }
}
