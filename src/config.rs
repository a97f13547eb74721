//! Configuration loading (A1): environment/`.env`-driven settings shared
//! read-only through the application state. Unlike the HTTP layer's own
//! tunables, the core planner never reads configuration directly — every
//! knob reaches it as an explicit `RouteRequest` field or an
//! adapter-constructed value.

use crate::geo::GeoPoint;
use std::env;

/// Default operating-area rectangle: Gdańsk Bay.
#[derive(Debug, Clone, Copy)]
pub struct OperatingArea {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl OperatingArea {
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south && point.lat <= self.north && point.lon >= self.west && point.lon <= self.east
    }
}

impl Default for OperatingArea {
    fn default() -> Self {
        Self {
            north: 54.8,
            south: 54.3,
            east: 19.0,
            west: 18.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub listen_addr: String,
    pub allowed_origins: Vec<String>,
    pub default_grid_resolution_nm: f64,
    pub default_corridor_margin_nm: f64,
    pub max_calculation_time_seconds: u64,
    pub operating_area: OperatingArea,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Settings {
    /// Loads settings from the process environment, first loading a
    /// `.env` file if one is present (a missing file is not an error).
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let postgres_user = env_or("POSTGRES_USER", "sailroute");
        let postgres_password = env_or("POSTGRES_PASSWORD", "sailroute");
        let postgres_host = env_or("POSTGRES_HOST", "localhost");
        let postgres_port = env_or("POSTGRES_PORT", "5432");
        let postgres_db = env_or("POSTGRES_DB", "sailroute");
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "postgres://{postgres_user}:{postgres_password}@{postgres_host}:{postgres_port}/{postgres_db}"
            )
        });

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Self {
            database_url,
            weather_api_key: env::var("OPENWEATHER_API_KEY").ok().filter(|s| !s.is_empty()),
            weather_base_url: env_or(
                "OPENWEATHER_BASE_URL",
                "https://api.openweathermap.org/data/2.5",
            ),
            listen_addr: env_or("SAILROUTE_LISTEN_ADDR", "0.0.0.0:8080"),
            allowed_origins,
            default_grid_resolution_nm: env_f64("DEFAULT_GRID_RESOLUTION_NM", 0.5),
            default_corridor_margin_nm: env_f64("DEFAULT_CORRIDOR_MARGIN_NM", 2.0),
            max_calculation_time_seconds: env_u64("MAX_ROUTE_CALCULATION_TIME", 30),
            operating_area: OperatingArea::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_operating_area_matches_gdansk_bay_bounds() {
        let area = OperatingArea::default();
        assert_eq!(area.north, 54.8);
        assert_eq!(area.south, 54.3);
        assert_eq!(area.east, 19.0);
        assert_eq!(area.west, 18.3);
    }

    #[test]
    fn operating_area_contains_rejects_outside_points() {
        let area = OperatingArea::default();
        assert!(area.contains(GeoPoint::new(54.5, 18.6)));
        assert!(!area.contains(GeoPoint::new(50.0, 10.0)));
    }
}
