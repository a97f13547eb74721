//! Persistence (A3): a PostGIS-backed store for routes, waypoints,
//! obstacles, boat profiles and calculation logs. Migration and every
//! write here are best-effort — a failure is logged and, outside the
//! read-path endpoints whose entire purpose is returning persisted data,
//! never blocks a response (§7 "persistence failure is non-fatal").

mod routes;

pub use routes::{PersistedRoute, RouteSummary};

use crate::error::PlanError;
use crate::model::Route;
use crate::obstacle::Obstacle;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS postgis;

CREATE TABLE IF NOT EXISTS obstacles (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    polygon GEOGRAPHY(POLYGON, 4326) NOT NULL,
    min_depth_m DOUBLE PRECISION
);

CREATE TABLE IF NOT EXISTS boat_profiles (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    polar_data JSONB NOT NULL,
    max_wind_speed_ms DOUBLE PRECISION,
    min_depth_m DOUBLE PRECISION
);

CREATE TABLE IF NOT EXISTS routes (
    id UUID PRIMARY KEY,
    name TEXT,
    start_point GEOGRAPHY(POINT, 4326) NOT NULL,
    end_point GEOGRAPHY(POINT, 4326) NOT NULL,
    geometry GEOGRAPHY(LINESTRING, 4326) NOT NULL,
    distance_nm DOUBLE PRECISION NOT NULL,
    estimated_time_hours DOUBLE PRECISION NOT NULL,
    max_wind_speed_ms DOUBLE PRECISION NOT NULL,
    avg_wind_speed_ms DOUBLE PRECISION NOT NULL,
    boat_profile_id UUID,
    grid_resolution_nm DOUBLE PRECISION NOT NULL,
    corridor_margin_nm DOUBLE PRECISION NOT NULL,
    calculation_time_seconds DOUBLE PRECISION NOT NULL,
    weather_timestamp TIMESTAMPTZ NOT NULL,
    fallback BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS waypoints (
    id BIGSERIAL PRIMARY KEY,
    route_id UUID NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
    sequence INTEGER NOT NULL,
    point GEOGRAPHY(POINT, 4326) NOT NULL,
    bearing_to_next DOUBLE PRECISION,
    distance_to_next_nm DOUBLE PRECISION,
    estimated_time_to_next_hours DOUBLE PRECISION,
    wind_speed_ms DOUBLE PRECISION,
    wind_direction_deg DOUBLE PRECISION,
    boat_speed_kts DOUBLE PRECISION
);

CREATE TABLE IF NOT EXISTS route_alternatives (
    id BIGSERIAL PRIMARY KEY,
    route_id UUID NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
    geometry GEOGRAPHY(LINESTRING, 4326) NOT NULL,
    distance_nm DOUBLE PRECISION NOT NULL,
    estimated_time_hours DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS route_calculation_logs (
    id BIGSERIAL PRIMARY KEY,
    route_id UUID,
    grid_points_count INTEGER,
    outcome TEXT NOT NULL,
    error_message TEXT,
    duration_seconds DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(database_url: &str) -> Result<Self, PlanError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Idempotent schema creation. A failure here is logged and does not
    /// prevent the service from starting.
    pub async fn migrate(&self) -> Result<(), PlanError> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }
            sqlx::query(trimmed)
                .execute(&self.pool)
                .await
                .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn save_route(&self, route: &Route, request: &crate::model::RouteRequest) -> Result<(), PlanError> {
        routes::save_route(&self.pool, route, request).await
    }

    pub async fn get_route(&self, id: Uuid) -> Result<Option<PersistedRoute>, PlanError> {
        routes::get_route(&self.pool, id).await
    }

    pub async fn list_routes(&self, limit: i64, offset: i64) -> Result<Vec<RouteSummary>, PlanError> {
        routes::list_routes(&self.pool, limit, offset).await
    }

    pub async fn delete_route(&self, id: Uuid) -> Result<bool, PlanError> {
        routes::delete_route(&self.pool, id).await
    }

    pub async fn count_routes(&self) -> Result<i64, PlanError> {
        routes::count_routes(&self.pool).await
    }

    pub async fn count_calculation_logs_by_outcome(&self) -> Result<Vec<(String, i64)>, PlanError> {
        routes::count_calculation_logs_by_outcome(&self.pool).await
    }

    pub async fn log_calculation(
        &self,
        route_id: Option<Uuid>,
        grid_points_count: i32,
        outcome: &str,
        error_message: Option<&str>,
        duration_seconds: f64,
    ) -> Result<(), PlanError> {
        sqlx::query(
            "INSERT INTO route_calculation_logs (route_id, grid_points_count, outcome, error_message, duration_seconds) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(route_id)
        .bind(grid_points_count)
        .bind(outcome)
        .bind(error_message)
        .bind(duration_seconds)
        .execute(&self.pool)
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
        Ok(())
    }

    pub async fn fetch_obstacles(
        &self,
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    ) -> Result<Vec<Obstacle>, PlanError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: String,
            kind: String,
            min_depth_m: Option<f64>,
            ring_wkt: String,
        }

        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT id, kind, min_depth_m,
                   ST_AsText(polygon::geometry) as ring_wkt
            FROM obstacles
            WHERE ST_Intersects(
                polygon,
                ST_MakeEnvelope($1, $2, $3, $4, 4326)::geography
            )
            "#,
        )
        .bind(west)
        .bind(south)
        .bind(east)
        .bind(north)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|r| parse_polygon_wkt(&r.ring_wkt).map(|ring| Obstacle {
                id: r.id,
                kind: parse_kind(&r.kind),
                ring,
                min_depth_m: r.min_depth_m,
            }))
            .collect())
    }

    pub async fn list_boat_profiles(&self) -> Result<Vec<BoatProfileRow>, PlanError> {
        sqlx::query_as("SELECT id, name, polar_data, max_wind_speed_ms, min_depth_m FROM boat_profiles")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))
    }
}

#[derive(sqlx::FromRow, Debug, Clone, serde::Serialize)]
pub struct BoatProfileRow {
    pub id: Uuid,
    pub name: String,
    pub polar_data: serde_json::Value,
    pub max_wind_speed_ms: Option<f64>,
    pub min_depth_m: Option<f64>,
}

fn parse_kind(kind: &str) -> crate::obstacle::ObstacleKind {
    use crate::obstacle::ObstacleKind::*;
    match kind {
        "island" => Island,
        "platform" => Platform,
        "restricted" => Restricted,
        _ => Shoal,
    }
}

/// Parses a WKT `POLYGON((lon lat, lon lat, ...))` ring into GeoPoints.
/// PostGIS returns the ring closed (first point repeated last); that
/// trailing duplicate is dropped.
fn parse_polygon_wkt(wkt: &str) -> Option<Vec<crate::geo::GeoPoint>> {
    let inner = wkt
        .trim()
        .strip_prefix("POLYGON((")?
        .strip_suffix("))")?;
    let mut points: Vec<crate::geo::GeoPoint> = inner
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.split_whitespace();
            let lon: f64 = parts.next()?.parse().ok()?;
            let lat: f64 = parts.next()?.parse().ok()?;
            Some(crate::geo::GeoPoint::new(lat, lon))
        })
        .collect();
    if points.len() >= 2 && points.first() == points.last() {
        points.pop();
    }
    Some(points)
}
