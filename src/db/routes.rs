//! Route/waypoint persistence, split out from `db::Db` for readability.

use crate::error::PlanError;
use crate::geo::GeoPoint;
use crate::model::{Leg, Route, RouteRequest};
use crate::wind::WindSample;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    name: Option<String>,
    distance_nm: f64,
    estimated_time_hours: f64,
    max_wind_speed_ms: f64,
    avg_wind_speed_ms: f64,
    calculation_time_seconds: f64,
    weather_timestamp: DateTime<Utc>,
    fallback: bool,
}

#[derive(sqlx::FromRow)]
struct WaypointRow {
    #[allow(dead_code)]
    sequence: i32,
    lat: f64,
    lon: f64,
    bearing_to_next: Option<f64>,
    distance_to_next_nm: Option<f64>,
    estimated_time_to_next_hours: Option<f64>,
    wind_speed_ms: Option<f64>,
    wind_direction_deg: Option<f64>,
    boat_speed_kts: Option<f64>,
}

/// A route as read back from storage, with its waypoints re-expanded into
/// per-leg metadata. Reconstructs `Leg` entries from the persisted
/// per-waypoint columns rather than recomputing wind/geometry, since the
/// database is the source of truth once a route has been recorded.
pub struct PersistedRoute {
    pub route: Route,
}

#[derive(serde::Serialize)]
pub struct RouteSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub distance_nm: f64,
    pub estimated_time_hours: f64,
    pub created_at: DateTime<Utc>,
}

fn linestring_wkt(waypoints: &[GeoPoint]) -> String {
    let points: Vec<String> = waypoints.iter().map(|p| format!("{} {}", p.lon, p.lat)).collect();
    format!("LINESTRING({})", points.join(", "))
}

fn point_wkt(p: GeoPoint) -> String {
    format!("POINT({} {})", p.lon, p.lat)
}

pub async fn save_route(pool: &PgPool, route: &Route, request: &RouteRequest) -> Result<(), PlanError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO routes (
            id, name, start_point, end_point, geometry,
            distance_nm, estimated_time_hours, max_wind_speed_ms, avg_wind_speed_ms,
            boat_profile_id, grid_resolution_nm, corridor_margin_nm,
            calculation_time_seconds, weather_timestamp, fallback
        ) VALUES (
            $1, $2, ST_GeogFromText($3), ST_GeogFromText($4), ST_GeogFromText($5),
            $6, $7, $8, $9,
            $10, $11, $12,
            $13, $14, $15
        )
        "#,
    )
    .bind(route.id)
    .bind(&route.name)
    .bind(point_wkt(request.origin))
    .bind(point_wkt(request.destination))
    .bind(linestring_wkt(&route.waypoints))
    .bind(route.total_distance_nm)
    .bind(route.total_time_hours)
    .bind(route.max_wind_speed_ms)
    .bind(route.avg_wind_speed_ms)
    .bind(request.boat_profile_id)
    .bind(request.grid_resolution_nm)
    .bind(request.corridor_margin_nm)
    .bind(route.calculation_seconds)
    .bind(route.weather_timestamp)
    .bind(route.fallback)
    .execute(&mut *tx)
    .await
    .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;

    for (i, point) in route.waypoints.iter().enumerate() {
        let leg = route.legs.get(i);
        sqlx::query(
            r#"
            INSERT INTO waypoints (
                route_id, sequence, point, bearing_to_next, distance_to_next_nm,
                estimated_time_to_next_hours, wind_speed_ms, wind_direction_deg, boat_speed_kts
            ) VALUES ($1, $2, ST_GeogFromText($3), $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(route.id)
        .bind(i as i32)
        .bind(point_wkt(*point))
        .bind(leg.map(|l| l.bearing_deg))
        .bind(leg.map(|l| l.distance_nm))
        .bind(leg.map(|l| l.time_hours))
        .bind(leg.map(|l| l.wind.speed_ms))
        .bind(leg.map(|l| l.wind.direction_deg))
        .bind(leg.map(|l| l.boat_speed_kts))
        .execute(&mut *tx)
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
    }

    tx.commit().await.map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
    Ok(())
}

pub async fn get_route(pool: &PgPool, id: Uuid) -> Result<Option<PersistedRoute>, PlanError> {
    let route_row: Option<RouteRow> = sqlx::query_as(
        "SELECT id, name, distance_nm, estimated_time_hours, max_wind_speed_ms, avg_wind_speed_ms, calculation_time_seconds, weather_timestamp, fallback FROM routes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;

    let Some(row) = route_row else {
        return Ok(None);
    };

    let waypoint_rows: Vec<WaypointRow> = sqlx::query_as(
        r#"
        SELECT sequence, ST_Y(point::geometry) as lat, ST_X(point::geometry) as lon,
               bearing_to_next, distance_to_next_nm, estimated_time_to_next_hours,
               wind_speed_ms, wind_direction_deg, boat_speed_kts
        FROM waypoints WHERE route_id = $1 ORDER BY sequence ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;

    let mut waypoints = Vec::with_capacity(waypoint_rows.len());
    let mut legs = Vec::new();
    for (i, wp) in waypoint_rows.iter().enumerate() {
        let point = GeoPoint::new(wp.lat, wp.lon);
        waypoints.push(point);
        if let Some(next) = waypoint_rows.get(i + 1) {
            legs.push(Leg {
                from: point,
                to: GeoPoint::new(next.lat, next.lon),
                bearing_deg: wp.bearing_to_next.unwrap_or(0.0),
                distance_nm: wp.distance_to_next_nm.unwrap_or(0.0),
                wind: WindSample::new(
                    point,
                    wp.wind_speed_ms.unwrap_or(0.0),
                    wp.wind_direction_deg.unwrap_or(0.0),
                    row.weather_timestamp,
                ),
                boat_speed_kts: wp.boat_speed_kts.unwrap_or(0.0),
                time_hours: wp.estimated_time_to_next_hours.unwrap_or(0.0),
            });
        }
    }

    let route = Route {
        id: row.id,
        name: row.name,
        waypoints,
        legs,
        total_distance_nm: row.distance_nm,
        total_time_hours: row.estimated_time_hours,
        max_wind_speed_ms: row.max_wind_speed_ms,
        avg_wind_speed_ms: row.avg_wind_speed_ms,
        fallback: row.fallback,
        calculation_seconds: row.calculation_time_seconds,
        weather_timestamp: row.weather_timestamp,
    };

    Ok(Some(PersistedRoute { route }))
}

pub async fn list_routes(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<RouteSummary>, PlanError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: Uuid,
        name: Option<String>,
        distance_nm: f64,
        estimated_time_hours: f64,
        created_at: DateTime<Utc>,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "SELECT id, name, distance_nm, estimated_time_hours, created_at FROM routes ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|r| RouteSummary {
            id: r.id,
            name: r.name,
            distance_nm: r.distance_nm,
            estimated_time_hours: r.estimated_time_hours,
            created_at: r.created_at,
        })
        .collect())
}

pub async fn delete_route(pool: &PgPool, id: Uuid) -> Result<bool, PlanError> {
    let result = sqlx::query("DELETE FROM routes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_routes(pool: &PgPool) -> Result<i64, PlanError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM routes")
        .fetch_one(pool)
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))?;
    Ok(count)
}

/// Per-outcome counts from `route_calculation_logs` (e.g. `ok`, `fallback`,
/// `error`), for the statistics endpoint's aggregate over calculation logs
/// alongside persisted routes.
pub async fn count_calculation_logs_by_outcome(pool: &PgPool) -> Result<Vec<(String, i64)>, PlanError> {
    sqlx::query_as("SELECT outcome, COUNT(*) FROM route_calculation_logs GROUP BY outcome")
        .fetch_all(pool)
        .await
        .map_err(|e| PlanError::PersistenceUnavailable(e.to_string()))
}
