//! HTTP surface (A2): the only outer entry point into `planner::plan`.
//! Thin by design — request validation against the configured operating
//! area, adapter fan-out for obstacles/wind/polar, and response shaping.
//! Everything it touches (persistence, weather, GPX) is a collaborator
//! specified only where the core depends on it.

use crate::adapters::{Bounds, ObstacleSource, PolarRepository, WindProvider};
use crate::config::Settings;
use crate::db::Db;
use crate::error::PlanError;
use crate::gpx;
use crate::model::{Route, RouteRequest};
use crate::planner;
use crate::polar::PolarCurve;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub struct AppState {
    pub settings: Settings,
    pub db: Option<Db>,
    pub obstacle_source: Arc<dyn ObstacleSource>,
    pub wind_provider: Arc<dyn WindProvider>,
    pub polar_repository: Arc<dyn PolarRepository>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/routes/calculate", post(create_route))
        .route("/api/routes", get(list_routes))
        .route("/api/routes/:id", get(get_route).delete(delete_route))
        .route("/api/routes/:id/gpx", get(get_route_gpx))
        .route("/api/boat-profiles", get(list_boat_profiles))
        .route("/api/obstacles", get(list_obstacles))
        .route("/api/weather", get(get_weather))
        .route("/api/statistics", get(get_statistics))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[derive(Debug)]
struct ApiError(PlanError);

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorBody {
            error: self.0.code(),
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let db_ok = match &state.db {
        Some(db) => db.health_check().await,
        None => true,
    };
    Json(serde_json::json!({ "status": if db_ok { "ok" } else { "degraded" }, "database": db_ok }))
}

/// Rejects a request whose origin or destination falls outside the
/// configured operating area (§6 "policy, enforced at the adapter" — the
/// core itself accepts any valid coordinates).
fn enforce_operating_area(settings: &Settings, request: &RouteRequest) -> Result<(), ApiError> {
    let area = settings.operating_area;
    if !area.contains(request.origin) || !area.contains(request.destination) {
        return Err(ApiError(PlanError::InvalidRequest(
            "origin and destination must lie within the configured operating area".into(),
        )));
    }
    Ok(())
}

async fn resolve_polar(state: &AppState, request: &RouteRequest) -> Result<PolarCurve, ApiError> {
    if let Some(curve) = &request.polar {
        return Ok(curve.clone());
    }
    if let Some(profile_id) = request.boat_profile_id
        && let Some(curve) = state.polar_repository.fetch(profile_id).await?
    {
        return Ok(curve);
    }
    Ok(PolarCurve::default_curve())
}

async fn create_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<Route>, ApiError> {
    enforce_operating_area(&state.settings, &request)?;

    let (north, south, east, west) = request.buffered_bounds();
    let bounds = Bounds { north, south, east, west };

    let (obstacles, wind_field, polar) = tokio::try_join!(
        fetch_obstacles(&state, &bounds),
        fetch_wind(&state, &bounds),
        resolve_polar_result(&state, &request),
    )?;

    let planned = planner::plan(&request, &obstacles, &wind_field, &polar);

    if let Some(db) = &state.db {
        let (route_id, outcome, error_message, duration) = match &planned {
            Ok(planner::PlanOutcome::Found(route)) => (Some(route.id), "ok", None, route.calculation_seconds),
            // The core surfaces `NoRouteFound` alongside the fallback route rather than
            // erroring outright (§7); the HTTP layer is the caller that decides here to
            // present the fallback as a degraded-but-successful 200, logged distinctly
            // from both a clean solve and a hard error.
            Ok(planner::PlanOutcome::Fallback { route, reason }) => {
                (Some(route.id), "fallback", Some(reason.to_string()), route.calculation_seconds)
            }
            Err(e) => (None, "error", Some(e.to_string()), 0.0),
        };
        if let Err(e) = db
            .log_calculation(route_id, obstacles.len() as i32, outcome, error_message.as_deref(), duration)
            .await
        {
            tracing::warn!("failed to persist calculation log: {e}");
        }
    }

    let route = planned?.into_route();

    if let Some(db) = &state.db
        && let Err(e) = db.save_route(&route, &request).await
    {
        tracing::warn!("failed to persist computed route {}: {e}", route.id);
    }

    Ok(Json(route))
}

// `try_join!` requires every branch to share a single error type; these
// thin wrappers adapt the fallible obstacle/polar lookups and the
// infallible wind fetch to `Result<_, ApiError>`.
async fn fetch_obstacles(state: &AppState, bounds: &Bounds) -> Result<Vec<crate::obstacle::Obstacle>, ApiError> {
    Ok(state.obstacle_source.fetch(bounds).await?)
}

async fn fetch_wind(state: &AppState, bounds: &Bounds) -> Result<crate::wind::WindField, ApiError> {
    Ok(state.wind_provider.fetch(bounds).await)
}

async fn resolve_polar_result(state: &AppState, request: &RouteRequest) -> Result<PolarCurve, ApiError> {
    resolve_polar(state, request).await
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

async fn list_routes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<crate::db::RouteSummary>>, ApiError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| ApiError(PlanError::PersistenceUnavailable("no database configured".into())))?;
    let routes = db.list_routes(query.limit, query.offset).await?;
    Ok(Json(routes))
}

async fn get_route(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Json<Route>, ApiError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| ApiError(PlanError::PersistenceUnavailable("no database configured".into())))?;
    let persisted = db
        .get_route(id)
        .await?
        .ok_or_else(|| ApiError(PlanError::InvalidRequest(format!("no route with id {id}"))))?;
    Ok(Json(persisted.route))
}

async fn get_route_gpx(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| ApiError(PlanError::PersistenceUnavailable("no database configured".into())))?;
    let persisted = db
        .get_route(id)
        .await?
        .ok_or_else(|| ApiError(PlanError::InvalidRequest(format!("no route with id {id}"))))?;
    let xml = gpx::to_gpx(&persisted.route);
    Ok((
        [(header::CONTENT_TYPE, "application/gpx+xml")],
        xml,
    )
        .into_response())
}

async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| ApiError(PlanError::PersistenceUnavailable("no database configured".into())))?;
    let deleted = db.delete_route(id).await?;
    Ok(if deleted { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}

async fn list_boat_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<crate::db::BoatProfileRow>>, ApiError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| ApiError(PlanError::PersistenceUnavailable("no database configured".into())))?;
    Ok(Json(db.list_boat_profiles().await?))
}

/// `north,south,east,west` as a single comma-separated query parameter.
#[derive(Deserialize)]
struct BoundsQuery {
    bounds: String,
}

fn parse_bounds(raw: &str) -> Result<Bounds, ApiError> {
    let parts: Vec<f64> = raw.split(',').filter_map(|s| s.trim().parse().ok()).collect();
    let [north, south, east, west] = parts[..] else {
        return Err(ApiError(PlanError::InvalidRequest(
            "bounds must be north,south,east,west".into(),
        )));
    };
    Ok(Bounds { north, south, east, west })
}

fn enforce_operating_area_bounds(settings: &Settings, bounds: &Bounds) -> Result<(), ApiError> {
    let area = settings.operating_area;
    let corners = [
        crate::geo::GeoPoint::new(bounds.north, bounds.east),
        crate::geo::GeoPoint::new(bounds.south, bounds.west),
    ];
    if corners.iter().any(|p| !area.contains(*p)) {
        return Err(ApiError(PlanError::InvalidRequest(
            "bounds must lie within the configured operating area".into(),
        )));
    }
    Ok(())
}

async fn list_obstacles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BoundsQuery>,
) -> Result<Json<Vec<crate::obstacle::Obstacle>>, ApiError> {
    let bounds = parse_bounds(&query.bounds)?;
    enforce_operating_area_bounds(&state.settings, &bounds)?;
    Ok(Json(state.obstacle_source.fetch(&bounds).await?))
}

async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BoundsQuery>,
) -> Result<Json<crate::wind::WindField>, ApiError> {
    let bounds = parse_bounds(&query.bounds)?;
    enforce_operating_area_bounds(&state.settings, &bounds)?;
    Ok(Json(state.wind_provider.fetch(&bounds).await))
}

#[derive(Serialize)]
struct Statistics {
    total_routes: i64,
    calculation_outcomes: std::collections::HashMap<String, i64>,
}

async fn get_statistics(State(state): State<Arc<AppState>>) -> Result<Json<Statistics>, ApiError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| ApiError(PlanError::PersistenceUnavailable("no database configured".into())))?;
    let total_routes = db.count_routes().await?;
    let calculation_outcomes = db.count_calculation_logs_by_outcome().await?.into_iter().collect();
    Ok(Json(Statistics { total_routes, calculation_outcomes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatingArea;
    use crate::geo::GeoPoint;

    fn req(origin: GeoPoint, destination: GeoPoint) -> RouteRequest {
        RouteRequest {
            origin,
            destination,
            grid_resolution_nm: 0.5,
            corridor_margin_nm: 2.0,
            polar: None,
            max_calculation_time_seconds: None,
            sampler_seed: None,
            boat_profile_id: None,
            name: None,
        }
    }

    #[test]
    fn rejects_requests_outside_the_operating_area() {
        let settings = Settings {
            operating_area: OperatingArea::default(),
            ..test_settings()
        };
        let outside = req(GeoPoint::new(54.5, 18.6), GeoPoint::new(10.0, 10.0));
        assert!(enforce_operating_area(&settings, &outside).is_err());
    }

    #[test]
    fn accepts_requests_inside_the_operating_area() {
        let settings = test_settings();
        let inside = req(GeoPoint::new(54.5, 18.6), GeoPoint::new(54.6, 18.7));
        assert!(enforce_operating_area(&settings, &inside).is_ok());
    }

    fn test_settings() -> Settings {
        Settings {
            database_url: String::new(),
            weather_api_key: None,
            weather_base_url: String::new(),
            listen_addr: String::new(),
            allowed_origins: vec![],
            default_grid_resolution_nm: 0.5,
            default_corridor_margin_nm: 2.0,
            max_calculation_time_seconds: 30,
            operating_area: OperatingArea::default(),
        }
    }

    #[test]
    fn parses_well_formed_bounds() {
        let bounds = parse_bounds("54.8, 54.3, 19.0, 18.3").unwrap();
        assert_eq!((bounds.north, bounds.south, bounds.east, bounds.west), (54.8, 54.3, 19.0, 18.3));
    }

    #[test]
    fn rejects_malformed_bounds() {
        assert!(parse_bounds("54.8,54.3").is_err());
    }

    #[test]
    fn rejects_bounds_outside_the_operating_area() {
        let settings = test_settings();
        let bounds = Bounds { north: 60.0, south: 59.0, east: 20.0, west: 19.0 };
        assert!(enforce_operating_area_bounds(&settings, &bounds).is_err());
    }

    #[test]
    fn accepts_bounds_inside_the_operating_area() {
        let settings = test_settings();
        let bounds = Bounds { north: 54.7, south: 54.4, east: 18.9, west: 18.4 };
        assert!(enforce_operating_area_bounds(&settings, &bounds).is_ok());
    }
}
