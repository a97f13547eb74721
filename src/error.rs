//! Domain error hierarchy. Core errors (the four kinds the planner itself
//! raises) and ambient adapter errors share one enum so that an adapter
//! outage is distinguishable from a planning failure in logs while both map
//! to a sensible HTTP status at the boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no route found between origin and destination")]
    NoRouteFound,

    #[error("route calculation exceeded its deadline")]
    Timeout,

    #[error("internal invariant violation: {0}")]
    Internal(String),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("upstream weather provider unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl PlanError {
    /// HTTP status code an adapter should map this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            PlanError::InvalidRequest(_) => 400,
            PlanError::NoRouteFound => 404,
            PlanError::Timeout => 408,
            PlanError::Internal(_) => 500,
            PlanError::PersistenceUnavailable(_) => 503,
            PlanError::UpstreamUnavailable(_) => 502,
        }
    }

    /// Stable machine-readable error code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::InvalidRequest(_) => "invalid_request",
            PlanError::NoRouteFound => "no_route_found",
            PlanError::Timeout => "timeout",
            PlanError::Internal(_) => "internal",
            PlanError::PersistenceUnavailable(_) => "persistence_unavailable",
            PlanError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}
