//! Adapter contracts consumed by the core (§6): narrow traits the facade's
//! caller satisfies before invoking `planner::plan`. The core itself never
//! depends on these traits directly — it only takes already-fetched
//! `Obstacle`/`WindField`/`PolarCurve` values.

pub mod obstacle_store;
pub mod polar_repo;
pub mod weather_openweather;

use crate::error::PlanError;
use crate::obstacle::Obstacle;
use crate::polar::PolarCurve;
use crate::wind::WindField;
use async_trait::async_trait;
use uuid::Uuid;

pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

#[async_trait]
pub trait ObstacleSource: Send + Sync {
    async fn fetch(&self, bounds: &Bounds) -> Result<Vec<Obstacle>, PlanError>;
}

#[async_trait]
pub trait WindProvider: Send + Sync {
    /// Always returns a non-empty field; on upstream failure this
    /// synthesises a default field rather than erroring (§6).
    async fn fetch(&self, bounds: &Bounds) -> WindField;
}

#[async_trait]
pub trait PolarRepository: Send + Sync {
    async fn fetch(&self, profile_id: Uuid) -> Result<Option<PolarCurve>, PlanError>;
}
