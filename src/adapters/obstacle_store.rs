//! `ObstacleSource` implementation backed by the PostGIS obstacle table.

use super::{Bounds, ObstacleSource};
use crate::db::Db;
use crate::error::PlanError;
use crate::obstacle::Obstacle;
use async_trait::async_trait;

pub struct DbObstacleSource {
    db: Db,
}

impl DbObstacleSource {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ObstacleSource for DbObstacleSource {
    async fn fetch(&self, bounds: &Bounds) -> Result<Vec<Obstacle>, PlanError> {
        self.db
            .fetch_obstacles(bounds.north, bounds.south, bounds.east, bounds.west)
            .await
    }
}
