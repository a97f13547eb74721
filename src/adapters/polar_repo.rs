//! `PolarRepository` implementation backed by the `boat_profiles` table.
//! Optional per §6: the facade's caller falls back to the built-in default
//! curve when no profile id is given or the row cannot be found.

use super::PolarRepository;
use crate::db::Db;
use crate::error::PlanError;
use crate::polar::{PolarCurve, PolarPoint};
use async_trait::async_trait;
use uuid::Uuid;

pub struct DbPolarRepository {
    db: Db,
}

impl DbPolarRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PolarRepository for DbPolarRepository {
    async fn fetch(&self, profile_id: Uuid) -> Result<Option<PolarCurve>, PlanError> {
        let profiles = self.db.list_boat_profiles().await?;
        let Some(row) = profiles.into_iter().find(|p| p.id == profile_id) else {
            return Ok(None);
        };
        let knots: Vec<PolarPoint> = serde_json::from_value(row.polar_data)
            .map_err(|e| PlanError::InvalidRequest(format!("malformed polar data for profile {profile_id}: {e}")))?;
        PolarCurve::new(knots)
            .map(Some)
            .map_err(PlanError::InvalidRequest)
    }
}
