//! Wind field: a sparse set of wind samples with nearest-neighbour lookup.

use crate::geo::{distance_nm, GeoPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default substitute used when a field has no samples to query.
pub const DEFAULT_SPEED_MS: f64 = 5.0;
pub const DEFAULT_DIRECTION_DEG: f64 = 270.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub point: GeoPoint,
    pub speed_ms: f64,
    /// Meteorological "from" direction, in `[0, 360)`.
    pub direction_deg: f64,
    pub gust_ms: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl WindSample {
    pub fn new(point: GeoPoint, speed_ms: f64, direction_deg: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            point,
            speed_ms,
            direction_deg,
            gust_ms: None,
            timestamp,
        }
    }

    pub fn default_at(point: GeoPoint, timestamp: DateTime<Utc>) -> Self {
        Self::new(point, DEFAULT_SPEED_MS, DEFAULT_DIRECTION_DEG, timestamp)
    }
}

/// A snapshot of wind samples over a rectangular area. A field is not
/// temporally interpolated — it represents a single instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindField {
    samples: Vec<WindSample>,
}

impl WindField {
    pub fn new(samples: Vec<WindSample>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[WindSample] {
        &self.samples
    }

    pub fn push(&mut self, sample: WindSample) {
        self.samples.push(sample);
    }

    /// Nearest sample (great-circle) to `point`, ties broken by insertion
    /// order. Falls back to `default` when the field has no samples.
    pub fn wind_at(&self, point: GeoPoint, default: WindSample) -> WindSample {
        self.samples
            .iter()
            .copied()
            .min_by(|a, b| {
                distance_nm(a.point, point)
                    .partial_cmp(&distance_nm(b.point, point))
                    .unwrap()
            })
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn nearest_neighbour_picks_closest_sample() {
        let field = WindField::new(vec![
            WindSample::new(GeoPoint::new(0.0, 0.0), 3.0, 10.0, ts()),
            WindSample::new(GeoPoint::new(10.0, 10.0), 9.0, 200.0, ts()),
        ]);
        let q = GeoPoint::new(0.1, 0.1);
        let w = field.wind_at(q, WindSample::default_at(q, ts()));
        assert_eq!(w.speed_ms, 3.0);
    }

    #[test]
    fn empty_field_returns_default() {
        let field = WindField::default();
        let q = GeoPoint::new(1.0, 1.0);
        let w = field.wind_at(q, WindSample::default_at(q, ts()));
        assert_eq!(w.speed_ms, DEFAULT_SPEED_MS);
        assert_eq!(w.direction_deg, DEFAULT_DIRECTION_DEG);
    }

    #[test]
    fn ties_broken_by_insertion_order() {
        let field = WindField::new(vec![
            WindSample::new(GeoPoint::new(0.0, 0.0), 1.0, 0.0, ts()),
            WindSample::new(GeoPoint::new(0.0, 0.0), 2.0, 0.0, ts()),
        ]);
        let q = GeoPoint::new(0.0, 0.0);
        let w = field.wind_at(q, WindSample::default_at(q, ts()));
        assert_eq!(w.speed_ms, 1.0);
    }
}
