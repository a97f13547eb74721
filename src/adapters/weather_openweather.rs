//! `WindProvider` implementation backed by the OpenWeatherMap current-
//! weather endpoint. Per §6 this adapter never errors outward: any
//! connectivity or parse failure synthesises the default field instead.

use super::{Bounds, WindProvider};
use crate::geo::GeoPoint;
use crate::wind::{WindField, WindSample, DEFAULT_DIRECTION_DEG, DEFAULT_SPEED_MS};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

const GRID_SIZE: usize = 3;

pub struct OpenWeatherProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// A 3x3 grid of query points spanning `bounds`, matching the
    /// synthesised-default shape so real and fallback fields are the same
    /// resolution.
    fn grid_points(bounds: &Bounds) -> Vec<GeoPoint> {
        let mut points = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for i in 0..GRID_SIZE {
            let lat = bounds.south + (bounds.north - bounds.south) * i as f64 / (GRID_SIZE - 1) as f64;
            for j in 0..GRID_SIZE {
                let lon = bounds.west + (bounds.east - bounds.west) * j as f64 / (GRID_SIZE - 1) as f64;
                points.push(GeoPoint::new(lat, lon));
            }
        }
        points
    }

    fn default_field(bounds: &Bounds) -> WindField {
        let now = Utc::now();
        let samples = Self::grid_points(bounds)
            .into_iter()
            .map(|p| WindSample::new(p, DEFAULT_SPEED_MS, DEFAULT_DIRECTION_DEG, now))
            .collect();
        WindField::new(samples)
    }

    async fn fetch_one(&self, point: GeoPoint) -> Option<WindSample> {
        let api_key = self.api_key.as_ref()?;
        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("appid", api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let body: OpenWeatherResponse = response.json().await.ok()?;
        Some(WindSample::new(point, body.wind.speed, body.wind.deg, Utc::now()))
    }
}

#[async_trait]
impl WindProvider for OpenWeatherProvider {
    async fn fetch(&self, bounds: &Bounds) -> WindField {
        if self.api_key.is_none() {
            return Self::default_field(bounds);
        }

        let points = Self::grid_points(bounds);
        let mut samples = Vec::with_capacity(points.len());
        for point in points {
            match self.fetch_one(point).await {
                Some(sample) => samples.push(sample),
                None => {
                    tracing::warn!("openweather fetch failed for ({}, {}), substituting default field", point.lat, point.lon);
                    return Self::default_field(bounds);
                }
            }
        }
        WindField::new(samples)
    }
}

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    wind: OpenWeatherWind,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherWind {
    speed: f64,
    deg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            north: 54.8,
            south: 54.3,
            east: 19.0,
            west: 18.3,
        }
    }

    #[tokio::test]
    async fn falls_back_to_default_field_without_an_api_key() {
        let provider = OpenWeatherProvider::new("https://example.invalid", None);
        let field = provider.fetch(&bounds()).await;
        assert_eq!(field.len(), GRID_SIZE * GRID_SIZE);
        for sample in field.samples() {
            assert_eq!(sample.speed_ms, DEFAULT_SPEED_MS);
            assert_eq!(sample.direction_deg, DEFAULT_DIRECTION_DEG);
        }
    }

    #[test]
    fn grid_points_span_the_requested_bounds() {
        let b = bounds();
        let points = OpenWeatherProvider::grid_points(&b);
        assert_eq!(points.len(), 9);
        assert!(points.iter().any(|p| (p.lat - b.north).abs() < 1e-9));
        assert!(points.iter().any(|p| (p.lat - b.south).abs() < 1e-9));
    }
}
