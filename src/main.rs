use sailroute::adapters::obstacle_store::DbObstacleSource;
use sailroute::adapters::polar_repo::DbPolarRepository;
use sailroute::adapters::weather_openweather::OpenWeatherProvider;
use sailroute::adapters::{ObstacleSource, PolarRepository, WindProvider};
use sailroute::config::Settings;
use sailroute::db::Db;
use sailroute::http::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let settings = Settings::load();
    tracing::info!(listen_addr = %settings.listen_addr, "starting sailroute routing service");

    let db = match Db::connect(&settings.database_url).await {
        Ok(db) => {
            if let Err(e) = db.migrate().await {
                tracing::warn!("schema migration failed: {e}");
            }
            Some(db)
        }
        Err(e) => {
            tracing::warn!("database unavailable, routes will not be persisted: {e}");
            None
        }
    };

    let obstacle_source: Arc<dyn ObstacleSource> = match &db {
        Some(db) => Arc::new(DbObstacleSource::new(db.clone())),
        None => Arc::new(EmptyObstacleSource),
    };
    let polar_repository: Arc<dyn PolarRepository> = match &db {
        Some(db) => Arc::new(DbPolarRepository::new(db.clone())),
        None => Arc::new(NoPolarRepository),
    };
    let wind_provider: Arc<dyn WindProvider> = Arc::new(OpenWeatherProvider::new(
        settings.weather_base_url.clone(),
        settings.weather_api_key.clone(),
    ));

    let state = Arc::new(AppState {
        settings: settings.clone(),
        db,
        obstacle_source,
        wind_provider,
        polar_repository,
    });

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;

    tracing::info!("listening on {}", settings.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

/// `ObstacleSource` used when no database is configured: empty sea, no
/// obstacles. The facade still runs; it just never sees any.
struct EmptyObstacleSource;

#[async_trait::async_trait]
impl ObstacleSource for EmptyObstacleSource {
    async fn fetch(&self, _bounds: &sailroute::adapters::Bounds) -> Result<Vec<sailroute::obstacle::Obstacle>, sailroute::error::PlanError> {
        Ok(Vec::new())
    }
}

/// `PolarRepository` used when no database is configured: every lookup
/// misses, so the facade's caller falls back to the built-in default curve.
struct NoPolarRepository;

#[async_trait::async_trait]
impl PolarRepository for NoPolarRepository {
    async fn fetch(&self, _profile_id: uuid::Uuid) -> Result<Option<sailroute::polar::PolarCurve>, sailroute::error::PlanError> {
        Ok(None)
    }
}
