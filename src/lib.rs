pub mod allocation;
pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod redis_client;
pub mod services;

use std::sync::Arc;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub sessions: services::sessions::SessionRegistry,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        tracing::info!("Redis connected");

        let cache = cache::CacheService::new(redis, db.clone(), config.sessions.clone());

        Ok(Arc::new(Self {
            db,
            cache,
            config,
            sessions: services::sessions::SessionRegistry::new(),
        }))
    }
}
