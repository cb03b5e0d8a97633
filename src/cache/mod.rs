use crate::{config::SessionConfig, database::Database, redis_client::RedisClient};
use tracing::warn;

pub mod occupancy;
pub mod sessions;
pub mod venues;

/// Redis поверх Postgres: шаблоны площадок и снапшоты сессий распределения.
/// Ошибки Redis никогда не роняют запрос - кеш только ускоряет.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
    ttl: SessionConfig,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database, ttl: SessionConfig) -> Self {
        Self { redis, db, ttl }
    }

    pub async fn is_healthy(&self) -> bool {
        match self.redis.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis ping failed: {:?}", e);
                false
            }
        }
    }
}
