use crate::cache::CacheService;
use crate::redis_client::RedisClient;
use crate::services::sessions::PersistedSession;
use redis::AsyncCommands;
use uuid::Uuid;

impl CacheService {
    /// Сохраняет снапшот сессии с TTL из конфига.
    pub async fn save_session(&self, id: Uuid, record: &PersistedSession) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(record).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(RedisClient::key("session", id), data, self.ttl.snapshot_ttl_seconds)
            .await
    }

    pub async fn load_session(&self, id: Uuid) -> Result<Option<PersistedSession>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(RedisClient::key("session", id)).await?;
        match data {
            Some(data) => serde_json::from_str(&data).map(Some).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            }),
            None => Ok(None),
        }
    }

    /// Возвращает `true`, если снапшот был.
    pub async fn delete_session(&self, id: Uuid) -> Result<bool, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let removed: i64 = conn.del(RedisClient::key("session", id)).await?;
        Ok(removed > 0)
    }
}
