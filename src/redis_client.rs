use redis::{aio::ConnectionManager, Client};

/// Префикс всех ключей сервиса, чтобы делить Redis с другими приложениями.
const KEY_PREFIX: &str = "seat_allocation";

/// Redis-соединение с автоматическим переподключением.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(RedisClient { conn })
    }

    /// `seat_allocation:{kind}:{id}`
    pub fn key(kind: &str, id: impl std::fmt::Display) -> String {
        format!("{}:{}:{}", KEY_PREFIX, kind, id)
    }

    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await.map(|_| ())
    }
}
