use crate::cache::CacheService;
use crate::models::VenueTemplate;
use crate::redis_client::RedisClient;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::warn;

/// Площадка найдена, но схемы рассадки может не быть (`None` - пустой каталог).
pub type VenueLookup = Option<Option<VenueTemplate>>;

impl CacheService {
    // Получить шаблон площадки: сначала кеш, потом БД
    pub async fn get_venue_template(&self, venue_id: i64, use_cache: bool) -> Result<VenueLookup, sqlx::Error> {
        if use_cache {
            if let Ok(Some(template)) = self.get_template_from_cache(venue_id).await {
                return Ok(Some(Some(template)));
            }
        }

        let Some(raw) = self.load_template_from_db(venue_id).await? else {
            return Ok(None);
        };

        // Битый или отсутствующий шаблон - это "нет мест", а не ошибка
        let template = raw.as_ref().and_then(VenueTemplate::from_value);
        if template.is_none() {
            warn!("Venue {} has no usable seat template", venue_id);
        }

        if use_cache {
            if let Some(template) = &template {
                if let Err(e) = self.save_template_to_cache(venue_id, template).await {
                    warn!("Failed to cache template of venue {}: {:?}", venue_id, e);
                }
            }
        }
        Ok(Some(template))
    }

    // === Работа с БД ===

    async fn load_template_from_db(&self, venue_id: i64) -> Result<Option<Option<Value>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Value>>("SELECT seat_template FROM venues WHERE id = $1")
            .bind(venue_id)
            .fetch_optional(&self.db.pool)
            .await
    }

    // === Работа с кешем ===

    async fn get_template_from_cache(&self, venue_id: i64) -> Result<Option<VenueTemplate>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(RedisClient::key("venue", venue_id)).await?;
        let Some(data) = data else {
            return Ok(None);
        };
        let template = serde_json::from_str(&data).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
        })?;
        Ok(Some(template))
    }

    async fn save_template_to_cache(&self, venue_id: i64, template: &VenueTemplate) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(template).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(RedisClient::key("venue", venue_id), data, self.ttl.venue_cache_ttl_seconds)
            .await
    }
}
