use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub sessions: SessionConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Время жизни сессий распределения мест и кешей
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub idle_timeout_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub snapshot_ttl_seconds: u64,
    pub venue_cache_ttl_seconds: u64,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_session_snapshots: bool,
    pub enable_venue_cache: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Собирает конфиг из произвольного источника переменных (в тестах - из HashMap).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);
        Ok(Config {
            app: AppConfig {
                host: vars.or("HOST", "0.0.0.0"),
                port: vars.parse("PORT", "8000")?,
                environment: vars.or("ENVIRONMENT", "development"),
                rust_log: vars.or("RUST_LOG", "seat_allocation=debug,tower_http=debug"),
                log_format: vars.parse("LOG_FORMAT", "pretty")?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                pool_size: vars.parse("DB_POOL_SIZE", "20")?,
            },
            redis: RedisConfig {
                url: vars.required("REDIS_URL")?,
            },
            sessions: SessionConfig {
                idle_timeout_seconds: vars.parse("SESSION_IDLE_TIMEOUT_SECONDS", "1800")?,
                sweep_interval_seconds: vars.parse("SESSION_SWEEP_INTERVAL_SECONDS", "60")?,
                snapshot_ttl_seconds: vars.parse("SESSION_SNAPSHOT_TTL_SECONDS", "3600")?,
                venue_cache_ttl_seconds: vars.parse("VENUE_CACHE_TTL_SECONDS", "3600")?,
            },
            features: FeatureFlags {
                enable_session_snapshots: vars.parse("ENABLE_SESSION_SNAPSHOTS", "true")?,
                enable_venue_cache: vars.parse("ENABLE_VENUE_CACHE", "true")?,
            },
        })
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or(ConfigError::Missing(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str, default: &str) -> Result<T, ConfigError> {
        let value = self.or(key, default);
        let parsed = value.trim().parse::<T>();
        parsed.map_err(|_| ConfigError::Invalid { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/seats"),
        ("REDIS_URL", "redis://localhost"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.app.log_format, LogFormat::Pretty);
        assert_eq!(config.sessions.idle_timeout_seconds, 1800);
        assert!(config.features.enable_session_snapshots);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("PORT", "9001"), ("LOG_FORMAT", "JSON"), ("ENABLE_VENUE_CACHE", "false")]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.app.port, 9001);
        assert_eq!(config.app.log_format, LogFormat::Json);
        assert!(!config.features.enable_venue_cache);
    }

    #[test]
    fn missing_and_invalid_values_are_errors() {
        assert_eq!(
            Config::from_lookup(lookup(&[("REDIS_URL", "redis://x")])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_POOL_SIZE", "lots"));
        assert_eq!(
            Config::from_lookup(lookup(&pairs)).unwrap_err(),
            ConfigError::Invalid { key: "DB_POOL_SIZE", value: "lots".to_string() }
        );
    }
}
