use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

use crate::AppState;

/// Периодически выгружает из памяти брошенные сессии распределения мест.
/// Снапшоты в Redis живут своим TTL, поэтому сессию можно будет поднять снова.
pub struct CleanupService {
    state: Arc<AppState>,
}

impl CleanupService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn run_idle_sweep(&self) -> usize {
        let timeout = self.state.config.sessions.idle_timeout_seconds;
        let idle = Duration::from_std(std::time::Duration::from_secs(timeout)).unwrap_or_else(|_| Duration::days(365));
        let evicted = self.state.sessions.evict_idle(idle, Utc::now()).await;

        if evicted.is_empty() {
            info!("🧹 No idle allocation sessions");
        } else {
            info!("🧹 Evicted {} idle allocation sessions", evicted.len());
        }
        evicted.len()
    }

    /// Бесконечный цикл для фоновой задачи.
    pub async fn run(self) {
        let period = std::time::Duration::from_secs(self.state.config.sessions.sweep_interval_seconds.max(1));
        loop {
            tokio::time::sleep(period).await;
            self.run_idle_sweep().await;
        }
    }
}
