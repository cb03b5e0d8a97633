pub mod health;
pub mod seats;
pub mod sessions;

use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::sessions::SessionEntry;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(sessions::routes())
        .merge(seats::routes())
}

/* ---------- helpers ---------- */

/// Поднимает сессию из Redis, если в памяти ее уже нет (рестарт или idle sweep).
async fn ensure_loaded(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    if state.sessions.contains(id).await {
        return Ok(());
    }
    if !state.config.features.enable_session_snapshots {
        return Err(ApiError::SessionNotFound(id));
    }

    match state.cache.load_session(id).await {
        Ok(Some(record)) => {
            let entry = SessionEntry::from_persisted(record)?;
            // параллельный запрос мог поднять сессию раньше и уже изменить ее
            if state.sessions.insert_with_id(id, entry).await {
                info!("Session {} restored from snapshot", id);
            }
            Ok(())
        }
        Ok(None) => Err(ApiError::SessionNotFound(id)),
        Err(e) => {
            warn!("Failed to load snapshot of session {}: {:?}", id, e);
            Err(ApiError::SessionNotFound(id))
        }
    }
}

/// Runs `f` on the session `id`, restoring it from its snapshot if needed.
pub(crate) async fn with_session<R>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut SessionEntry) -> R,
) -> Result<R, ApiError> {
    ensure_loaded(state, id).await?;
    state
        .sessions
        .update(id, f)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}

/// Пишет снапшот после изменения. Ошибка Redis запрос не ломает.
pub(crate) async fn persist(state: &AppState, id: Uuid) {
    if !state.config.features.enable_session_snapshots {
        return;
    }
    let Some(record) = state.sessions.snapshot(id).await else {
        return;
    };
    if let Err(e) = state.cache.save_session(id, &record).await {
        warn!("Failed to save snapshot of session {}: {:?}", id, e);
    }
}

/// Removes the session from memory and Redis. `false` if it existed nowhere.
pub(crate) async fn discard(state: &AppState, id: Uuid) -> bool {
    let in_memory = state.sessions.remove(id).await.is_some();
    let in_redis = if state.config.features.enable_session_snapshots {
        match state.cache.delete_session(id).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!("Failed to delete snapshot of session {}: {:?}", id, e);
                false
            }
        }
    } else {
        false
    };
    in_memory || in_redis
}
