use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

// GET /health
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Database ping failed: {:?}", e);
            false
        }
    };
    // Redis только ускоряет, поэтому без него сервис все еще жив
    let redis = state.cache.is_healthy().await;
    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "success": database,
            "database": database,
            "redis": redis,
            "sessions": state.sessions.len().await,
        })),
    )
}
