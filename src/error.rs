//! Ошибки HTTP-слоя и их отображение в ответы.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::allocation::AllocationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("allocation session {0} not found")]
    SessionNotFound(Uuid),
    #[error("venue {0} not found")]
    VenueNotFound(i64),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) | ApiError::VenueNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Allocation(AllocationError::UnknownCategory(_)) => StatusCode::NOT_FOUND,
            ApiError::Allocation(AllocationError::DuplicateCategory(_)) => StatusCode::CONFLICT,
            ApiError::Allocation(AllocationError::ReadOnly) => StatusCode::FORBIDDEN,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // детали ошибки БД наружу не отдаем, только в лог
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
