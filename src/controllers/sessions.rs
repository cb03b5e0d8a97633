use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::allocation::{AllocationSession, SessionMode};
use crate::controllers::{discard, persist, with_session};
use crate::error::ApiError;
use crate::models::{CategoryId, OccupiedSeat, SeatRef, TicketCategoryDraft, VenueTemplate};
use crate::services::sessions::SessionEntry;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/allocations", post(open_session))
        .route("/allocations/{id}", get(get_session).delete(delete_session))
        .route("/allocations/{id}/categories", post(add_category))
        .route("/allocations/{id}/categories/{category_id}", delete(remove_category))
        .route("/allocations/{id}/active", put(set_active))
        .route("/allocations/{id}/venue", put(change_venue))
        .route("/allocations/{id}/submission", get(get_submission))
        .route("/allocations/{id}/submission/result", post(submission_result))
}

/* ---------- requests ---------- */

#[derive(Debug, Deserialize, Validate)]
pub struct OpenSessionRequest {
    /// Площадка из БД; игнорируется, если передан `template`.
    #[validate(range(min = 1))]
    pub venue_id: Option<i64>,
    pub template: Option<Value>,
    #[validate(range(min = 1))]
    pub event_id: Option<i64>,
    #[serde(default)]
    pub occupied: Vec<OccupiedSeat>,
    #[serde(default)]
    #[validate(nested)]
    pub categories: Vec<CategoryInput>,
    #[serde(default)]
    pub mode: SessionMode,
    pub active: Option<CategoryId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub assigned_seats: Vec<SeatRef>,
}

impl From<CategoryInput> for TicketCategoryDraft {
    fn from(input: CategoryInput) -> Self {
        TicketCategoryDraft::new(CategoryId(input.id), input.name, input.price).with_seats(input.assigned_seats)
    }
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeVenueRequest {
    #[validate(range(min = 1))]
    pub venue_id: Option<i64>,
    pub template: Option<Value>,
    #[serde(default)]
    pub occupied: Vec<OccupiedSeat>,
}

/// Итог отправки назначений на бэкенд.
#[derive(Debug, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub error: Option<String>,
}

/* ---------- responses ---------- */

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub price: f64,
    pub quantity: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub mode: SessionMode,
    pub event_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub fingerprint: Option<String>,
    pub seats: usize,
    pub areas: Vec<String>,
    pub row_overflow: Vec<String>,
    pub skipped_areas: Vec<String>,
    pub active: Option<CategoryId>,
    pub dragging: bool,
    pub categories: Vec<CategorySummary>,
}

impl SessionSummary {
    fn of(id: Uuid, entry: &SessionEntry) -> Self {
        let session = &entry.session;
        let catalog = session.catalog();
        SessionSummary {
            id,
            mode: session.mode(),
            event_id: entry.event_id,
            venue_id: entry.venue_id,
            fingerprint: session.fingerprint().map(str::to_string),
            seats: catalog.len(),
            areas: catalog.areas().into_iter().map(str::to_string).collect(),
            row_overflow: catalog.row_overflow().to_vec(),
            skipped_areas: catalog.skipped_areas().to_vec(),
            active: session.active().cloned(),
            dragging: session.controller().is_dragging(),
            categories: session
                .drafts()
                .iter()
                .map(|d| CategorySummary {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    price: d.price,
                    quantity: d.quantity(),
                })
                .collect(),
        }
    }
}

/* ---------- helpers ---------- */

/// Inline template wins over `venue_id`. A venue without a usable template
/// yields `None`, which is an empty catalog rather than an error.
async fn resolve_template(
    state: &AppState,
    venue_id: Option<i64>,
    template: Option<Value>,
) -> Result<Option<VenueTemplate>, ApiError> {
    if let Some(raw) = template {
        return Ok(VenueTemplate::from_value(&raw));
    }
    let Some(venue_id) = venue_id else {
        return Ok(None);
    };
    state
        .cache
        .get_venue_template(venue_id, state.config.features.enable_venue_cache)
        .await?
        .ok_or(ApiError::VenueNotFound(venue_id))
}

async fn resolve_occupancy(
    state: &AppState,
    event_id: Option<i64>,
    inline: Vec<OccupiedSeat>,
) -> Result<Vec<OccupiedSeat>, ApiError> {
    let mut occupied = match event_id {
        Some(event_id) => state.cache.load_occupied_seats(event_id).await?,
        None => Vec::new(),
    };
    occupied.extend(inline);
    Ok(occupied)
}

/* ---------- SESSIONS ---------- */

// POST /api/allocations
async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let template = resolve_template(&state, req.venue_id, req.template).await?;
    let occupied = resolve_occupancy(&state, req.event_id, req.occupied).await?;
    let drafts = req.categories.into_iter().map(TicketCategoryDraft::from).collect();

    let mut session = AllocationSession::open(template, occupied, drafts, req.mode)?;
    if req.active.is_some() {
        session.activate(req.active)?;
    }

    let entry = SessionEntry::new(session, req.event_id, req.venue_id);
    let id = state.sessions.insert(entry).await;
    persist(&state, id).await;
    info!("Allocation session {} opened", id);

    let summary = with_session(&state, id, |entry| SessionSummary::of(id, entry)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "session": summary }))))
}

// GET /api/allocations/{id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = with_session(&state, id, |entry| SessionSummary::of(id, entry)).await?;
    Ok(Json(json!({ "success": true, "session": summary })))
}

// DELETE /api/allocations/{id}
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !discard(&state, id).await {
        return Err(ApiError::SessionNotFound(id));
    }
    info!("Allocation session {} discarded", id);
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- CATEGORIES ---------- */

// POST /api/allocations/{id}/categories
async fn add_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let draft = TicketCategoryDraft::from(input);

    let summary = with_session(&state, id, |entry| {
        entry.session.add_category(draft)?;
        Ok::<_, ApiError>(SessionSummary::of(id, entry))
    })
    .await??;
    persist(&state, id).await;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "session": summary }))))
}

// DELETE /api/allocations/{id}/categories/{category_id}
async fn remove_category(
    State(state): State<Arc<AppState>>,
    Path((id, category_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let category_id = CategoryId(category_id);
    let (removed, summary) = with_session(&state, id, |entry| {
        let removed = entry.session.remove_category(&category_id)?;
        Ok::<_, ApiError>((removed, SessionSummary::of(id, entry)))
    })
    .await??;
    persist(&state, id).await;

    Ok(Json(json!({
        "success": true,
        "removed": removed,
        "session": summary,
    })))
}

// PUT /api/allocations/{id}/active
async fn set_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActivateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = with_session(&state, id, |entry| {
        entry.session.activate(req.category_id)?;
        Ok::<_, ApiError>(SessionSummary::of(id, entry))
    })
    .await??;
    persist(&state, id).await;

    Ok(Json(json!({ "success": true, "session": summary })))
}

/* ---------- VENUE ---------- */

// PUT /api/allocations/{id}/venue
async fn change_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeVenueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    // I/O делаем до захвата сессии, реестр держим только на время вызова движка
    let event_id = with_session(&state, id, |entry| entry.event_id).await?;
    let template = resolve_template(&state, req.venue_id, req.template).await?;
    let occupied = resolve_occupancy(&state, event_id, req.occupied).await?;

    let (changed, summary) = with_session(&state, id, |entry| {
        let changed = entry.session.change_venue(template, occupied)?;
        if changed {
            entry.venue_id = req.venue_id;
        }
        Ok::<_, ApiError>((changed, SessionSummary::of(id, entry)))
    })
    .await??;
    if changed {
        persist(&state, id).await;
    }

    Ok(Json(json!({
        "success": true,
        "changed": changed,
        "session": summary,
    })))
}

/* ---------- SUBMISSION ---------- */

// GET /api/allocations/{id}/submission
async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = with_session(&state, id, |entry| entry.session.submission()).await?;
    Ok(Json(json!({ "success": true, "requests": requests })))
}

// POST /api/allocations/{id}/submission/result
async fn submission_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(result): Json<SubmissionResult>,
) -> Result<impl IntoResponse, ApiError> {
    // сессия должна существовать, даже если результат положительный
    with_session(&state, id, |_| ()).await?;

    if result.success {
        discard(&state, id).await;
        info!("Submission of session {} accepted, session closed", id);
        return Ok(Json(json!({ "success": true, "closed": true })));
    }

    warn!(
        "Submission of session {} rejected: {}",
        id,
        result.error.as_deref().unwrap_or("no details")
    );
    Ok(Json(json!({ "success": true, "closed": false })))
}
