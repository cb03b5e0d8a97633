use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::allocation::normalize::normalize_area;
use crate::allocation::{AreaToggle, GestureId, PointerOutcome};
use crate::controllers::{persist, with_session};
use crate::error::ApiError;
use crate::models::SeatRef;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/allocations/{id}/seats", get(get_board))
        .route("/allocations/{id}/pointer", post(pointer_event))
        .route("/allocations/{id}/areas/{area}/toggle", post(toggle_area))
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub area: Option<String>,
}

/// Pointer event forwarded by the rendering layer. `release` may come from
/// anywhere in the viewport, not only from a seat.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        seat: SeatRef,
    },
    Enter {
        seat: SeatRef,
        #[serde(default)]
        gesture: Option<GestureId>,
    },
    Release,
}

// GET /api/allocations/{id}/seats?area=VIP
async fn get_board(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<BoardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let seats = with_session(&state, id, |entry| {
        let mut board = entry.session.board();
        if let Some(area) = &query.area {
            let wanted = normalize_area(area);
            board.retain(|view| view.seat.seat.area.as_deref().and_then(normalize_area) == wanted);
        }
        board
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": seats.len(),
        "seats": seats,
    })))
}

// POST /api/allocations/{id}/pointer
async fn pointer_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(event): Json<PointerEvent>,
) -> Result<impl IntoResponse, ApiError> {
    match event {
        PointerEvent::Down { seat } => {
            let outcome = with_session(&state, id, |entry| entry.session.pointer_down(&seat)).await?;
            // номер жеста должен пережить рестарт, иначе старый id совпадет с новым
            if matches!(outcome, PointerOutcome::Started { .. }) {
                persist(&state, id).await;
            }
            Ok(Json(pointer_body(&outcome)))
        }
        PointerEvent::Enter { seat, gesture } => {
            let outcome = with_session(&state, id, |entry| entry.session.pointer_enter(&seat, gesture)).await?;
            Ok(Json(pointer_body(&outcome)))
        }
        PointerEvent::Release => {
            let released = with_session(&state, id, |entry| entry.session.release()).await?;
            // снапшот пишем один раз на жест, а не на каждое перемещение
            if released.is_some() {
                persist(&state, id).await;
            }
            Ok(Json(json!({
                "success": true,
                "outcome": "released",
                "gesture": released,
            })))
        }
    }
}

fn pointer_body(outcome: &PointerOutcome) -> serde_json::Value {
    let mut body = serde_json::to_value(outcome).unwrap_or_else(|_| json!({}));
    if let Some(map) = body.as_object_mut() {
        map.insert("success".to_string(), json!(true));
    }
    body
}

// POST /api/allocations/{id}/areas/{area}/toggle
async fn toggle_area(
    State(state): State<Arc<AppState>>,
    Path((id, area)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (toggle, quantity) = with_session(&state, id, |entry| {
        let toggle = entry.session.toggle_area(&area);
        let quantity = entry
            .session
            .active()
            .and_then(|active| entry.session.store().quantity(active));
        (toggle, quantity)
    })
    .await?;
    if toggle != AreaToggle::Unchanged {
        persist(&state, id).await;
    }

    Ok(Json(json!({
        "success": true,
        "area": area,
        "toggle": toggle,
        "quantity": quantity,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{DragMode, Mutation};

    #[test]
    fn pointer_events_decode_by_tag() {
        let down: PointerEvent =
            serde_json::from_value(json!({"event": "down", "seat": {"row": "A", "number": 3, "area": "VIP"}})).unwrap();
        assert_eq!(down, PointerEvent::Down { seat: SeatRef::new("A", "3", Some("VIP")) });

        let enter: PointerEvent =
            serde_json::from_value(json!({"event": "enter", "seat": {"row": "A", "number": "4"}, "gesture": 7})).unwrap();
        assert_eq!(
            enter,
            PointerEvent::Enter { seat: SeatRef::new("A", "4", None), gesture: Some(GestureId(7)) }
        );

        let release: PointerEvent = serde_json::from_value(json!({"event": "release"})).unwrap();
        assert_eq!(release, PointerEvent::Release);
    }

    #[test]
    fn pointer_body_carries_the_outcome() {
        let body = pointer_body(&PointerOutcome::Started {
            gesture: GestureId(1),
            mode: DragMode::Select,
            mutation: Mutation::Applied,
        });
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["outcome"], json!("started"));
        assert_eq!(body["gesture"], json!(1));
        assert_eq!(body["mode"], json!("select"));
    }
}
