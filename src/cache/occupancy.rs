use crate::cache::CacheService;
use crate::models::{CategoryId, OccupiedSeat, SeatRef};
use sqlx::FromRow;
use tracing::debug;

#[derive(Debug, FromRow)]
struct AssignmentRow {
    row_label: String,
    seat_number: String,
    area: Option<String>,
    ticket_category_id: Option<String>,
    status: String,
}

impl From<AssignmentRow> for OccupiedSeat {
    fn from(row: AssignmentRow) -> Self {
        // проданное место не может вернуться даже в свою категорию,
        // поэтому владельца у него не указываем
        let category_id = match row.status.as_str() {
            "SOLD" => None,
            _ => row.ticket_category_id.map(CategoryId),
        };
        OccupiedSeat {
            seat: SeatRef {
                row: row.row_label,
                number: row.seat_number,
                area: row.area,
            },
            category_id,
        }
    }
}

impl CacheService {
    // Занятые места события всегда читаем из БД: они меняются при каждой продаже
    pub async fn load_occupied_seats(&self, event_id: i64) -> Result<Vec<OccupiedSeat>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT row_label, seat_number, area, ticket_category_id, status
             FROM event_seat_assignments
             WHERE event_id = $1
             ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.db.pool)
        .await?;

        debug!("Loaded {} occupied seats for event {}", rows.len(), event_id);
        Ok(rows.into_iter().map(OccupiedSeat::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> AssignmentRow {
        AssignmentRow {
            row_label: "A".to_string(),
            seat_number: "1".to_string(),
            area: Some("VIP".to_string()),
            ticket_category_id: Some("gold".to_string()),
            status: status.to_string(),
        }
    }

    #[test]
    fn sold_seats_lose_their_owner() {
        assert_eq!(OccupiedSeat::from(row("SOLD")).category_id, None);
        assert_eq!(OccupiedSeat::from(row("ASSIGNED")).category_id, Some(CategoryId::from("gold")));
    }
}
