use serde::{Deserialize, Deserializer, Serialize};

use crate::models::CategoryId;

/// Reference to a physical seat. Identity only, never state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRef {
    #[serde(deserialize_with = "string_or_number")]
    pub row: String,
    #[serde(deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default)]
    pub area: Option<String>,
}

impl SeatRef {
    pub fn new(row: impl Into<String>, number: impl Into<String>, area: Option<&str>) -> Self {
        Self {
            row: row.into(),
            number: number.into(),
            area: area.map(str::to_string),
        }
    }
}

impl std::fmt::Display for SeatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.area {
            Some(area) => write!(f, "{}/{}{}", area, self.row, self.number),
            None => write!(f, "{}{}", self.row, self.number),
        }
    }
}

/// Seat produced by catalog expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeat {
    #[serde(flatten)]
    pub seat: SeatRef,
    /// `"{row}-{col}"`, 1-based; only for seats generated from an area.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_id: Option<String>,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_cols: Option<u32>,
}

impl CatalogSeat {
    pub fn itemized(seat: SeatRef) -> Self {
        Self {
            seat,
            seat_id: None,
            locked: false,
            area_rows: None,
            area_cols: None,
        }
    }
}

/// Уже проданное или назначенное место события (приходит с бэкенда).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupiedSeat {
    #[serde(flatten)]
    pub seat: SeatRef,
    /// Категория-владелец, если место назначено, а не просто продано.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Derived per-seat state. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Unassigned,
    AssignedActive,
    AssignedOther,
    Booked,
    Locked,
}

impl SeatStatus {
    /// Seats a pointer can never interact with.
    pub fn is_inert(self) -> bool {
        matches!(self, SeatStatus::Locked | SeatStatus::AssignedOther)
    }
}

// В шаблонах номер места бывает и строкой, и числом
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
