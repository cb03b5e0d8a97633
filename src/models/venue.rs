use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::warn;

use crate::models::SeatRef;

/// Rectangular block of seats. Rows are lettered `A..`, columns numbered `1..=cols`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    /// `"{row}-{col}"`, 1-based.
    #[serde(default, alias = "lockedSeatIds", alias = "locked_seats")]
    pub locked_seat_ids: BTreeSet<String>,
}

/// Venue seat layout. Immutable for the lifetime of an allocation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VenueTemplate {
    Itemized { seats: Vec<SeatRef> },
    Areas { areas: Vec<Area> },
}

impl VenueTemplate {
    /// Lenient decoding of a layout as stored or sent by clients.
    ///
    /// Accepts `{"seats": [...]}`, `{"areas": [...]}`, or a bare array of either
    /// kind. Entries that fail to decode are skipped; a structurally unusable
    /// value yields `None`, which the catalog treats as "no seats".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                if let Some(Value::Array(items)) = map.get("areas") {
                    Some(VenueTemplate::Areas { areas: decode_entries(items, "area") })
                } else if let Some(Value::Array(items)) = map.get("seats") {
                    Some(VenueTemplate::Itemized { seats: decode_entries(items, "seat") })
                } else {
                    warn!("Venue template has neither `areas` nor `seats`");
                    None
                }
            }
            Value::Array(items) => {
                // по первому элементу решаем, что это: зоны или список мест
                let looks_like_areas = items
                    .first()
                    .and_then(Value::as_object)
                    .is_some_and(|o| o.contains_key("rows") && o.contains_key("cols"));
                if looks_like_areas {
                    Some(VenueTemplate::Areas { areas: decode_entries(items, "area") })
                } else {
                    Some(VenueTemplate::Itemized { seats: decode_entries(items, "seat") })
                }
            }
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .ok()
                .and_then(|inner| match inner {
                    Value::String(_) => None,
                    other => Self::from_value(&other),
                }),
            _ => {
                warn!("Venue template is not an object or array");
                None
            }
        }
    }

    /// SHA-256 of the canonical JSON form, hex encoded.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(&bytes))
    }
}

fn decode_entries<T: serde::de::DeserializeOwned>(items: &[Value], what: &str) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match T::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed {} #{} in venue template: {}", what, idx, e);
                None
            }
        })
        .collect()
}
