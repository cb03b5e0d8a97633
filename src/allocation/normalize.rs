//! Seat identity normalizer.
//!
//! Seat references reach the engine from three places (venue templates,
//! occupancy records from the backend, pointer events from the grid) and
//! they rarely agree on spelling: `"Khu vực A"` vs `"A"`, `"01"` vs `"1"`,
//! lowercase rows, stray whitespace. Everything that compares seats goes
//! through [`NormKey`].
//!
//! Matching is deliberately asymmetric:
//! - row: trim + uppercase, must be equal;
//! - area: uppercase, locational prefix stripped, whitespace removed. If either
//!   side has no area the areas are considered compatible (legacy flat lists
//!   omit the area but must still match area-bearing occupancy records);
//! - number: trimmed strings equal, otherwise both must parse as integers and
//!   be numerically equal. A side that does not parse never matches.

use std::collections::HashMap;

use crate::models::SeatRef;

/// Locational prefixes stripped from area labels. Longer spellings come
/// before their own prefixes (`KHU VỰC` before `KHU`).
const AREA_PREFIXES: &[&str] = &["KHU VỰC", "KHÁN ĐÀI", "SECTION", "AREA", "ZONE", "KHU"];

/// Canonical, comparable form of a [`SeatRef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormKey {
    pub row: String,
    pub number: String,
    /// `None` when the area was absent or empty after stripping.
    pub area: Option<String>,
    numeric: Option<i64>,
}

impl NormKey {
    /// Same physical seat under the lenient-area / numeric-fallback rules.
    pub fn matches(&self, other: &NormKey) -> bool {
        self.row == other.row && self.number_matches(other) && self.area_matches(other)
    }

    fn number_matches(&self, other: &NormKey) -> bool {
        if self.number == other.number {
            return true;
        }
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn area_matches(&self, other: &NormKey) -> bool {
        match (&self.area, &other.area) {
            (Some(a), Some(b)) => a == b,
            // одна из сторон без зоны - считаем совместимыми
            _ => true,
        }
    }
}

/// Number part of a lookup slot. Keys that can match always land in the
/// same slot: equal strings parse alike, and numeric matches share the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NumberSlot {
    Numeric(i64),
    Text(String),
}

/// Hash bucket of a key: row plus number. Area is checked inside the bucket.
type Slot = (String, NumberSlot);

impl NormKey {
    fn slot(&self) -> Slot {
        let number = match self.numeric {
            Some(n) => NumberSlot::Numeric(n),
            None => NumberSlot::Text(self.number.clone()),
        };
        (self.row.clone(), number)
    }
}

/// Positions of keys in some backing `Vec`, bucketed by [`Slot`], so a
/// lookup only compares keys that share row and number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyIndex {
    slots: HashMap<Slot, Vec<usize>>,
}

impl KeyIndex {
    pub(crate) fn build<'a>(keys: impl IntoIterator<Item = &'a NormKey>) -> Self {
        let mut index = Self::default();
        for (pos, key) in keys.into_iter().enumerate() {
            index.insert(key, pos);
        }
        index
    }

    pub(crate) fn insert(&mut self, key: &NormKey, pos: usize) {
        self.slots.entry(key.slot()).or_default().push(pos);
    }

    /// Candidate positions; the caller still runs [`NormKey::matches`].
    pub(crate) fn candidates(&self, key: &NormKey) -> &[usize] {
        self.slots.get(&key.slot()).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn normalize(seat: &SeatRef) -> NormKey {
    let number = seat.number.trim().to_string();
    let numeric = number.parse::<i64>().ok();
    NormKey {
        row: normalize_row(&seat.row),
        numeric,
        number,
        area: seat.area.as_deref().and_then(normalize_area),
    }
}

pub fn same_seat(a: &SeatRef, b: &SeatRef) -> bool {
    normalize(a).matches(&normalize(b))
}

pub fn normalize_row(row: &str) -> String {
    row.trim().to_uppercase()
}

/// Canonical area label, or `None` if nothing is left once the prefix and
/// whitespace are gone.
pub fn normalize_area(area: &str) -> Option<String> {
    let upper = area.trim().to_uppercase();
    let mut rest = upper.as_str();

    // "KHU VỰC KHÁN ĐÀI B" встречается в старых шаблонах, поэтому снимаем префиксы в цикле
    while let Some(stripped) = strip_prefix_word(rest) {
        rest = stripped;
    }

    let label: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Strips one known prefix when it stands as a whole word, plus the
/// separators that follow it (`"KHU-A"`, `"ZONE: B"`).
fn strip_prefix_word(s: &str) -> Option<&str> {
    for prefix in AREA_PREFIXES {
        let Some(rest) = s.strip_prefix(prefix) else {
            continue;
        };
        match rest.chars().next() {
            None => return Some(rest),
            Some(c) if !c.is_alphanumeric() => {
                return Some(rest.trim_start_matches(|c: char| !c.is_alphanumeric()));
            }
            // "AREAL", "ZONED" - это не префикс, а часть названия
            Some(_) => continue,
        }
    }
    None
}
