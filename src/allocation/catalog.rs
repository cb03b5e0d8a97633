//! Template catalog: expands a [`VenueTemplate`] into addressable seats.

use tracing::{debug, warn};

use crate::allocation::normalize::{normalize, normalize_area, KeyIndex, NormKey};
use crate::allocation::store::RejectReason;
use crate::models::{Area, CatalogSeat, SeatRef, VenueTemplate};

/// Row labels are single letters. Areas with more rows are truncated and
/// reported through [`Catalog::row_overflow`].
pub const MAX_ROWS: u32 = 26;

/// Widest area accepted. Wider areas are skipped and reported through
/// [`Catalog::skipped_areas`].
pub const MAX_COLS: u32 = 1_000;

/// Upper bound on the whole catalog. An area that would cross it is skipped.
pub const MAX_SEATS: usize = 100_000;

/// Letter for a 0-based row index, `A` to `Z`.
pub fn row_label(index: u32) -> Option<char> {
    if index < MAX_ROWS {
        char::from_u32('A' as u32 + index)
    } else {
        None
    }
}

/// `"{row}-{col}"` key used by area lock lists (1-based).
pub fn area_seat_id(row_index: u32, col_index: u32) -> String {
    format!("{}-{}", row_index + 1, col_index + 1)
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    seats: Vec<CatalogSeat>,
    keys: Vec<NormKey>,
    index: KeyIndex,
    row_overflow: Vec<String>,
    skipped_areas: Vec<String>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Expands a template. A missing template produces an empty catalog.
    ///
    /// Order is row-major inside each area, areas in template order; itemized
    /// seats keep their list order.
    pub fn expand(template: Option<&VenueTemplate>) -> Self {
        let mut catalog = Catalog::empty();
        match template {
            None => debug!("No venue template, catalog is empty"),
            Some(VenueTemplate::Itemized { seats }) => {
                for seat in seats {
                    catalog.push(CatalogSeat::itemized(seat.clone()));
                }
            }
            Some(VenueTemplate::Areas { areas }) => {
                for area in areas {
                    catalog.expand_area(area);
                }
            }
        }
        catalog
    }

    fn expand_area(&mut self, area: &Area) {
        if area.cols > MAX_COLS {
            warn!("Area '{}' has {} columns (max {}), skipped", area.name, area.cols, MAX_COLS);
            self.skipped_areas.push(area.name.clone());
            return;
        }
        let generated = area.rows.min(MAX_ROWS) as usize * area.cols as usize;
        if self.seats.len() + generated > MAX_SEATS {
            warn!(
                "Area '{}' would grow the catalog past {} seats, skipped",
                area.name, MAX_SEATS
            );
            self.skipped_areas.push(area.name.clone());
            return;
        }

        let rows = if area.rows > MAX_ROWS {
            warn!(
                "Area '{}' has {} rows, only {} single-letter rows are generated",
                area.name, area.rows, MAX_ROWS
            );
            self.row_overflow.push(area.name.clone());
            MAX_ROWS
        } else {
            area.rows
        };

        for r in 0..rows {
            let Some(letter) = row_label(r) else { break };
            for c in 0..area.cols {
                let seat_id = area_seat_id(r, c);
                let locked = area.locked_seat_ids.iter().any(|id| id.trim() == seat_id);
                self.push(CatalogSeat {
                    seat: SeatRef::new(letter.to_string(), (c + 1).to_string(), Some(&area.name)),
                    seat_id: Some(seat_id),
                    locked,
                    area_rows: Some(area.rows),
                    area_cols: Some(area.cols),
                });
            }
        }
    }

    fn push(&mut self, seat: CatalogSeat) {
        let key = normalize(&seat.seat);
        self.index.insert(&key, self.keys.len());
        self.keys.push(key);
        self.seats.push(seat);
    }

    /// Catalog entries `key` can denote.
    fn matching<'a>(&'a self, key: &NormKey) -> impl Iterator<Item = (&'a CatalogSeat, &'a NormKey)> + 'a {
        let hits: Vec<usize> = self
            .index
            .candidates(key)
            .iter()
            .copied()
            .filter(|&pos| self.keys[pos].matches(key))
            .collect();
        hits.into_iter().map(move |pos| (&self.seats[pos], &self.keys[pos]))
    }

    pub fn seats(&self) -> &[CatalogSeat] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Catalog seats paired with their normalized keys.
    pub fn entries(&self) -> impl Iterator<Item = (&CatalogSeat, &NormKey)> {
        self.seats.iter().zip(self.keys.iter())
    }

    pub fn find(&self, seat: &SeatRef) -> Option<&CatalogSeat> {
        self.find_key(&normalize(seat))
    }

    pub fn find_key(&self, key: &NormKey) -> Option<&CatalogSeat> {
        self.matching(key).next().map(|(seat, _)| seat)
    }

    pub fn contains_key(&self, key: &NormKey) -> bool {
        self.matching(key).next().is_some()
    }

    /// The single catalog seat `key` denotes, with its canonical key.
    ///
    /// An area-less reference that fits seats in several areas is
    /// [`RejectReason::Ambiguous`]; one that fits nothing is
    /// [`RejectReason::NotInCatalog`].
    pub fn resolve(&self, key: &NormKey) -> Result<(&CatalogSeat, &NormKey), RejectReason> {
        let mut hits = self.matching(key);
        let first = hits.next().ok_or(RejectReason::NotInCatalog)?;
        if hits.next().is_some() {
            return Err(RejectReason::Ambiguous);
        }
        Ok(first)
    }

    /// Locked if any catalog seat it can denote is locked. An area-less
    /// reference may match several areas; one locked match is enough.
    pub fn is_locked(&self, key: &NormKey) -> bool {
        self.matching(key).any(|(seat, _)| seat.locked)
    }

    /// Distinct area labels in catalog order, as spelled in the template.
    pub fn areas(&self) -> Vec<&str> {
        let mut seen: Vec<Option<String>> = Vec::new();
        let mut labels = Vec::new();
        for (seat, key) in self.entries() {
            let Some(label) = seat.seat.area.as_deref() else { continue };
            if key.area.is_some() && !seen.contains(&key.area) {
                seen.push(key.area.clone());
                labels.push(label);
            }
        }
        labels
    }

    /// Seats whose normalized area equals `area`'s. Area-less seats belong
    /// to no area here.
    pub fn seats_in_area(&self, area: &str) -> Vec<&CatalogSeat> {
        let Some(wanted) = normalize_area(area) else {
            return Vec::new();
        };
        self.entries()
            .filter(|(_, key)| key.area.as_deref() == Some(wanted.as_str()))
            .map(|(seat, _)| seat)
            .collect()
    }

    /// Areas whose row count exceeded [`MAX_ROWS`].
    pub fn row_overflow(&self) -> &[String] {
        &self.row_overflow
    }

    /// Areas left out entirely: too wide, or too big for the catalog.
    pub fn skipped_areas(&self) -> &[String] {
        &self.skipped_areas
    }
}
