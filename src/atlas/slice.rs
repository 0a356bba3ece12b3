//! UV slices: where each card's artwork sits on a shared atlas surface.
//!
//! The `UvTable` is keyed by card id and grows freely; corrections go
//! through [`UvTable::upsert`]. A text form with one slice per line
//! (`cardId,atlasIndex,x,y,width,height`, normalized coordinates) is
//! accepted for tables built by the asset pipeline.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cards::CardId;
use crate::error::AtlasError;

/// Tolerance used by [`UvTable::matches`].
pub const UV_MATCH_TOLERANCE: f32 = 0.001;

/// Normalized rectangle on an atlas: offset (`x`, `y`) and scale
/// (`width`, `height`), each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    /// Create a rectangle, rejecting components outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `AtlasError::OutOfRange` naming the first bad component.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, AtlasError> {
        let rect = Self { x, y, width, height };
        match rect.first_out_of_range() {
            Some((component, value)) => Err(AtlasError::OutOfRange { component, value }),
            None => Ok(rect),
        }
    }

    /// True if every component is in `[0, 1]`.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        self.first_out_of_range().is_none()
    }

    /// Euclidean distance between two rectangles viewed as 4-vectors.
    #[must_use]
    pub fn distance(&self, other: &UvRect) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dw = self.width - other.width;
        let dh = self.height - other.height;
        (dx * dx + dy * dy + dw * dw + dh * dh).sqrt()
    }

    fn first_out_of_range(&self) -> Option<(&'static str, f32)> {
        [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ]
        .into_iter()
        // NaN fails the range check too.
        .find(|&(_, v)| !(0.0..=1.0).contains(&v))
    }
}

/// One card's location on one atlas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UvSlice {
    pub card_id: CardId,
    pub atlas_index: u32,
    pub rect: UvRect,
}

/// Result of [`UvTable::audit`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingAudit {
    /// Slices whose rectangle leaves `[0, 1]`.
    pub out_of_range: Vec<CardId>,
    /// Slices with a blank card id.
    pub blank_ids: usize,
}

impl MappingAudit {
    /// True if nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.out_of_range.is_empty() && self.blank_ids == 0
    }
}

/// Card id → UV slice table.
#[derive(Clone, Debug, Default)]
pub struct UvTable {
    slices: FxHashMap<CardId, UvSlice>,
}

impl UvTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from slices. A later slice for the same id wins.
    pub fn from_slices(slices: impl IntoIterator<Item = UvSlice>) -> Self {
        Self {
            slices: slices
                .into_iter()
                .map(|s| (s.card_id.clone(), s))
                .collect(),
        }
    }

    /// Parse the line-oriented mapping table.
    ///
    /// Blank lines and `#` comments are skipped. Bad lines are collected
    /// and the rest of the table still loads.
    ///
    /// ```
    /// use rust_ccg_sync::atlas::UvTable;
    ///
    /// let (table, errors) = UvTable::parse("a,0,0,0,0.5,0.5\nb,1,0.5,0.5,0.5,0.5\nbad line");
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(errors.len(), 1);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> (Self, Vec<AtlasError>) {
        let mut table = Self::new();
        let mut errors = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(i + 1, line) {
                Ok(slice) => {
                    if let Some(previous) = table.slices.insert(slice.card_id.clone(), slice) {
                        warn!(card = %previous.card_id, line = i + 1, "duplicate uv mapping replaced");
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        (table, errors)
    }

    /// Get the slice for a card.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&UvSlice> {
        self.slices.get(id)
    }

    /// Insert or correct a slice. Returns the slice it replaced.
    ///
    /// # Errors
    ///
    /// Rejects rectangles outside `[0, 1]`; the table is unchanged.
    pub fn upsert(
        &mut self,
        card_id: CardId,
        atlas_index: u32,
        rect: UvRect,
    ) -> Result<Option<UvSlice>, AtlasError> {
        let rect = UvRect::new(rect.x, rect.y, rect.width, rect.height)?;
        Ok(self.slices.insert(
            card_id.clone(),
            UvSlice {
                card_id,
                atlas_index,
                rect,
            },
        ))
    }

    /// All slices on one atlas.
    pub fn slices_for_atlas(&self, atlas_index: u32) -> impl Iterator<Item = &UvSlice> {
        self.slices
            .values()
            .filter(move |s| s.atlas_index == atlas_index)
    }

    /// True if `card_id` maps to `atlas_index` at (nearly) `rect`.
    #[must_use]
    pub fn matches(&self, card_id: &CardId, atlas_index: u32, rect: &UvRect) -> bool {
        self.slices.get(card_id).is_some_and(|s| {
            s.atlas_index == atlas_index && s.rect.distance(rect) < UV_MATCH_TOLERANCE
        })
    }

    /// Flag slices that could never crop correctly.
    #[must_use]
    pub fn audit(&self) -> MappingAudit {
        let mut audit = MappingAudit::default();
        for slice in self.slices.values() {
            if slice.card_id.as_str().trim().is_empty() {
                audit.blank_ids += 1;
            }
            if !slice.rect.is_in_range() {
                audit.out_of_range.push(slice.card_id.clone());
            }
        }
        audit.out_of_range.sort();
        audit
    }

    /// Drop slices with blank ids. Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.slices.len();
        self.slices.retain(|id, _| !id.as_str().trim().is_empty());
        before - self.slices.len()
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

fn parse_line(line_no: usize, line: &str) -> Result<UvSlice, AtlasError> {
    let malformed = |reason: String| AtlasError::MalformedLine {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(malformed(format!("expected 6 fields, found {}", fields.len())));
    }
    if fields[0].is_empty() {
        return Err(malformed("blank card id".to_string()));
    }
    let atlas_index = fields[1]
        .parse::<u32>()
        .map_err(|_| malformed(format!("bad atlas index {:?}", fields[1])))?;

    let mut coords = [0f32; 4];
    for (slot, text) in coords.iter_mut().zip(&fields[2..]) {
        *slot = text
            .parse::<f32>()
            .map_err(|_| malformed(format!("bad coordinate {:?}", text)))?;
    }
    let rect = UvRect::new(coords[0], coords[1], coords[2], coords[3])
        .map_err(|e| malformed(e.to_string()))?;

    Ok(UvSlice {
        card_id: CardId::new(fields[0]),
        atlas_index,
        rect,
    })
}
