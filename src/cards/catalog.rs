//! Catalog index: card lookup by id, name, and filter predicates.
//!
//! The `CatalogIndex` is built once per session from the external card
//! source and never mutated afterwards. It owns every [`CardRecord`] and
//! maintains derived indices so that filters touch only candidate records:
//!
//! - id → record
//! - lowercased name → id (first writer wins)
//! - rarity → records
//! - converted cost → records
//! - legal format → records
//!
//! Type-line substring matching has no index; it is checked lazily.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::record::{
    parse_record, CardId, CardRecord, FieldIssue, Format, RawCardRecord, Rarity,
};
use crate::error::CatalogError;

/// Problems found in one input record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordIssue {
    /// Position of the record in the input sequence.
    pub position: usize,
    /// Raw id, if one was present.
    pub id: Option<String>,
    /// Every field problem found.
    pub issues: Vec<FieldIssue>,
}

/// Two records whose names normalize to the same lookup key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameCollision {
    /// Normalized name.
    pub name: String,
    /// Id the name resolves to.
    pub kept: CardId,
    /// Later id that lost the name.
    pub shadowed: CardId,
}

/// Summary of a catalog load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records indexed.
    pub loaded: usize,
    /// Records dropped for a missing id or name.
    pub rejected: Vec<RecordIssue>,
    /// Records kept with one or more defaulted fields.
    pub defaulted: Vec<RecordIssue>,
    /// Ids seen again after their first record; later copies are dropped.
    pub duplicate_ids: Vec<CardId>,
}

/// Filter predicate over catalog records. All set predicates must hold.
///
/// ```
/// use rust_ccg_sync::cards::{CardQuery, Rarity};
///
/// let query = CardQuery::new()
///     .rarity(Rarity::Rare)
///     .type_contains("creature")
///     .legal_in("modern")
///     .converted_cost(3);
/// assert!(!query.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardQuery {
    rarity: Option<Rarity>,
    type_contains: Option<String>,
    legal_in: Option<Format>,
    converted_cost: Option<u32>,
}

impl CardQuery {
    /// Query matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact rarity.
    #[must_use]
    pub fn rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = Some(rarity);
        self
    }

    /// Require a type-line substring (case-insensitive).
    #[must_use]
    pub fn type_contains(mut self, needle: impl AsRef<str>) -> Self {
        self.type_contains = Some(needle.as_ref().to_lowercase());
        self
    }

    /// Require legality in a format.
    #[must_use]
    pub fn legal_in(mut self, format: impl AsRef<str>) -> Self {
        self.legal_in = Some(Format::new(format));
        self
    }

    /// Require an exact converted cost.
    #[must_use]
    pub fn converted_cost(mut self, cost: u32) -> Self {
        self.converted_cost = Some(cost);
        self
    }

    /// True if no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Immutable, multi-key card index.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    records: Vec<CardRecord>,
    type_lower: Vec<String>,
    by_id: FxHashMap<CardId, usize>,
    by_name: FxHashMap<String, usize>,
    by_rarity: FxHashMap<Rarity, Vec<usize>>,
    by_cost: FxHashMap<u32, Vec<usize>>,
    by_format: FxHashMap<Format, Vec<usize>>,
    name_collisions: Vec<NameCollision>,
}

impl CatalogIndex {
    /// Parse and index raw records in one pass.
    ///
    /// A bad record is skipped or defaulted and reported; it never blocks
    /// the rest of the load.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` if not a single record could be indexed.
    pub fn load(
        raw: impl IntoIterator<Item = RawCardRecord>,
    ) -> Result<(Self, LoadReport), CatalogError> {
        let mut index = Self::default();
        let mut report = LoadReport::default();

        for (position, raw) in raw.into_iter().enumerate() {
            match parse_record(&raw) {
                Ok(parsed) => {
                    if !parsed.issues.is_empty() {
                        warn!(position, id = %parsed.record.id, issues = parsed.issues.len(), "catalog record defaulted");
                        report.defaulted.push(RecordIssue {
                            position,
                            id: Some(parsed.record.id.0.clone()),
                            issues: parsed.issues,
                        });
                    }
                    index.insert(parsed.record, &mut report);
                }
                Err(issues) => {
                    warn!(position, issues = issues.len(), "catalog record rejected");
                    report.rejected.push(RecordIssue {
                        position,
                        id: Some(raw.id.trim().to_string()).filter(|id| !id.is_empty()),
                        issues,
                    });
                }
            }
        }

        if index.is_empty() {
            return Err(CatalogError::Empty {
                rejected: report.rejected.len(),
            });
        }

        debug!(
            loaded = report.loaded,
            rejected = report.rejected.len(),
            defaulted = report.defaulted.len(),
            "catalog indexed"
        );
        Ok((index, report))
    }

    /// Parse a JSON array of raw records and index it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Json` if the document is not an array of
    /// records, or `CatalogError::Empty` as for [`CatalogIndex::load`].
    pub fn load_json(json: &str) -> Result<(Self, LoadReport), CatalogError> {
        let raw: Vec<RawCardRecord> = serde_json::from_str(json)?;
        Self::load(raw)
    }

    /// Index already-typed records.
    pub fn from_records(records: impl IntoIterator<Item = CardRecord>) -> Self {
        let mut index = Self::default();
        let mut report = LoadReport::default();
        for record in records {
            index.insert(record, &mut report);
        }
        index
    }

    fn insert(&mut self, record: CardRecord, report: &mut LoadReport) {
        if self.by_id.contains_key(&record.id) {
            warn!(id = %record.id, "duplicate catalog id ignored");
            report.duplicate_ids.push(record.id);
            return;
        }

        let pos = self.records.len();
        let name_key = normalize_name(&record.name);
        match self.by_name.get(&name_key) {
            Some(&existing) => {
                let kept = self.records[existing].id.clone();
                warn!(name = %name_key, kept = %kept, shadowed = %record.id, "card name collision");
                self.name_collisions.push(NameCollision {
                    name: name_key,
                    kept,
                    shadowed: record.id.clone(),
                });
            }
            None => {
                self.by_name.insert(name_key, pos);
            }
        }

        self.by_id.insert(record.id.clone(), pos);
        self.by_rarity.entry(record.rarity).or_default().push(pos);
        self.by_cost.entry(record.converted_cost).or_default().push(pos);
        for format in &record.legal_formats {
            self.by_format.entry(format.clone()).or_default().push(pos);
        }
        self.type_lower.push(record.type_line.to_lowercase());
        self.records.push(record);
        report.loaded += 1;
    }

    /// Get a record by id.
    #[must_use]
    pub fn by_id(&self, id: &CardId) -> Option<&CardRecord> {
        self.by_id.get(id).map(|&pos| &self.records[pos])
    }

    /// Resolve a card name (case-insensitive) to its id.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&CardId> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&pos| &self.records[pos].id)
    }

    /// Display name for an id, if known.
    #[must_use]
    pub fn name_of(&self, id: &CardId) -> Option<&str> {
        self.by_id(id).map(|r| r.name.as_str())
    }

    /// Check if an id is in the catalog.
    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in load order.
    pub fn iter(&self) -> impl Iterator<Item = &CardRecord> {
        self.records.iter()
    }

    /// Names that mapped to more than one id during load.
    #[must_use]
    pub fn name_collisions(&self) -> &[NameCollision] {
        &self.name_collisions
    }

    /// True if the card exists and is legal in `format`.
    #[must_use]
    pub fn is_legal_in(&self, id: &CardId, format: &Format) -> bool {
        self.by_id(id).is_some_and(|r| r.is_legal_in(format))
    }

    /// Ids of every card legal in `format`.
    pub fn legal_ids<'a>(&'a self, format: &Format) -> impl Iterator<Item = &'a CardId> + 'a {
        self.positions(self.by_format.get(format))
            .iter()
            .map(move |&pos| &self.records[pos].id)
    }

    /// Lazily filter the catalog.
    ///
    /// The returned iterator is `Clone`, so a caller can restart it
    /// without re-running candidate selection. Nothing is copied unless
    /// the caller collects.
    pub fn filter<'a>(&'a self, query: &'a CardQuery) -> CardFilter<'a> {
        let mut lists: Vec<&'a [usize]> = Vec::new();
        if let Some(rarity) = query.rarity {
            lists.push(self.positions(self.by_rarity.get(&rarity)));
        }
        if let Some(cost) = query.converted_cost {
            lists.push(self.positions(self.by_cost.get(&cost)));
        }
        if let Some(format) = &query.legal_in {
            lists.push(self.positions(self.by_format.get(format)));
        }

        let candidates = match lists.into_iter().min_by_key(|l| l.len()) {
            Some(list) => Candidates::Indexed(list.iter()),
            None => Candidates::All(0..self.records.len()),
        };

        CardFilter {
            index: self,
            query,
            candidates,
        }
    }

    fn positions<'a>(&'a self, list: Option<&'a Vec<usize>>) -> &'a [usize] {
        list.map_or(&[], Vec::as_slice)
    }

    fn matches(&self, pos: usize, query: &CardQuery) -> bool {
        let record = &self.records[pos];
        query.rarity.map_or(true, |r| record.rarity == r)
            && query
                .converted_cost
                .map_or(true, |c| record.converted_cost == c)
            && query
                .legal_in
                .as_ref()
                .map_or(true, |f| record.is_legal_in(f))
            && query
                .type_contains
                .as_deref()
                .map_or(true, |needle| self.type_lower[pos].contains(needle))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Clone, Debug)]
enum Candidates<'a> {
    All(std::ops::Range<usize>),
    Indexed(std::slice::Iter<'a, usize>),
}

/// Lazy, restartable filter over a [`CatalogIndex`].
#[derive(Clone, Debug)]
pub struct CardFilter<'a> {
    index: &'a CatalogIndex,
    query: &'a CardQuery,
    candidates: Candidates<'a>,
}

impl<'a> Iterator for CardFilter<'a> {
    type Item = &'a CardRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pos = match &mut self.candidates {
                Candidates::All(range) => range.next()?,
                Candidates::Indexed(iter) => *iter.next()?,
            };
            if self.index.matches(pos, self.query) {
                return Some(&self.index.records[pos]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogIndex {
        CatalogIndex::from_records(vec![
            CardRecord::new("1", "Lightning Bolt", "Instant", "{R}").legal_in("modern"),
            CardRecord::new("2", "Grizzly Bears", "Creature — Bear", "{1}{G}")
                .with_stats("2", "2")
                .legal_in("modern")
                .legal_in("pauper"),
            CardRecord::new("3", "Serra Angel", "Creature — Angel", "{3}{W}{W}")
                .with_rarity(Rarity::Uncommon),
            CardRecord::new("4", "Fireball", "Sorcery", "{X}{R}"),
        ])
    }

    #[test]
    fn test_by_id_and_name() {
        let catalog = sample();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.by_id(&CardId::new("2")).unwrap().name, "Grizzly Bears");
        assert!(catalog.by_id(&CardId::new("99")).is_none());

        assert_eq!(catalog.by_name("lightning bolt"), Some(&CardId::new("1")));
        assert_eq!(catalog.by_name("  SERRA ANGEL "), Some(&CardId::new("3")));
        assert_eq!(catalog.by_name("Shock"), None);
    }

    #[test]
    fn test_name_collision_first_writer_wins() {
        let catalog = CatalogIndex::from_records(vec![
            CardRecord::new("a", "Island", "Basic Land — Island", ""),
            CardRecord::new("b", "ISLAND", "Basic Land — Island", ""),
        ]);
        assert_eq!(catalog.by_name("island"), Some(&CardId::new("a")));
        assert_eq!(catalog.name_collisions().len(), 1);
        assert_eq!(catalog.name_collisions()[0].shadowed, CardId::new("b"));
        assert!(catalog.contains(&CardId::new("b")));
    }

    #[test]
    fn test_filter_by_each_predicate() {
        let catalog = sample();

        let ids = |q: &CardQuery| -> Vec<String> {
            catalog.filter(q).map(|r| r.id.0.clone()).collect()
        };

        assert_eq!(ids(&CardQuery::new()).len(), 4);
        assert_eq!(ids(&CardQuery::new().rarity(Rarity::Uncommon)), vec!["3"]);
        assert_eq!(ids(&CardQuery::new().type_contains("CREATURE")), vec!["2", "3"]);
        assert_eq!(ids(&CardQuery::new().legal_in("Modern")), vec!["1", "2"]);
        assert_eq!(ids(&CardQuery::new().converted_cost(1)), vec!["1", "4"]);
        assert_eq!(ids(&CardQuery::new().converted_cost(5)), vec!["3"]);
    }

    #[test]
    fn test_filter_combines_predicates() {
        let catalog = sample();
        let query = CardQuery::new().legal_in("modern").type_contains("creature");
        let found: Vec<_> = catalog.filter(&query).map(|r| r.name.as_str()).collect();
        assert_eq!(found, vec!["Grizzly Bears"]);

        let none = CardQuery::new().legal_in("vintage");
        assert_eq!(catalog.filter(&none).count(), 0);
    }

    #[test]
    fn test_filter_is_restartable() {
        let catalog = sample();
        let query = CardQuery::new().type_contains("creature");
        let filter = catalog.filter(&query);

        let first: Vec<_> = filter.clone().collect();
        let second: Vec<_> = filter.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_legality_queries() {
        let catalog = sample();
        let pauper = Format::new("pauper");
        assert!(catalog.is_legal_in(&CardId::new("2"), &pauper));
        assert!(!catalog.is_legal_in(&CardId::new("1"), &pauper));
        assert!(!catalog.is_legal_in(&CardId::new("missing"), &pauper));

        let legal: Vec<_> = catalog.legal_ids(&Format::new("modern")).collect();
        assert_eq!(legal, vec![&CardId::new("1"), &CardId::new("2")]);
    }
}
