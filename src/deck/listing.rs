//! Deck lists outside a live store: the persisted key/value form and the
//! human-readable "count name" form.
//!
//! ## Persisted form
//!
//! ```text
//! name:Mono Red
//! format:standard
//! mainDeck:bolt,bolt,mountain
//! sideboard:smash
//! ```
//!
//! ## Human form
//!
//! ```text
//! // Mono Red
//! // Format: standard
//! // Main Deck
//! 1 Lightning Bolt
//! 1 Lightning Bolt
//! 1 Mountain
//! Sideboard
//! 1 Smash to Smithereens
//! ```
//!
//! Import reads `<count> <name>` lines. Blank lines and `//` comments are
//! ignored, and a line containing the word `sideboard` switches sections.
//! A line that parses as a card wins over the section switch, so a card
//! whose name contains "sideboard" is still imported as a card.
//!
//! The human form carries names, not ids. Names resolve through
//! [`CatalogIndex::by_name`], where the first record with a name wins, so
//! a printing that shares its name with an earlier one comes back as the
//! earlier id. Use the persisted form when exact ids matter.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::store::DEFAULT_DECK_NAME;
use crate::cards::{CardId, CatalogIndex, Format};
use crate::error::ListingError;

/// A deck's name, format, and card ids, independent of slot layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub name: String,
    pub format: Format,
    pub main: Vec<CardId>,
    pub sideboard: Vec<CardId>,
}

impl Default for DeckList {
    fn default() -> Self {
        Self::new(DEFAULT_DECK_NAME, Format::standard())
    }
}

impl DeckList {
    /// Create an empty list.
    pub fn new(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            format,
            main: Vec::new(),
            sideboard: Vec::new(),
        }
    }

    /// Set main deck ids (builder pattern).
    #[must_use]
    pub fn with_main(mut self, ids: impl IntoIterator<Item = CardId>) -> Self {
        self.main = ids.into_iter().collect();
        self
    }

    /// Set sideboard ids (builder pattern).
    #[must_use]
    pub fn with_sideboard(mut self, ids: impl IntoIterator<Item = CardId>) -> Self {
        self.sideboard = ids.into_iter().collect();
        self
    }

    /// Write the persisted key/value form.
    #[must_use]
    pub fn to_persisted(&self) -> String {
        let join = |ids: &[CardId]| ids.iter().map(CardId::as_str).collect::<Vec<_>>().join(",");
        format!(
            "name:{}\nformat:{}\nmainDeck:{}\nsideboard:{}\n",
            self.name,
            self.format,
            join(&self.main),
            join(&self.sideboard)
        )
    }

    /// Read the persisted key/value form.
    ///
    /// Unknown keys are ignored, a value may itself contain `:`, and
    /// missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// `ListingError::NoRecognizedKeys` if no line names a known key.
    pub fn from_persisted(text: &str) -> Result<Self, ListingError> {
        let mut list = Self::default();
        let mut recognized = false;

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "name" => list.name = value.to_string(),
                "format" => list.format = Format::new(value),
                "mainDeck" => list.main = split_ids(value),
                "sideboard" => list.sideboard = split_ids(value),
                _ => continue,
            }
            recognized = true;
        }

        if recognized {
            Ok(list)
        } else {
            Err(ListingError::NoRecognizedKeys)
        }
    }
}

fn split_ids(value: &str) -> Vec<CardId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(CardId::new)
        .collect()
}

/// Write the human-readable form, one `1 <Name>` line per copy.
///
/// Ids missing from the catalog are written as the id itself.
#[must_use]
pub fn export(list: &DeckList, catalog: &CatalogIndex) -> String {
    let mut out = String::new();
    out.push_str(&format!("// {}\n", list.name));
    out.push_str(&format!("// Format: {}\n", list.format));
    out.push_str("// Main Deck\n");
    write_cards(&mut out, &list.main, catalog);

    if !list.sideboard.is_empty() {
        out.push_str("\nSideboard\n");
        write_cards(&mut out, &list.sideboard, catalog);
    }
    out
}

fn write_cards(out: &mut String, ids: &[CardId], catalog: &CatalogIndex) {
    for id in ids {
        let name = catalog.name_of(id).unwrap_or_else(|| {
            warn!(card = %id, "exporting unknown card by id");
            id.as_str()
        });
        out.push_str("1 ");
        out.push_str(name);
        out.push('\n');
    }
}

/// Result of [`import`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportReport {
    pub list: DeckList,
    /// Lines that were neither cards, comments, nor section markers, and
    /// card lines naming cards the catalog does not know.
    pub skipped: Vec<String>,
}

/// Read the human-readable form.
///
/// Names are resolved case-insensitively through the catalog.
#[must_use]
pub fn import(text: &str, catalog: &CatalogIndex, name: impl Into<String>, format: Format) -> ImportReport {
    let mut list = DeckList::new(name, format);
    let mut skipped = Vec::new();
    let mut in_sideboard = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some((count, card_name)) = parse_card_line(line) {
            match catalog.by_name(card_name) {
                Some(id) => {
                    let section = if in_sideboard { &mut list.sideboard } else { &mut list.main };
                    section.extend(std::iter::repeat(id.clone()).take(usize::from(count)));
                }
                None => {
                    warn!(name = card_name, "import skipped unknown card");
                    skipped.push(raw.to_string());
                }
            }
            continue;
        }

        if is_sideboard_marker(line) {
            in_sideboard = true;
            continue;
        }

        skipped.push(raw.to_string());
    }

    ImportReport { list, skipped }
}

fn parse_card_line(line: &str) -> Option<(u16, &str)> {
    let (count, name) = line.split_once(char::is_whitespace)?;
    let count: u16 = count.parse().ok()?;
    let name = name.trim();
    (count > 0 && !name.is_empty()).then_some((count, name))
}

fn is_sideboard_marker(line: &str) -> bool {
    line.split_whitespace()
        .any(|word| word.trim_end_matches(':').eq_ignore_ascii_case("sideboard"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRecord;

    fn catalog() -> CatalogIndex {
        CatalogIndex::from_records([
            CardRecord::new("bolt", "Lightning Bolt", "Instant", "{R}"),
            CardRecord::new("mtn", "Mountain", "Basic Land — Mountain", ""),
            CardRecord::new("smash", "Smash to Smithereens", "Instant", "{1}{R}"),
            CardRecord::new("sbrat", "Sideboard Rat", "Creature — Rat", "{B}"),
        ])
    }

    fn ids(names: &[&str]) -> Vec<CardId> {
        names.iter().map(|s| CardId::new(*s)).collect()
    }

    #[test]
    fn test_shared_name_imports_as_first_printing() {
        let catalog = CatalogIndex::from_records([
            CardRecord::new("isl-a", "Island", "Basic Land — Island", ""),
            CardRecord::new("isl-b", "Island", "Basic Land — Island", ""),
        ]);
        let list = DeckList::default().with_main(ids(&["isl-b", "isl-a"]));

        let report = import(&export(&list, &catalog), &catalog, "Islands", Format::standard());
        assert!(report.skipped.is_empty());
        assert_eq!(report.list.main, ids(&["isl-a", "isl-a"]));

        let persisted = DeckList::from_persisted(&list.to_persisted()).unwrap();
        assert_eq!(persisted.main, list.main);
    }

    #[test]
    fn test_persisted_round_trip() {
        let list = DeckList::new("Mono Red", Format::standard())
            .with_main(ids(&["bolt", "bolt", "mtn"]))
            .with_sideboard(ids(&["smash"]));
        let text = list.to_persisted();
        assert!(text.contains("mainDeck:bolt,bolt,mtn"));
        assert_eq!(DeckList::from_persisted(&text).unwrap(), list);
    }

    #[test]
    fn test_persisted_is_lenient() {
        let list = DeckList::from_persisted("name:Deck: the sequel\ncolor:red\nsideboard:\nmainDeck: a , ,b\n")
            .unwrap();
        assert_eq!(list.name, "Deck: the sequel");
        assert_eq!(list.format, Format::standard());
        assert_eq!(list.main, ids(&["a", "b"]));
        assert!(list.sideboard.is_empty());

        assert_eq!(
            DeckList::from_persisted("hello\nworld:1"),
            Err(ListingError::NoRecognizedKeys)
        );
    }

    #[test]
    fn test_export_layout() {
        let list = DeckList::new("Burn", Format::new("modern"))
            .with_main(ids(&["bolt", "bolt"]))
            .with_sideboard(ids(&["smash"]));
        let text = export(&list, &catalog());
        assert_eq!(
            text,
            "// Burn\n// Format: modern\n// Main Deck\n1 Lightning Bolt\n1 Lightning Bolt\n\nSideboard\n1 Smash to Smithereens\n"
        );
    }

    #[test]
    fn test_import_sections_and_counts() {
        let text = "4 lightning bolt\n  20 Mountain  \n\n// comment\nSideboard:\n2 Smash to Smithereens\n";
        let report = import(text, &catalog(), "Burn", Format::standard());

        assert_eq!(report.list.main.len(), 24);
        assert_eq!(report.list.main.iter().filter(|id| id.as_str() == "bolt").count(), 4);
        assert_eq!(report.list.sideboard, ids(&["smash", "smash"]));
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_import_reports_skipped_lines() {
        let text = "1 Black Lotus\nnot a card\n1 Mountain\n0 Mountain\n";
        let report = import(text, &catalog(), "x", Format::standard());
        assert_eq!(report.list.main, ids(&["mtn"]));
        assert_eq!(report.skipped, vec!["1 Black Lotus", "not a card", "0 Mountain"]);
    }

    #[test]
    fn test_card_line_wins_over_section_marker() {
        let report = import("1 Sideboard Rat\n", &catalog(), "x", Format::standard());
        assert_eq!(report.list.main, ids(&["sbrat"]));
        assert!(report.list.sideboard.is_empty());
    }

    #[test]
    fn test_import_of_export_keeps_sections() {
        let list = DeckList::new("Burn", Format::standard())
            .with_main(ids(&["bolt", "mtn", "bolt", "sbrat"]))
            .with_sideboard(ids(&["smash", "bolt"]));
        let report = import(&export(&list, &catalog()), &catalog(), "Burn", Format::standard());

        assert_eq!(report.list, list);
        assert!(report.skipped.is_empty());
    }
}
