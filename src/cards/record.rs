//! Card records: the immutable catalog entry behind a card id.
//!
//! Raw records arrive from an external data source as [`RawCardRecord`]
//! (a fixed schema, loosely typed). [`parse_record`] turns one into a
//! typed [`CardRecord`], collecting a [`FieldIssue`] for every field that
//! is wrong instead of stopping at the first.
//!
//! Missing `id` or `name` rejects the record. Every other field degrades
//! to a default and keeps the record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mana::ManaCost;

/// Stable string key of a catalog record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub String);

impl CardId {
    /// Create a new card ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Printed rarity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Mythic,
    Special,
    Bonus,
}

impl Rarity {
    /// Parse a rarity name, case-insensitively.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "common" => Some(Rarity::Common),
            "uncommon" => Some(Rarity::Uncommon),
            "rare" => Some(Rarity::Rare),
            "mythic" | "mythic rare" => Some(Rarity::Mythic),
            "special" => Some(Rarity::Special),
            "bonus" => Some(Rarity::Bonus),
            _ => None,
        }
    }
}

/// Formats the table supports out of the box.
pub const SUPPORTED_FORMATS: [&str; 6] =
    ["standard", "pioneer", "modern", "legacy", "vintage", "pauper"];

/// Play format name, normalized to lowercase.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Format(String);

impl Format {
    /// Normalize a format name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    /// The default format for new decks.
    #[must_use]
    pub fn standard() -> Self {
        Self::new("standard")
    }

    /// Normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is one of [`SUPPORTED_FORMATS`].
    #[must_use]
    pub fn is_supported(&self) -> bool {
        SUPPORTED_FORMATS.contains(&self.0.as_str())
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record exactly as supplied by the catalog source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCardRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_line: String,
    pub mana_cost: String,
    pub text: String,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub rarity: String,
    pub image_reference: Option<String>,
    /// Format name → status (`legal`, `restricted`, `banned`, `not_legal`).
    pub per_format_legality: BTreeMap<String, String>,
    pub set: Option<String>,
}

/// Immutable, typed catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    pub type_line: String,
    /// Cost as written by the source.
    pub mana_cost_text: String,
    /// Parsed cost; empty when the source string was malformed.
    pub mana_cost: ManaCost,
    /// Converted cost; 0 when the source string was malformed.
    pub converted_cost: u32,
    pub oracle_text: String,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub rarity: Rarity,
    pub legal_formats: BTreeSet<Format>,
    pub set_code: Option<String>,
    pub image_reference: Option<String>,
}

impl CardRecord {
    /// Minimal record for tests and fixtures.
    ///
    /// ```
    /// use rust_ccg_sync::cards::{CardRecord, Rarity};
    ///
    /// let bolt = CardRecord::new("lea-161", "Lightning Bolt", "Instant", "{R}")
    ///     .with_rarity(Rarity::Common)
    ///     .legal_in("modern");
    /// assert_eq!(bolt.converted_cost, 1);
    /// assert!(bolt.is_legal_in(&"Modern".into()));
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        type_line: impl Into<String>,
        mana_cost: impl Into<String>,
    ) -> Self {
        let mana_cost_text = mana_cost.into();
        let mana_cost = ManaCost::parse(&mana_cost_text).unwrap_or_default();
        Self {
            id: CardId::new(id),
            name: name.into(),
            type_line: type_line.into(),
            converted_cost: mana_cost.converted(),
            mana_cost,
            mana_cost_text,
            oracle_text: String::new(),
            power: None,
            toughness: None,
            rarity: Rarity::Common,
            legal_formats: BTreeSet::new(),
            set_code: None,
            image_reference: None,
        }
    }

    /// Set the rarity.
    #[must_use]
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Mark the card legal in a format.
    #[must_use]
    pub fn legal_in(mut self, format: impl AsRef<str>) -> Self {
        self.legal_formats.insert(Format::new(format));
        self
    }

    /// Set power and toughness.
    #[must_use]
    pub fn with_stats(mut self, power: impl Into<String>, toughness: impl Into<String>) -> Self {
        self.power = Some(power.into());
        self.toughness = Some(toughness.into());
        self
    }

    /// True if the card may be played in `format`.
    #[must_use]
    pub fn is_legal_in(&self, format: &Format) -> bool {
        self.legal_formats.contains(format)
    }
}

impl From<&str> for Format {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Field of a raw record that failed to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordField {
    Id,
    Name,
    ManaCost,
    Rarity,
    Legality,
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordField::Id => "id",
            RecordField::Name => "name",
            RecordField::ManaCost => "manaCost",
            RecordField::Rarity => "rarity",
            RecordField::Legality => "perFormatLegality",
        };
        f.write_str(name)
    }
}

/// One problem found in one field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct FieldIssue {
    pub field: RecordField,
    pub reason: String,
}

impl FieldIssue {
    fn new(field: RecordField, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }

    /// True if the record cannot be kept with this issue.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self.field, RecordField::Id | RecordField::Name)
    }
}

/// A parsed record together with the non-fatal issues that were defaulted.
#[derive(Clone, Debug)]
pub struct ParsedRecord {
    pub record: CardRecord,
    pub issues: Vec<FieldIssue>,
}

/// Parse one raw record.
///
/// # Errors
///
/// Returns every issue found (fatal and non-fatal) when `id` or `name`
/// is missing.
pub fn parse_record(raw: &RawCardRecord) -> Result<ParsedRecord, Vec<FieldIssue>> {
    let mut issues = Vec::new();

    let id = raw.id.trim();
    if id.is_empty() {
        issues.push(FieldIssue::new(RecordField::Id, "missing"));
    }
    let name = raw.name.trim();
    if name.is_empty() {
        issues.push(FieldIssue::new(RecordField::Name, "missing"));
    }

    let mana_cost = match ManaCost::parse(&raw.mana_cost) {
        Ok(cost) => cost,
        Err(e) => {
            issues.push(FieldIssue::new(RecordField::ManaCost, e.to_string()));
            ManaCost::default()
        }
    };

    let rarity = match Rarity::parse(&raw.rarity) {
        Some(rarity) => rarity,
        None => {
            issues.push(FieldIssue::new(
                RecordField::Rarity,
                format!("unknown rarity {:?}", raw.rarity),
            ));
            Rarity::default()
        }
    };

    let mut legal_formats = BTreeSet::new();
    for (format, status) in &raw.per_format_legality {
        match status.trim().to_ascii_lowercase().as_str() {
            "legal" | "restricted" => {
                legal_formats.insert(Format::new(format));
            }
            "banned" | "not_legal" => {}
            other => issues.push(FieldIssue::new(
                RecordField::Legality,
                format!("unknown status {:?} for {}", other, format),
            )),
        }
    }

    if issues.iter().any(FieldIssue::is_fatal) {
        return Err(issues);
    }

    let record = CardRecord {
        id: CardId::new(id),
        name: name.to_string(),
        type_line: raw.type_line.trim().to_string(),
        mana_cost_text: raw.mana_cost.clone(),
        converted_cost: mana_cost.converted(),
        mana_cost,
        oracle_text: raw.text.clone(),
        power: non_empty(raw.power.as_deref()),
        toughness: non_empty(raw.toughness.as_deref()),
        rarity,
        legal_formats,
        set_code: non_empty(raw.set.as_deref()),
        image_reference: non_empty(raw.image_reference.as_deref()),
    };

    Ok(ParsedRecord { record, issues })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str, cost: &str) -> RawCardRecord {
        RawCardRecord {
            id: id.to_string(),
            name: name.to_string(),
            type_line: "Creature — Goblin".to_string(),
            mana_cost: cost.to_string(),
            rarity: "common".to_string(),
            ..RawCardRecord::default()
        }
    }

    #[test]
    fn test_parse_clean_record() {
        let mut input = raw("m19-1", "Goblin Instigator", "{1}{R}");
        input.power = Some("1".to_string());
        input.toughness = Some("1".to_string());
        input.set = Some("m19".to_string());
        input
            .per_format_legality
            .insert("Modern".to_string(), "legal".to_string());
        input
            .per_format_legality
            .insert("standard".to_string(), "not_legal".to_string());

        let parsed = parse_record(&input).unwrap();
        assert!(parsed.issues.is_empty());

        let record = parsed.record;
        assert_eq!(record.id, CardId::new("m19-1"));
        assert_eq!(record.converted_cost, 2);
        assert_eq!(record.power.as_deref(), Some("1"));
        assert_eq!(record.set_code.as_deref(), Some("m19"));
        assert!(record.is_legal_in(&Format::new("modern")));
        assert!(!record.is_legal_in(&Format::standard()));
    }

    #[test]
    fn test_malformed_cost_defaults_to_zero() {
        let parsed = parse_record(&raw("x1", "Broken", "{2}{B")).unwrap();
        assert_eq!(parsed.record.converted_cost, 0);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].field, RecordField::ManaCost);
        assert!(!parsed.issues[0].is_fatal());
    }

    #[test]
    fn test_issues_accumulate() {
        let mut input = raw("", "", "oops");
        input.rarity = "legendary".to_string();

        let issues = parse_record(&input).unwrap_err();
        let fields: Vec<_> = issues.iter().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec![RecordField::Id, RecordField::Name, RecordField::ManaCost, RecordField::Rarity]
        );
    }

    #[test]
    fn test_unknown_rarity_is_not_fatal() {
        let mut input = raw("a", "A", "");
        input.rarity = "ultra".to_string();
        let parsed = parse_record(&input).unwrap();
        assert_eq!(parsed.record.rarity, Rarity::Common);
        assert_eq!(parsed.issues[0].field, RecordField::Rarity);
    }

    #[test]
    fn test_blank_optionals_are_none() {
        let mut input = raw("a", "A", "");
        input.power = Some("  ".to_string());
        let record = parse_record(&input).unwrap().record;
        assert_eq!(record.power, None);
        assert_eq!(record.toughness, None);
    }

    #[test]
    fn test_raw_record_json_schema() {
        let json = r#"{
            "id": "abc",
            "name": "Counterspell",
            "type": "Instant",
            "manaCost": "{U}{U}",
            "text": "Counter target spell.",
            "rarity": "Uncommon",
            "imageReference": "atlas://0/12",
            "perFormatLegality": { "pauper": "legal", "modern": "not_legal" }
        }"#;
        let raw: RawCardRecord = serde_json::from_str(json).unwrap();
        let record = parse_record(&raw).unwrap().record;
        assert_eq!(record.type_line, "Instant");
        assert_eq!(record.converted_cost, 2);
        assert_eq!(record.rarity, Rarity::Uncommon);
        assert!(record.is_legal_in(&Format::new("pauper")));
        assert_eq!(record.image_reference.as_deref(), Some("atlas://0/12"));
    }

    #[test]
    fn test_format_normalization() {
        assert_eq!(Format::new(" Modern "), Format::new("modern"));
        assert!(Format::new("PAUPER").is_supported());
        assert!(!Format::new("commander").is_supported());
    }
}
