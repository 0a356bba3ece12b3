//! Card catalog: records, mana costs, and the catalog index.
//!
//! ## Key Types
//!
//! - `CardId`: Stable string key shared by decks, atlas slices, and records
//! - `CardRecord`: Immutable display and legality data for one card
//! - `ManaCost`: Parsed symbolic cost with converted-cost rule
//! - `CatalogIndex`: Id, name, and filter lookup over the session catalog

pub mod mana;
pub mod record;
pub mod catalog;

pub use mana::{converted_cost, ManaCost, ManaCostError, ManaSymbol};
pub use record::{
    parse_record, CardId, CardRecord, FieldIssue, Format, ParsedRecord, RawCardRecord, Rarity,
    RecordField, SUPPORTED_FORMATS,
};
pub use catalog::{CardFilter, CardQuery, CatalogIndex, LoadReport, NameCollision, RecordIssue};
