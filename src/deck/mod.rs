//! Per-seat decks: storage, ownership gate, construction rules, listings.
//!
//! ## Key Types
//!
//! - `DeckStore`: Fixed-capacity main and sideboard slots with a draw cursor
//! - `WriteToken`: Proof of write ownership, required by every mutation
//! - `OwnershipAuthority`: Transport-provided ownership primitive
//! - `Verdict`: Result of checking construction rules
//! - `DeckList`: Slot-free deck contents for persistence and import/export

pub mod ownership;
pub mod store;
pub mod validator;
pub mod listing;

pub use ownership::{OwnershipAuthority, ParticipantView, SharedOwnership, WriteToken};
pub use store::{DeckEdit, DeckEntry, DeckSnapshot, DeckStore, EditOutcome, Section, DEFAULT_DECK_NAME};
pub use validator::{validate, validate_with_catalog, Verdict, Violation};
pub use listing::{export, import, DeckList, ImportReport};
