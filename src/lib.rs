//! # rust-ccg-sync
//!
//! Shared card-table state: replicated per-seat decks and a bounded card
//! resource cache over a large, immutable catalog.
//!
//! ## Design Principles
//!
//! 1. **Single Writer**: Each seat's deck has one owner at a time. Every
//!    mutation presents a `WriteToken`; everyone else only mirrors.
//!
//! 2. **Whole Snapshots**: Owners broadcast complete, versioned snapshots.
//!    Observers apply strictly newer versions in full or not at all.
//!
//! 3. **No Globals**: A `Session` owns the catalog, the atlas cache, and
//!    the seat table, and is passed to whatever needs them.
//!
//! ## Architecture
//!
//! - **Catalog Index**: Loaded once per session, never mutated. Bad records
//!   are skipped or defaulted, never fatal.
//!
//! - **Atlas Slice Cache**: FIFO capacity eviction plus an idle sweep.
//!   Unresolvable artwork is a typed value, not an error.
//!
//! - **Persistent Data Structures**: Deck slots are `im::Vector`, so
//!   snapshots clone in O(1).
//!
//! ## Modules
//!
//! - `core`: Seats, RNG, clocks, configuration
//! - `cards`: Card records, mana cost, catalog index
//! - `atlas`: UV slices, atlas surfaces, artwork cache
//! - `deck`: Deck store, ownership gate, validator, deck lists
//! - `replication`: Snapshot messages, delivery, replicator state machine
//! - `session`: Per-table context object

pub mod core;
pub mod cards;
pub mod atlas;
pub mod deck;
pub mod replication;
pub mod session;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    SeatId, ParticipantId,
    ShuffleRng, ShuffleRngState,
    Clock, ManualClock, MonotonicClock,
    CacheConfig, DeckLimits, SessionConfig,
};

pub use crate::cards::{
    CardId, CardRecord, RawCardRecord, Rarity, Format,
    ManaCost, converted_cost,
    CatalogIndex, CardQuery, LoadReport,
};

pub use crate::atlas::{
    UvRect, UvSlice, UvTable,
    AtlasSurface, AtlasSet, RgbaSurface, CardImage,
    AtlasSliceCache, Resolution, Unresolved, CacheStats,
    MaintenanceSchedule,
};

pub use crate::deck::{
    DeckStore, DeckEntry, DeckEdit, DeckSnapshot, EditOutcome, Section,
    OwnershipAuthority, SharedOwnership, WriteToken,
    validate, validate_with_catalog, Verdict, Violation,
    DeckList, ImportReport, export, import,
};

pub use crate::replication::{
    DeckReplicator, ReplicatorState, ApplyOutcome, DeckObserver,
    SnapshotMessage, SnapshotSink, SnapshotBus,
};

pub use crate::session::{Session, CardView};

pub use crate::error::{
    DeckError, ConfigError, CatalogError, AtlasError, ListingError,
    ReplicationError, SessionError,
};
