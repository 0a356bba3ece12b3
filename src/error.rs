//! Error types.
//!
//! Only conditions the caller must act on are errors. Bounded-container
//! no-ops (full deck, draw past end, remove of an absent id) and lookup
//! misses are ordinary `Ok`/`Option` values.

use thiserror::Error;

use crate::core::SeatId;
use crate::deck::Verdict;
use crate::replication::ReplicatorState;

/// Rejected deck mutation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeckError {
    /// The caller does not hold write ownership of the seat.
    #[error("{seat} is not owned by the caller")]
    OwnershipDenied {
        /// Seat whose store was targeted.
        seat: SeatId,
    },
    /// A token issued for one seat was presented to another seat's store.
    #[error("write token for {token_seat} presented to {seat}")]
    SeatMismatch {
        /// Seat whose store was targeted.
        seat: SeatId,
        /// Seat the token grants.
        token_seat: SeatId,
    },
}

/// Unusable session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("at most 255 seats are supported, got {0}")]
    TooManySeats(usize),
    #[error("min_main {min_main} can never be reached with main capacity {main_capacity}")]
    Unreachable { min_main: usize, main_capacity: usize },
}

/// Catalog load failure. Individual bad records are never errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog document could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog produced no usable records ({rejected} rejected)")]
    Empty { rejected: usize },
}

/// Invalid atlas mapping data.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AtlasError {
    /// A rectangle component outside `[0, 1]`.
    #[error("uv component {component} = {value} is outside [0, 1]")]
    OutOfRange { component: &'static str, value: f32 },
    /// A mapping table line that does not parse.
    #[error("mapping line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
}

/// Unreadable persisted deck text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("persisted deck has none of the keys name, format, mainDeck, sideboard")]
    NoRecognizedKeys,
}

/// Replication contract violation.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error(transparent)]
    Deck(#[from] DeckError),
    /// Operation requires `Idle` (begin edit, ownership transfer, apply).
    #[error("replicator is {0}, not idle")]
    NotIdle(ReplicatorState),
    /// Operation requires an open edit batch.
    #[error("replicator is {0}, not editing")]
    NotEditing(ReplicatorState),
    /// The committed deck breaks construction rules; nothing was sent.
    #[error("deck failed validation: {0}")]
    Invalid(Verdict),
    /// Snapshot addressed to a different seat.
    #[error("snapshot for {got} delivered to replicator for {expected}")]
    WrongSeat { expected: SeatId, got: SeatId },
    #[error("snapshot encoding failed: {0}")]
    Encode(bincode::Error),
    /// Payload did not decode; nothing was applied.
    #[error("snapshot decoding failed: {0}")]
    Decode(bincode::Error),
    /// No observer is listening any more.
    #[error("snapshot channel closed")]
    ChannelClosed,
}

/// Session start-up or seat management failure.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{seat} is outside the table's {max_seats} seats")]
    SeatOutOfRange { seat: SeatId, max_seats: usize },
    #[error("{0} is already assigned")]
    SeatTaken(SeatId),
    #[error("{0} is not assigned")]
    SeatNotAssigned(SeatId),
    #[error(transparent)]
    Replication(#[from] ReplicationError),
}
