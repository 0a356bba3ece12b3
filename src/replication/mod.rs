//! Deck replication: versioned snapshots from a seat's owner to observers.
//!
//! ## Key Types
//!
//! - `DeckReplicator`: Edit/commit/receive state machine for one seat
//! - `SnapshotMessage`: `{seat, version, payload}` wire message
//! - `SnapshotSink`: Transport seam; `SnapshotBus` is the in-process fan-out
//! - `DeckObserver`: Presentation hook fired on every deck change

pub mod message;
pub mod bus;
pub mod replicator;

pub use message::SnapshotMessage;
pub use bus::{SnapshotBus, SnapshotSink};
pub use replicator::{ApplyOutcome, DeckObserver, DeckReplicator, ReplicatorState};
