//! Deck replicator: the replication state machine around one seat's store.
//!
//! ```text
//!            begin_edit (owner)             commit: valid
//!   Idle ─────────────────────▶ Editing ─────────────────▶ Broadcasting ──▶ Idle
//!    │ ▲                          │  ▲                                  send ok
//!    │ │                 discard  │  │ commit: invalid
//!    │ └──────────────────────────┘  └─ stays Editing
//!    │
//!    └── receive (observer) ──▶ Applying ──▶ Idle
//! ```
//!
//! Every participant holds a replicator per seat. The owner edits and
//! commits; everyone else receives. There is no terminal state.
//!
//! Edits inside a batch are applied to the local store immediately. A
//! commit validates the result (if the batch touched the card list after
//! its last reset) and broadcasts it; an invalid deck blocks the commit and the batch stays
//! open for correction or [`DeckReplicator::discard_edit`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bus::SnapshotSink;
use super::message::SnapshotMessage;
use crate::cards::CatalogIndex;
use crate::core::{DeckLimits, SeatId, ShuffleRng};
use crate::deck::{
    validate, validate_with_catalog, DeckEdit, DeckSnapshot, DeckStore, EditOutcome,
    OwnershipAuthority, Verdict, WriteToken,
};
use crate::error::ReplicationError;

/// Replication state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplicatorState {
    Idle,
    Editing,
    Broadcasting,
    Applying,
}

impl fmt::Display for ReplicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReplicatorState::Idle => "idle",
            ReplicatorState::Editing => "editing",
            ReplicatorState::Broadcasting => "broadcasting",
            ReplicatorState::Applying => "applying",
        })
    }
}

/// Local presentation hook, fired after every commit or applied snapshot.
pub trait DeckObserver {
    fn deck_changed(&mut self, store: &DeckStore, version: u64);
}

impl<F> DeckObserver for F
where
    F: FnMut(&DeckStore, u64),
{
    fn deck_changed(&mut self, store: &DeckStore, version: u64) {
        self(store, version);
    }
}

/// Result of [`DeckReplicator::receive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The mirror now reflects `version`.
    Applied { version: u64 },
    /// The message was not newer than `current` and was dropped.
    Stale { version: u64, current: u64 },
}

/// One seat's deck plus its replication contract.
pub struct DeckReplicator {
    store: DeckStore,
    state: ReplicatorState,
    version: u64,
    committed: DeckSnapshot,
    list_edited: bool,
    limits: DeckLimits,
    catalog: Option<Arc<CatalogIndex>>,
    observers: Vec<Box<dyn DeckObserver + Send>>,
}

impl fmt::Debug for DeckReplicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckReplicator")
            .field("seat", &self.store.seat())
            .field("state", &self.state)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl DeckReplicator {
    /// Create an idle replicator with an empty store at version 0.
    #[must_use]
    pub fn new(seat: SeatId, limits: DeckLimits, rng: ShuffleRng) -> Self {
        let store = DeckStore::new(seat, &limits, rng);
        let committed = store.snapshot();
        Self {
            store,
            state: ReplicatorState::Idle,
            version: 0,
            committed,
            list_edited: false,
            limits,
            catalog: None,
            observers: Vec::new(),
        }
    }

    /// Validate commits against a catalog as well (builder pattern).
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<CatalogIndex>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Register a presentation hook.
    pub fn add_observer(&mut self, observer: impl DeckObserver + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn require(&self, expected: ReplicatorState) -> Result<(), ReplicationError> {
        match (expected, self.state) {
            (a, b) if a == b => Ok(()),
            (ReplicatorState::Editing, state) => Err(ReplicationError::NotEditing(state)),
            (_, state) => Err(ReplicationError::NotIdle(state)),
        }
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer.deck_changed(&self.store, self.version);
        }
    }

    /// Open an edit batch.
    ///
    /// # Errors
    ///
    /// `NotIdle` outside `Idle`; `Deck` if the token does not own the seat.
    pub fn begin_edit(&mut self, token: &WriteToken<'_>) -> Result<(), ReplicationError> {
        self.require(ReplicatorState::Idle)?;
        token.check(self.seat())?;
        self.state = ReplicatorState::Editing;
        self.list_edited = false;
        Ok(())
    }

    /// Apply one edit to the local store.
    ///
    /// # Errors
    ///
    /// `NotEditing` without an open batch; `Deck` if ownership was lost.
    pub fn apply(&mut self, token: &WriteToken<'_>, edit: DeckEdit) -> Result<EditOutcome, ReplicationError> {
        self.require(ReplicatorState::Editing)?;
        let outcome = self.store.apply_edit(token, &edit)?;
        match edit {
            // An emptied deck is broadcast regardless of legality.
            DeckEdit::Reset => self.list_edited = false,
            ref edit if edit.is_list_edit() => self.list_edited = true,
            _ => {}
        }
        Ok(outcome)
    }

    /// Validate the batch's result.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        match &self.catalog {
            Some(catalog) => validate_with_catalog(&self.store, &self.limits, catalog),
            None => validate(&self.store, &self.limits),
        }
    }

    /// Close the batch: validate, broadcast, notify. Returns the new version.
    ///
    /// A batch of only shuffles, draws, and renames is not validated, so
    /// play can continue on a deck that has since become illegal. Neither
    /// is a batch whose last list edit is a reset.
    ///
    /// # Errors
    ///
    /// - `Invalid`: the batch stays open and nothing is sent.
    /// - `ChannelClosed`/`Encode`: the batch stays open; commit may be retried.
    /// - `NotEditing`, `Deck`: state unchanged.
    pub fn commit(&mut self, token: &WriteToken<'_>, sink: &dyn SnapshotSink) -> Result<u64, ReplicationError> {
        self.require(ReplicatorState::Editing)?;
        token.check(self.seat())?;

        if self.list_edited {
            let verdict = self.verdict();
            if !verdict.is_valid() {
                warn!(seat = %self.seat(), %verdict, "commit blocked by validation");
                return Err(ReplicationError::Invalid(verdict));
            }
        }

        self.state = ReplicatorState::Broadcasting;
        let next = self.version + 1;
        let snapshot = self.store.snapshot();
        let sent = SnapshotMessage::encode(&snapshot, next).and_then(|message| sink.send(message));
        if let Err(err) = sent {
            self.state = ReplicatorState::Editing;
            return Err(err);
        }

        self.version = next;
        self.committed = snapshot;
        self.list_edited = false;
        self.notify();
        self.state = ReplicatorState::Idle;
        debug!(seat = %self.seat(), version = next, "deck committed");
        Ok(next)
    }

    /// Abandon the batch and restore the last committed state.
    ///
    /// # Errors
    ///
    /// `NotEditing` without an open batch.
    pub fn discard_edit(&mut self) -> Result<(), ReplicationError> {
        self.require(ReplicatorState::Editing)?;
        self.store.restore(&self.committed);
        self.list_edited = false;
        self.state = ReplicatorState::Idle;
        Ok(())
    }

    /// Apply a snapshot from the seat's owner.
    ///
    /// Only strictly newer versions are applied; older or repeated ones
    /// are dropped with a warning. A snapshot is applied whole or not at
    /// all.
    ///
    /// # Errors
    ///
    /// `WrongSeat` for another seat's message, `NotIdle` while editing,
    /// `Decode` for a corrupt payload. The mirror is unchanged in every case.
    pub fn receive(&mut self, message: &SnapshotMessage) -> Result<ApplyOutcome, ReplicationError> {
        if message.seat != self.seat() {
            return Err(ReplicationError::WrongSeat {
                expected: self.seat(),
                got: message.seat,
            });
        }
        self.require(ReplicatorState::Idle)?;

        if message.version <= self.version {
            warn!(
                seat = %self.seat(),
                version = message.version,
                current = self.version,
                "stale snapshot dropped"
            );
            return Ok(ApplyOutcome::Stale {
                version: message.version,
                current: self.version,
            });
        }

        let snapshot = message.decode()?;
        self.state = ReplicatorState::Applying;
        self.store.restore(&snapshot);
        self.version = message.version;
        self.committed = self.store.snapshot();
        self.notify();
        self.state = ReplicatorState::Idle;
        debug!(seat = %self.seat(), version = self.version, "snapshot applied");
        Ok(ApplyOutcome::Applied {
            version: self.version,
        })
    }

    /// Ask the authority for ownership of this seat.
    ///
    /// # Errors
    ///
    /// `NotIdle` mid-edit; transfer is only allowed between batches.
    pub fn request_ownership(&self, authority: &dyn OwnershipAuthority) -> Result<(), ReplicationError> {
        self.require(ReplicatorState::Idle)?;
        authority.request_ownership(self.seat());
        Ok(())
    }

    /// Clear everything and return to version 0. Used on seat release.
    pub(crate) fn release(&mut self) {
        self.store.clear();
        self.state = ReplicatorState::Idle;
        self.version = 0;
        self.committed = self.store.snapshot();
        self.list_edited = false;
    }

    /// Seat this replicator serves.
    #[must_use]
    pub fn seat(&self) -> SeatId {
        self.store.seat()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ReplicatorState {
        self.state
    }

    /// Last committed or applied version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Local store (mid-batch edits included).
    #[must_use]
    pub fn store(&self) -> &DeckStore {
        &self.store
    }

    /// Last committed or applied state.
    #[must_use]
    pub fn committed(&self) -> &DeckSnapshot {
        &self.committed
    }

    /// Deck limits this replicator validates against.
    #[must_use]
    pub fn limits(&self) -> &DeckLimits {
        &self.limits
    }
}
