//! Single-writer ownership of a seat's deck.
//!
//! The transport layer decides who owns a replicated object. This module
//! only needs two questions answered, captured by [`OwnershipAuthority`]:
//! "does the local participant own this seat?" and "please make it so".
//!
//! A [`WriteToken`] is proof that ownership was checked. Every mutating
//! deck operation takes one, and re-checks it, so an edit can never be
//! applied by a participant that lost ownership after acquiring a token.
//!
//! [`SharedOwnership`] is an in-process authority for hosts that run every
//! participant in one process (hot-seat play, tests).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::{ParticipantId, SeatId};
use crate::error::DeckError;

/// Ownership primitive provided by the transport.
pub trait OwnershipAuthority: std::fmt::Debug {
    /// True if the local participant currently owns `seat`.
    fn is_owner(&self, seat: SeatId) -> bool;

    /// Ask for ownership of `seat`.
    ///
    /// The grant may be asynchronous; callers check [`is_owner`] again
    /// before editing.
    ///
    /// [`is_owner`]: OwnershipAuthority::is_owner
    fn request_ownership(&self, seat: SeatId);
}

/// Capability to mutate one seat's deck.
///
/// Only obtainable through [`WriteToken::acquire`].
#[derive(Clone, Copy, Debug)]
pub struct WriteToken<'a> {
    seat: SeatId,
    authority: &'a dyn OwnershipAuthority,
}

impl<'a> WriteToken<'a> {
    /// Acquire a token for `seat`.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::OwnershipDenied` if the local participant does
    /// not own the seat.
    pub fn acquire(authority: &'a dyn OwnershipAuthority, seat: SeatId) -> Result<Self, DeckError> {
        if authority.is_owner(seat) {
            Ok(Self { seat, authority })
        } else {
            Err(DeckError::OwnershipDenied { seat })
        }
    }

    /// Seat this token grants.
    #[must_use]
    pub fn seat(&self) -> SeatId {
        self.seat
    }

    /// True if the holder still owns the seat.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.authority.is_owner(self.seat)
    }

    /// Check the token against the seat being mutated.
    ///
    /// # Errors
    ///
    /// `SeatMismatch` if the token is for a different seat,
    /// `OwnershipDenied` if ownership has since moved.
    pub fn check(&self, seat: SeatId) -> Result<(), DeckError> {
        if self.seat != seat {
            return Err(DeckError::SeatMismatch {
                seat,
                token_seat: self.seat,
            });
        }
        if !self.is_valid() {
            return Err(DeckError::OwnershipDenied { seat });
        }
        Ok(())
    }
}

/// In-process ownership table shared by every participant.
///
/// Cloning shares the table.
#[derive(Clone, Debug, Default)]
pub struct SharedOwnership {
    owners: Arc<Mutex<FxHashMap<SeatId, ParticipantId>>>,
}

impl SharedOwnership {
    /// Create an empty table. No seat has an owner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<SeatId, ParticipantId>> {
        self.owners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current owner of a seat.
    #[must_use]
    pub fn owner_of(&self, seat: SeatId) -> Option<ParticipantId> {
        self.lock().get(&seat).copied()
    }

    /// Give `seat` to `participant`, replacing any previous owner.
    pub fn assign(&self, seat: SeatId, participant: ParticipantId) {
        let previous = self.lock().insert(seat, participant);
        debug!(%seat, %participant, ?previous, "seat ownership assigned");
    }

    /// Remove the owner of `seat`.
    pub fn release(&self, seat: SeatId) {
        self.lock().remove(&seat);
    }

    /// Authority as seen by one participant.
    #[must_use]
    pub fn view(&self, participant: ParticipantId) -> ParticipantView {
        ParticipantView {
            local: participant,
            table: self.clone(),
        }
    }
}

/// One participant's view of a [`SharedOwnership`] table.
///
/// Ownership requests are granted immediately.
#[derive(Clone, Debug)]
pub struct ParticipantView {
    local: ParticipantId,
    table: SharedOwnership,
}

impl ParticipantView {
    /// The participant this view answers for.
    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        self.local
    }
}

impl OwnershipAuthority for ParticipantView {
    fn is_owner(&self, seat: SeatId) -> bool {
        self.table.owner_of(seat) == Some(self.local)
    }

    fn request_ownership(&self, seat: SeatId) {
        self.table.assign(seat, self.local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_requires_ownership() {
        let table = SharedOwnership::new();
        let alice = table.view(ParticipantId::new(1));
        let seat = SeatId::new(0);

        assert_eq!(
            WriteToken::acquire(&alice, seat).unwrap_err(),
            DeckError::OwnershipDenied { seat }
        );

        table.assign(seat, ParticipantId::new(1));
        let token = WriteToken::acquire(&alice, seat).unwrap();
        assert_eq!(token.seat(), seat);
        assert!(token.is_valid());
    }

    #[test]
    fn test_token_invalidated_by_transfer() {
        let table = SharedOwnership::new();
        let alice = table.view(ParticipantId::new(1));
        let bob = table.view(ParticipantId::new(2));
        let seat = SeatId::new(0);

        alice.request_ownership(seat);
        let token = WriteToken::acquire(&alice, seat).unwrap();
        bob.request_ownership(seat);

        assert!(!token.is_valid());
        assert_eq!(token.check(seat), Err(DeckError::OwnershipDenied { seat }));
        assert!(bob.is_owner(seat));
    }

    #[test]
    fn test_token_checked_against_seat() {
        let table = SharedOwnership::new();
        let alice = table.view(ParticipantId::new(1));
        alice.request_ownership(SeatId::new(0));
        alice.request_ownership(SeatId::new(1));

        let token = WriteToken::acquire(&alice, SeatId::new(0)).unwrap();
        assert_eq!(
            token.check(SeatId::new(1)),
            Err(DeckError::SeatMismatch {
                seat: SeatId::new(1),
                token_seat: SeatId::new(0),
            })
        );
    }

    #[test]
    fn test_release_clears_owner() {
        let table = SharedOwnership::new();
        table.assign(SeatId::new(2), ParticipantId::new(7));
        table.release(SeatId::new(2));
        assert_eq!(table.owner_of(SeatId::new(2)), None);
    }
}
