//! Seat and participant identification.
//!
//! ## SeatId
//!
//! A seat is one participant's deck/play slot at the table. Seats are
//! 0-based and bounded by the session's `max_seats`.
//!
//! ## ParticipantId
//!
//! Identifies a connected participant. Ownership of a seat's replicated
//! deck belongs to exactly one participant at a time.

use serde::{Deserialize, Serialize};

/// Seat identifier supporting up to 255 seats.
///
/// Seat indices are 0-based: the first seat is `SeatId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(pub u8);

impl SeatId {
    /// Create a new seat ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all seat IDs for a table with `seat_count` seats.
    ///
    /// ```
    /// use rust_ccg_sync::core::SeatId;
    ///
    /// let seats: Vec<_> = SeatId::all(4).collect();
    /// assert_eq!(seats.len(), 4);
    /// assert_eq!(seats[3], SeatId::new(3));
    /// ```
    pub fn all(seat_count: usize) -> impl Iterator<Item = SeatId> {
        (0..seat_count.min(255) as u8).map(SeatId)
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Connected participant identifier, assigned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// Create a new participant ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Participant({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_id() {
        let seat = SeatId::new(2);
        assert_eq!(seat.index(), 2);
        assert_eq!(format!("{}", seat), "Seat 2");
    }

    #[test]
    fn test_all_seats() {
        let seats: Vec<_> = SeatId::all(3).collect();
        assert_eq!(seats, vec![SeatId(0), SeatId(1), SeatId(2)]);
        assert_eq!(SeatId::all(0).count(), 0);
    }

    #[test]
    fn test_participant_display() {
        assert_eq!(format!("{}", ParticipantId::new(7)), "Participant(7)");
    }
}
