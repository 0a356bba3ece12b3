//! Snapshot wire message.

use serde::{Deserialize, Serialize};

use crate::core::SeatId;
use crate::deck::DeckSnapshot;
use crate::error::ReplicationError;

/// One committed deck state, addressed to a seat.
///
/// `version` increases by one per commit from the owner. Observers apply
/// a message only if its version is newer than the one they hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub seat: SeatId,
    pub version: u64,
    /// bincode-encoded [`DeckSnapshot`].
    pub payload: Vec<u8>,
}

impl SnapshotMessage {
    /// Encode a snapshot.
    ///
    /// # Errors
    ///
    /// `ReplicationError::Encode` if serialization fails.
    pub fn encode(snapshot: &DeckSnapshot, version: u64) -> Result<Self, ReplicationError> {
        let payload = bincode::serialize(snapshot).map_err(ReplicationError::Encode)?;
        Ok(Self {
            seat: snapshot.seat,
            version,
            payload,
        })
    }

    /// Decode the payload.
    ///
    /// # Errors
    ///
    /// `ReplicationError::Decode` if the payload is corrupt or truncated.
    pub fn decode(&self) -> Result<DeckSnapshot, ReplicationError> {
        bincode::deserialize(&self.payload).map_err(ReplicationError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeckLimits, ShuffleRng};
    use crate::deck::DeckStore;

    #[test]
    fn test_encode_decode() {
        let store = DeckStore::new(SeatId::new(2), &DeckLimits::default(), ShuffleRng::new(0));
        let message = SnapshotMessage::encode(&store.snapshot(), 3).unwrap();
        assert_eq!(message.seat, SeatId::new(2));
        assert_eq!(message.version, 3);
        assert_eq!(message.decode().unwrap(), store.snapshot());
    }

    #[test]
    fn test_truncated_payload_fails() {
        let store = DeckStore::new(SeatId::new(0), &DeckLimits::default(), ShuffleRng::new(0));
        let mut message = SnapshotMessage::encode(&store.snapshot(), 1).unwrap();
        message.payload.truncate(message.payload.len() / 2);
        assert!(matches!(message.decode(), Err(ReplicationError::Decode(_))));
    }
}
