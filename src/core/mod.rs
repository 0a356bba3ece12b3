//! Core session types: seats, RNG, clocks, configuration.
//!
//! These building blocks carry no card or deck semantics. Every other
//! module receives them from the session rather than reaching for
//! process-wide state.

pub mod seat;
pub mod rng;
pub mod clock;
pub mod config;

pub use seat::{SeatId, ParticipantId};
pub use rng::{ShuffleRng, ShuffleRngState};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{CacheConfig, DeckLimits, SessionConfig};
