//! Session configuration.
//!
//! The host configures a session at startup by providing:
//! - `DeckLimits`: Slot capacities and deck-construction rules
//! - `CacheConfig`: Atlas slice cache budget and sweep cadence
//! - `SessionConfig`: Combines everything, plus seat count and shuffle seed
//!
//! Every section deserializes with defaults, so a partial JSON document
//! only needs to name the values it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default main deck slot capacity (and minimum legal main size).
pub const DEFAULT_MAIN_CAPACITY: usize = 60;
/// Default sideboard slot capacity (and maximum legal sideboard size).
pub const DEFAULT_SIDEBOARD_CAPACITY: usize = 15;
/// Default per-id copy limit across main + sideboard.
pub const DEFAULT_COPY_LIMIT: usize = 4;
/// Default number of cached card assets.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
/// Default idle time before a cached asset is swept, in milliseconds.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;
/// Default time between scheduled idle sweeps, in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;
/// Default seats at one table.
pub const DEFAULT_MAX_SEATS: usize = 4;

/// Slot capacities and construction rules for every deck in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckLimits {
    /// Number of main deck slots allocated per seat.
    pub main_capacity: usize,

    /// Number of sideboard slots allocated per seat.
    pub sideboard_capacity: usize,

    /// Minimum occupied main slots for a legal deck.
    pub min_main: usize,

    /// Maximum occupied sideboard slots for a legal deck.
    pub max_sideboard: usize,

    /// Maximum copies of one card id across main + sideboard.
    ///
    /// Basic lands are not exempt.
    pub copy_limit: usize,
}

impl Default for DeckLimits {
    fn default() -> Self {
        Self {
            main_capacity: DEFAULT_MAIN_CAPACITY,
            sideboard_capacity: DEFAULT_SIDEBOARD_CAPACITY,
            min_main: DEFAULT_MAIN_CAPACITY,
            max_sideboard: DEFAULT_SIDEBOARD_CAPACITY,
            copy_limit: DEFAULT_COPY_LIMIT,
        }
    }
}

impl DeckLimits {
    /// Set the main slot capacity.
    #[must_use]
    pub fn with_main_capacity(mut self, capacity: usize) -> Self {
        self.main_capacity = capacity;
        self
    }

    /// Set the sideboard slot capacity.
    #[must_use]
    pub fn with_sideboard_capacity(mut self, capacity: usize) -> Self {
        self.sideboard_capacity = capacity;
        self
    }

    /// Set the minimum legal main deck size.
    #[must_use]
    pub fn with_min_main(mut self, min: usize) -> Self {
        self.min_main = min;
        self
    }

    /// Set the maximum legal sideboard size.
    #[must_use]
    pub fn with_max_sideboard(mut self, max: usize) -> Self {
        self.max_sideboard = max;
        self
    }

    /// Set the per-id copy limit.
    #[must_use]
    pub fn with_copy_limit(mut self, limit: usize) -> Self {
        self.copy_limit = limit;
        self
    }
}

/// Atlas slice cache budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached assets before insertion-order eviction.
    pub capacity: usize,

    /// Milliseconds an asset may go unaccessed before the idle sweep drops it.
    pub idle_timeout_ms: u64,

    /// Milliseconds between scheduled idle sweeps.
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    /// Create a cache config with the given capacity and idle timeout.
    #[must_use]
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            capacity,
            idle_timeout_ms: millis(idle_timeout),
            ..Self::default()
        }
    }

    /// Idle timeout as a `Duration`.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Sweep interval as a `Duration`.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Set the sweep interval.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = millis(interval);
        self
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Complete session configuration.
///
/// ## Example
///
/// ```
/// use rust_ccg_sync::core::SessionConfig;
///
/// let config = SessionConfig::from_json_str(r#"{ "max_seats": 2, "cache": { "capacity": 64 } }"#)
///     .unwrap();
///
/// assert_eq!(config.max_seats, 2);
/// assert_eq!(config.cache.capacity, 64);
/// assert_eq!(config.deck.copy_limit, 4); // default
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of seats at the table.
    pub max_seats: usize,

    /// Deck capacities and construction rules.
    pub deck: DeckLimits,

    /// Atlas slice cache budget.
    pub cache: CacheConfig,

    /// Base seed for per-seat shuffle streams.
    pub shuffle_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_seats: DEFAULT_MAX_SEATS,
            deck: DeckLimits::default(),
            cache: CacheConfig::default(),
            shuffle_seed: 0,
        }
    }
}

impl SessionConfig {
    /// Create a default session configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document, filling unspecified fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` for malformed input, or any error from
    /// [`SessionConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of seats.
    #[must_use]
    pub fn with_max_seats(mut self, seats: usize) -> Self {
        self.max_seats = seats;
        self
    }

    /// Set the deck limits.
    #[must_use]
    pub fn with_deck_limits(mut self, deck: DeckLimits) -> Self {
        self.deck = deck;
        self
    }

    /// Set the cache configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Rejects zero seats, more than 255 seats, zero cache capacity,
    /// zero main capacity, and a `min_main` larger than the main capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_seats == 0 {
            return Err(ConfigError::Zero { field: "max_seats" });
        }
        if self.max_seats > 255 {
            return Err(ConfigError::TooManySeats(self.max_seats));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Zero { field: "cache.capacity" });
        }
        if self.deck.main_capacity == 0 {
            return Err(ConfigError::Zero { field: "deck.main_capacity" });
        }
        if self.deck.min_main > self.deck.main_capacity {
            return Err(ConfigError::Unreachable {
                min_main: self.deck.min_main,
                main_capacity: self.deck.main_capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.max_seats, 4);
        assert_eq!(config.deck.main_capacity, 60);
        assert_eq!(config.deck.sideboard_capacity, 15);
        assert_eq!(config.deck.copy_limit, 4);
        assert_eq!(config.cache.capacity, 1000);
        assert_eq!(config.cache.idle_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .with_max_seats(2)
            .with_shuffle_seed(99)
            .with_deck_limits(DeckLimits::default().with_min_main(40).with_copy_limit(1))
            .with_cache(CacheConfig::new(8, Duration::from_secs(5)));

        assert_eq!(config.max_seats, 2);
        assert_eq!(config.shuffle_seed, 99);
        assert_eq!(config.deck.min_main, 40);
        assert_eq!(config.deck.copy_limit, 1);
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.cache.idle_timeout_ms, 5_000);
    }

    #[test]
    fn test_sub_second_timeouts_survive() {
        let cache = CacheConfig::new(8, Duration::from_millis(500))
            .with_sweep_interval(Duration::from_millis(250));
        assert_eq!(cache.idle_timeout(), Duration::from_millis(500));
        assert_eq!(cache.sweep_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_json() {
        let config =
            SessionConfig::from_json_str(r#"{ "deck": { "min_main": 40 }, "shuffle_seed": 3 }"#)
                .unwrap();
        assert_eq!(config.deck.min_main, 40);
        assert_eq!(config.deck.main_capacity, 60);
        assert_eq!(config.shuffle_seed, 3);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = SessionConfig::from_json_str(r#"{ "cache": { "capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Zero { field: "cache.capacity" }));
    }

    #[test]
    fn test_rejects_unreachable_min_main() {
        let config = SessionConfig::new()
            .with_deck_limits(DeckLimits::default().with_main_capacity(40));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Unreachable { min_main: 60, main_capacity: 40 })
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            SessionConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
