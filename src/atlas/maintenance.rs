//! Scheduled idle sweeping for the atlas cache.

use std::time::{Duration, Instant};

use super::cache::AtlasSliceCache;

/// Runs [`AtlasSliceCache::sweep_idle`] at a fixed interval.
///
/// The host calls [`MaintenanceSchedule::tick`] from its frame or timer
/// loop; the sweep only happens once the interval has elapsed.
#[derive(Clone, Debug)]
pub struct MaintenanceSchedule {
    interval: Duration,
    last_run: Option<Instant>,
}

impl MaintenanceSchedule {
    /// Create a schedule. The first tick always runs.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// True if a sweep is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_run
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Sweep if due. Returns the number of entries swept, or `None` if
    /// the sweep was not due.
    pub fn tick(&mut self, cache: &AtlasSliceCache, now: Instant) -> Option<usize> {
        if !self.is_due(now) {
            return None;
        }
        self.last_run = Some(now);
        Some(cache.sweep_idle(now))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::atlas::{AtlasSet, UvTable};
    use crate::core::{CacheConfig, Clock, ManualClock};

    #[test]
    fn test_tick_respects_interval() {
        let clock = Arc::new(ManualClock::new());
        let cache = AtlasSliceCache::new(
            &CacheConfig::default(),
            UvTable::new(),
            AtlasSet::new(),
            clock.clone(),
        );
        let mut schedule = MaintenanceSchedule::new(Duration::from_secs(60));

        assert_eq!(schedule.tick(&cache, clock.now()), Some(0));
        clock.advance(Duration::from_secs(30));
        assert_eq!(schedule.tick(&cache, clock.now()), None);
        clock.advance(Duration::from_secs(30));
        assert!(schedule.is_due(clock.now()));
        assert_eq!(schedule.tick(&cache, clock.now()), Some(0));
    }
}
