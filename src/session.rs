//! Session context: the per-table owner of the catalog, the atlas cache,
//! and every seat's replicator.
//!
//! There is no global state. A host creates one [`Session`] per table and
//! hands out references (or the `Arc`s it holds) to whatever needs them.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_ccg_sync::atlas::{AtlasSet, UvTable};
//! use rust_ccg_sync::cards::RawCardRecord;
//! use rust_ccg_sync::core::{ManualClock, SeatId, SessionConfig};
//! use rust_ccg_sync::session::Session;
//!
//! let records = vec![RawCardRecord {
//!     id: "bolt".into(),
//!     name: "Lightning Bolt".into(),
//!     ..Default::default()
//! }];
//! let (mut session, report) = Session::start(
//!     SessionConfig::default(),
//!     records,
//!     UvTable::new(),
//!     AtlasSet::new(),
//!     Arc::new(ManualClock::new()),
//! )
//! .unwrap();
//!
//! assert_eq!(report.loaded, 1);
//! session.assign_seat(SeatId::new(0)).unwrap();
//! assert_eq!(session.seats().count(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::atlas::{AtlasSet, AtlasSliceCache, MaintenanceSchedule, Resolution, UvTable};
use crate::cards::{CardId, CardRecord, CatalogIndex, LoadReport, RawCardRecord};
use crate::core::{Clock, SeatId, SessionConfig, ShuffleRng};
use crate::error::SessionError;
use crate::replication::DeckReplicator;

/// A card's display data: catalog record plus artwork.
#[derive(Clone, Debug)]
pub struct CardView<'a> {
    pub record: &'a CardRecord,
    pub art: Resolution,
}

/// Everything one table shares.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    catalog: Arc<CatalogIndex>,
    atlas: Arc<AtlasSliceCache>,
    clock: Arc<dyn Clock>,
    rng: ShuffleRng,
    seats: BTreeMap<SeatId, DeckReplicator>,
    schedule: MaintenanceSchedule,
}

impl Session {
    /// Load the catalog and build a session.
    ///
    /// # Errors
    ///
    /// An invalid configuration, or a catalog with no usable record.
    pub fn start(
        config: SessionConfig,
        records: impl IntoIterator<Item = RawCardRecord>,
        uv_table: UvTable,
        atlases: AtlasSet,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, LoadReport), SessionError> {
        config.validate()?;
        let (catalog, report) = CatalogIndex::load(records)?;
        let session = Self::with_catalog(config, Arc::new(catalog), uv_table, atlases, clock)?;
        Ok((session, report))
    }

    /// Build a session around an already loaded catalog.
    ///
    /// # Errors
    ///
    /// An invalid configuration.
    pub fn with_catalog(
        config: SessionConfig,
        catalog: Arc<CatalogIndex>,
        uv_table: UvTable,
        atlases: AtlasSet,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let atlas = Arc::new(AtlasSliceCache::new(
            &config.cache,
            uv_table,
            atlases,
            Arc::clone(&clock),
        ));
        info!(
            cards = catalog.len(),
            max_seats = config.max_seats,
            cache_capacity = config.cache.capacity,
            "session started"
        );
        Ok(Self {
            rng: ShuffleRng::new(config.shuffle_seed),
            schedule: MaintenanceSchedule::new(config.cache.sweep_interval()),
            config,
            catalog,
            atlas,
            clock,
            seats: BTreeMap::new(),
        })
    }

    /// Create a replicator for `seat`.
    ///
    /// Each seat shuffles from its own stream derived from the session
    /// seed, so the same seed and seat always shuffle the same way.
    ///
    /// # Errors
    ///
    /// `SeatOutOfRange` past `max_seats`, `SeatTaken` if already assigned.
    pub fn assign_seat(&mut self, seat: SeatId) -> Result<&mut DeckReplicator, SessionError> {
        if seat.index() >= self.config.max_seats {
            return Err(SessionError::SeatOutOfRange {
                seat,
                max_seats: self.config.max_seats,
            });
        }
        if self.seats.contains_key(&seat) {
            return Err(SessionError::SeatTaken(seat));
        }

        let replicator = DeckReplicator::new(seat, self.config.deck.clone(), self.rng.for_seat(seat))
            .with_catalog(Arc::clone(&self.catalog));
        info!(%seat, "seat assigned");
        Ok(self.seats.entry(seat).or_insert(replicator))
    }

    /// Reset and remove a seat's replicator.
    ///
    /// # Errors
    ///
    /// `SeatNotAssigned` if the seat has no replicator.
    pub fn release_seat(&mut self, seat: SeatId) -> Result<(), SessionError> {
        let mut replicator = self
            .seats
            .remove(&seat)
            .ok_or(SessionError::SeatNotAssigned(seat))?;
        replicator.release();
        info!(%seat, "seat released");
        Ok(())
    }

    /// Replicator for an assigned seat.
    #[must_use]
    pub fn replicator(&self, seat: SeatId) -> Option<&DeckReplicator> {
        self.seats.get(&seat)
    }

    /// Mutable replicator for an assigned seat.
    pub fn replicator_mut(&mut self, seat: SeatId) -> Option<&mut DeckReplicator> {
        self.seats.get_mut(&seat)
    }

    /// Assigned seats in order.
    pub fn seats(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.seats.keys().copied()
    }

    /// Catalog record and artwork for a card. `None` if not in the catalog.
    #[must_use]
    pub fn card_view(&self, id: &CardId) -> Option<CardView<'_>> {
        let record = self.catalog.by_id(id)?;
        Some(CardView {
            record,
            art: self.atlas.resolve(id),
        })
    }

    /// Periodic maintenance. Returns the number of swept cache entries if
    /// a sweep was due.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        self.schedule.tick(&self.atlas, now)
    }

    /// [`Session::tick`] at the session clock's current time.
    pub fn tick_now(&mut self) -> Option<usize> {
        let now = self.clock.now();
        self.tick(now)
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogIndex> {
        &self.catalog
    }

    /// Shared atlas cache.
    #[must_use]
    pub fn atlas(&self) -> &Arc<AtlasSliceCache> {
        &self.atlas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    fn session(max_seats: usize) -> Session {
        let catalog = CatalogIndex::from_records([CardRecord::new("a", "Alpha", "Creature", "{1}")]);
        Session::with_catalog(
            SessionConfig::default().with_max_seats(max_seats),
            Arc::new(catalog),
            UvTable::new(),
            AtlasSet::new(),
            Arc::new(ManualClock::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_seat_bounds() {
        let mut session = session(2);
        session.assign_seat(SeatId::new(1)).unwrap();
        assert!(matches!(
            session.assign_seat(SeatId::new(2)),
            Err(SessionError::SeatOutOfRange { max_seats: 2, .. })
        ));
        assert!(matches!(
            session.assign_seat(SeatId::new(1)),
            Err(SessionError::SeatTaken(_))
        ));
    }

    #[test]
    fn test_release_then_reassign() {
        let mut session = session(4);
        session.assign_seat(SeatId::new(0)).unwrap();
        session.release_seat(SeatId::new(0)).unwrap();
        assert!(session.replicator(SeatId::new(0)).is_none());
        assert!(matches!(
            session.release_seat(SeatId::new(0)),
            Err(SessionError::SeatNotAssigned(_))
        ));
        assert_eq!(session.assign_seat(SeatId::new(0)).unwrap().version(), 0);
    }

    #[test]
    fn test_card_view_without_art() {
        let session = session(1);
        let view = session.card_view(&CardId::new("a")).unwrap();
        assert_eq!(view.record.name, "Alpha");
        assert!(view.art.image().is_none());
        assert!(session.card_view(&CardId::new("zzz")).is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Session::with_catalog(
            SessionConfig::default().with_max_seats(0),
            Arc::new(CatalogIndex::default()),
            UvTable::new(),
            AtlasSet::new(),
            Arc::new(ManualClock::new()),
        );
        assert!(matches!(result, Err(SessionError::Config(_))));
    }
}
