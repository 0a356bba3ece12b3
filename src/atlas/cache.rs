//! Atlas slice cache: card id → cropped artwork, under a fixed budget.
//!
//! ## Two eviction tiers
//!
//! - **Capacity**: when full, the oldest *insertion* is evicted (FIFO).
//!   Accessing an entry does not protect it.
//! - **Idle sweep**: [`AtlasSliceCache::sweep_idle`] drops every entry not
//!   accessed within the idle timeout, whether or not the cache is full.
//!
//! Insertion order and access time are tracked separately; access time is
//! only consulted by the sweep.
//!
//! All state sits behind one mutex, so `resolve`, `update_mapping`,
//! insertion, and eviction are serialized.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::debug;

use super::slice::{MappingAudit, UvRect, UvSlice, UvTable};
use super::surface::{AtlasSet, CardImage, PixelRegion};
use crate::cards::CardId;
use crate::core::{CacheConfig, Clock};
use crate::error::AtlasError;

/// Why a card has no artwork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unresolved {
    /// No UV slice for the card.
    NoMapping,
    /// The slice names an atlas index that does not exist.
    MissingAtlas(u32),
    /// The slice covers no pixels of its atlas.
    EmptyRegion,
}

/// Outcome of [`AtlasSliceCache::resolve`].
#[derive(Clone, Debug)]
pub enum Resolution {
    /// Artwork is available.
    Ready {
        image: Arc<CardImage>,
        /// True if served from the cache without cropping.
        hit: bool,
    },
    /// Presentation should fall back to a placeholder.
    Unresolved(Unresolved),
}

impl Resolution {
    /// The image, if resolved.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<CardImage>> {
        match self {
            Resolution::Ready { image, .. } => Some(image),
            Resolution::Unresolved(_) => None,
        }
    }

    /// True if the lookup was served from the cache.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Resolution::Ready { hit: true, .. })
    }
}

/// A cropped asset owned by the cache.
///
/// Once evicted or swept, the cache no longer hands this image out; a
/// holder that needs the card again must resolve it again.
#[derive(Clone, Debug)]
struct CachedAsset {
    card_id: CardId,
    image: Arc<CardImage>,
    last_access: Instant,
    seq: u64,
}

/// Counters since construction or the last [`AtlasSliceCache::clear`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub unresolved: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub swept: u64,
}

#[derive(Debug)]
struct CacheInner {
    capacity: usize,
    idle_timeout: Duration,
    table: UvTable,
    entries: FxHashMap<CardId, CachedAsset>,
    /// Insertion order as (id, seq); stale pairs are skipped on eviction.
    order: VecDeque<(CardId, u64)>,
    next_seq: u64,
    stats: CacheStats,
}

impl CacheInner {
    fn evict_to(&mut self, limit: usize) {
        while self.entries.len() > limit {
            let Some((id, seq)) = self.order.pop_front() else {
                break;
            };
            if self.entries.get(&id).is_some_and(|e| e.seq == seq) {
                self.entries.remove(&id);
                self.stats.evictions += 1;
                debug!(card = %id, "evicted oldest cached asset");
            }
        }
    }

    fn insert(&mut self, asset: CachedAsset) {
        self.evict_to(self.capacity.saturating_sub(1));
        self.order.push_back((asset.card_id.clone(), asset.seq));
        self.entries.insert(asset.card_id.clone(), asset);
        self.stats.insertions += 1;
    }

    fn prune_order(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(id, seq)| entries.get(id).is_some_and(|e| e.seq == *seq));
    }
}

/// Bounded cache of cropped card artwork.
#[derive(Debug)]
pub struct AtlasSliceCache {
    inner: Mutex<CacheInner>,
    atlases: AtlasSet,
    clock: Arc<dyn Clock>,
}

impl AtlasSliceCache {
    /// Create a cache over a UV table and its atlas surfaces.
    #[must_use]
    pub fn new(config: &CacheConfig, table: UvTable, atlases: AtlasSet, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity: config.capacity.max(1),
                idle_timeout: config.idle_timeout(),
                table,
                entries: FxHashMap::default(),
                order: VecDeque::new(),
                next_seq: 0,
                stats: CacheStats::default(),
            }),
            atlases,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the budget. A capacity of 0 is treated as 1.
    ///
    /// Shrinking below the current size evicts oldest insertions at once.
    pub fn configure(&self, capacity: usize, idle_timeout: Duration) {
        let mut inner = self.lock();
        inner.capacity = capacity.max(1);
        inner.idle_timeout = idle_timeout;
        let limit = inner.capacity;
        inner.evict_to(limit);
    }

    /// Resolve a card's artwork.
    ///
    /// On a hit the access time is refreshed. On a miss the slice is
    /// cropped from its atlas and inserted, evicting the oldest insertion
    /// when full. A card without a usable slice yields
    /// [`Resolution::Unresolved`]; this never fails.
    pub fn resolve(&self, card_id: &CardId) -> Resolution {
        let now = self.clock.now();
        let mut inner = self.lock();

        if let Some(entry) = inner.entries.get_mut(card_id) {
            entry.last_access = now;
            let image = Arc::clone(&entry.image);
            inner.stats.hits += 1;
            return Resolution::Ready { image, hit: true };
        }

        let Some(slice) = inner.table.get(card_id).cloned() else {
            inner.stats.unresolved += 1;
            return Resolution::Unresolved(Unresolved::NoMapping);
        };
        let image = match self.crop(&slice) {
            Ok(image) => Arc::new(image),
            Err(reason) => {
                inner.stats.unresolved += 1;
                return Resolution::Unresolved(reason);
            }
        };

        inner.stats.misses += 1;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.insert(CachedAsset {
            card_id: card_id.clone(),
            image: Arc::clone(&image),
            last_access: now,
            seq,
        });

        Resolution::Ready { image, hit: false }
    }

    fn crop(&self, slice: &UvSlice) -> Result<CardImage, Unresolved> {
        let surface = self
            .atlases
            .get(slice.atlas_index)
            .ok_or(Unresolved::MissingAtlas(slice.atlas_index))?;
        let region = PixelRegion::from_uv(&slice.rect, surface.width(), surface.height())
            .ok_or(Unresolved::EmptyRegion)?;
        surface.crop(region).ok_or(Unresolved::EmptyRegion)
    }

    /// Drop every entry idle for longer than the timeout. Returns the count.
    pub fn sweep_idle(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let timeout = inner.idle_timeout;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, e| now.saturating_duration_since(e.last_access) <= timeout);
        let swept = before - inner.entries.len();
        if swept > 0 {
            inner.prune_order();
            inner.stats.swept += swept as u64;
            debug!(swept, remaining = inner.entries.len(), "idle sweep");
        }
        swept
    }

    /// Insert or correct a card's slice.
    ///
    /// Any cached crop of the old slice is dropped so the next resolve
    /// uses the new one.
    ///
    /// # Errors
    ///
    /// Rejects rectangles outside `[0, 1]`; nothing changes.
    pub fn update_mapping(
        &self,
        card_id: &CardId,
        atlas_index: u32,
        rect: UvRect,
    ) -> Result<(), AtlasError> {
        let mut inner = self.lock();
        inner.table.upsert(card_id.clone(), atlas_index, rect)?;
        if inner.entries.remove(card_id).is_some() {
            inner.prune_order();
        }
        Ok(())
    }

    /// Current slice for a card.
    #[must_use]
    pub fn slice(&self, card_id: &CardId) -> Option<UvSlice> {
        self.lock().table.get(card_id).cloned()
    }

    /// Audit the slice table.
    #[must_use]
    pub fn audit(&self) -> MappingAudit {
        self.lock().table.audit()
    }

    /// True if an asset for the card is currently cached.
    #[must_use]
    pub fn contains(&self, card_id: &CardId) -> bool {
        self.lock().entries.contains_key(card_id)
    }

    /// Cached card ids, oldest insertion first.
    #[must_use]
    pub fn insertion_order(&self) -> Vec<CardId> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter(|(id, seq)| inner.entries.get(id).is_some_and(|e| e.seq == *seq))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of cached assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Current capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Current idle timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.lock().idle_timeout
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Drop every cached asset and reset counters. Slices are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.stats = CacheStats::default();
    }
}
