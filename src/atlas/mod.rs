//! Card artwork: UV slices on shared atlases and the bounded crop cache.
//!
//! ## Key Types
//!
//! - `UvTable`: Card id → atlas index and normalized rectangle
//! - `AtlasSurface`: Host image surface the cache crops from
//! - `AtlasSliceCache`: FIFO-capacity, idle-swept cache of cropped images
//! - `MaintenanceSchedule`: Periodic idle sweep driver

pub mod slice;
pub mod surface;
pub mod cache;
pub mod maintenance;

pub use slice::{MappingAudit, UvRect, UvSlice, UvTable, UV_MATCH_TOLERANCE};
pub use surface::{AtlasSet, AtlasSurface, CardImage, PixelRegion, RgbaSurface};
pub use cache::{AtlasSliceCache, CacheStats, Resolution, Unresolved};
pub use maintenance::MaintenanceSchedule;
