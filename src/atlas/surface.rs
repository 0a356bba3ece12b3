//! Atlas surfaces and cropped card images.
//!
//! The host owns the real image surfaces (GPU textures, decoded files).
//! The cache only needs to know their size and ask for a region copy, so
//! surfaces sit behind the [`AtlasSurface`] trait. [`RgbaSurface`] is an
//! in-memory implementation for headless hosts and tests.

use std::sync::Arc;

use super::slice::UvRect;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Integer pixel region on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// Map a normalized rectangle onto a `width` × `height` surface.
    ///
    /// The region is clamped to the surface. Returns `None` if nothing of
    /// it remains.
    #[must_use]
    pub fn from_uv(rect: &UvRect, width: u32, height: u32) -> Option<Self> {
        let to_px = |v: f32, extent: u32| -> u32 {
            let px = (f64::from(v) * f64::from(extent)).round();
            px.clamp(0.0, f64::from(extent)) as u32
        };

        let x0 = to_px(rect.x, width);
        let y0 = to_px(rect.y, height);
        let x1 = to_px(rect.x + rect.width, width);
        let y1 = to_px(rect.y + rect.height, height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Cropped RGBA8 card artwork.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CardImage {
    /// Size of the pixel buffer in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// RGBA value at (`x`, `y`).
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(at..at + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Addressable 2D image surface holding packed card artwork.
pub trait AtlasSurface: Send + Sync + std::fmt::Debug {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Copy a region out of the surface.
    ///
    /// Returns `None` if the region is not fully inside the surface.
    fn crop(&self, region: PixelRegion) -> Option<CardImage>;
}

/// In-memory RGBA8 surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaSurface {
    /// Wrap a packed RGBA8 buffer. Returns `None` if the length is wrong.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Surface where every pixel is computed from its coordinates.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Single-color surface.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_fn(width, height, |_, _| rgba)
    }
}

impl AtlasSurface for RgbaSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn crop(&self, region: PixelRegion) -> Option<CardImage> {
        if region.x.checked_add(region.width)? > self.width
            || region.y.checked_add(region.height)? > self.height
        {
            return None;
        }

        let stride = self.width as usize * BYTES_PER_PIXEL;
        let row_len = region.width as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(row_len * region.height as usize);
        for row in region.y..region.y + region.height {
            let start = row as usize * stride + region.x as usize * BYTES_PER_PIXEL;
            pixels.extend_from_slice(&self.pixels[start..start + row_len]);
        }

        Some(CardImage {
            width: region.width,
            height: region.height,
            pixels,
        })
    }
}

/// Atlas surfaces addressed by index.
#[derive(Clone, Debug, Default)]
pub struct AtlasSet {
    surfaces: Vec<Arc<dyn AtlasSurface>>,
}

impl AtlasSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface; returns its index.
    pub fn push(&mut self, surface: Arc<dyn AtlasSurface>) -> u32 {
        self.surfaces.push(surface);
        (self.surfaces.len() - 1) as u32
    }

    /// Add a surface (builder pattern).
    #[must_use]
    pub fn with_surface(mut self, surface: impl AtlasSurface + 'static) -> Self {
        self.push(Arc::new(surface));
        self
    }

    /// Surface at `index`.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Arc<dyn AtlasSurface>> {
        self.surfaces.get(index as usize)
    }

    /// Number of surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadrants() -> RgbaSurface {
        RgbaSurface::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
            (true, true) => [255, 0, 0, 255],
            (false, true) => [0, 255, 0, 255],
            (true, false) => [0, 0, 255, 255],
            (false, false) => [255, 255, 255, 255],
        })
    }

    #[test]
    fn test_region_from_uv() {
        let rect = UvRect::new(0.5, 0.0, 0.5, 0.5).unwrap();
        assert_eq!(
            PixelRegion::from_uv(&rect, 4, 4),
            Some(PixelRegion { x: 2, y: 0, width: 2, height: 2 })
        );

        let empty = UvRect::new(0.5, 0.5, 0.0, 0.2).unwrap();
        assert_eq!(PixelRegion::from_uv(&empty, 4, 4), None);

        let overhang = UvRect::new(0.75, 0.75, 0.5, 0.5).unwrap();
        assert_eq!(
            PixelRegion::from_uv(&overhang, 4, 4),
            Some(PixelRegion { x: 3, y: 3, width: 1, height: 1 })
        );
    }

    #[test]
    fn test_crop_copies_region() {
        let surface = quadrants();
        let image = surface
            .crop(PixelRegion { x: 2, y: 0, width: 2, height: 2 })
            .unwrap();

        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.byte_len(), 16);
        assert_eq!(image.pixel(0, 0), Some([0, 255, 0, 255]));
        assert_eq!(image.pixel(1, 1), Some([0, 255, 0, 255]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let surface = quadrants();
        assert!(surface.crop(PixelRegion { x: 3, y: 0, width: 2, height: 1 }).is_none());
    }

    #[test]
    fn test_surface_buffer_length_checked() {
        assert!(RgbaSurface::new(2, 2, vec![0; 16]).is_some());
        assert!(RgbaSurface::new(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_atlas_set_indexing() {
        let set = AtlasSet::new()
            .with_surface(RgbaSurface::filled(2, 2, [0, 0, 0, 255]))
            .with_surface(quadrants());
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().width(), 4);
        assert!(set.get(2).is_none());
    }
}
