//! Frame differencing for dirty-rectangle updates.
//!
//! A comparator walks the previous and the next framebuffer, reports the
//! rectangles whose pixels changed, and copies the changed pixels into the
//! previous frame so it matches the next one afterwards. The padding byte of
//! each pixel never counts as a change.
//!
//! # Example
//!
//! ```no_run
//! use framejpeg::compare::{Comparator, FramePair, QuadtreeComparator};
//! use framejpeg::tight::TightJpegEncoder;
//! use framejpeg::PixelLayout;
//!
//! # fn main() -> Result<(), framejpeg::Error> {
//! let (width, height) = (640u32, 480u32);
//! let mut shown = vec![0u32; (width * height) as usize];
//! let next = vec![0x0080_4020u32; (width * height) as usize];
//!
//! let mut encoder = TightJpegEncoder::new()?;
//! let mut rects = Vec::new();
//! let mut frames = FramePair::new(&mut shown, &next, width as usize, width, height, PixelLayout::Bgrx)?;
//! QuadtreeComparator.compare(&mut frames, |rect| rects.push(rect));
//!
//! let mut out = Vec::new();
//! for rect in rects {
//!     encoder.encode_region(&mut out, &next, width as usize, rect)?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::encode::required_pixels;
use crate::error::{Error, Result};
use crate::types::PixelLayout;

// ============================================================================
// Rectangles
// ============================================================================

/// A pixel rectangle, `x0..x1` by `y0..y1` (end-exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left column
    pub x0: usize,
    /// Top row
    pub y0: usize,
    /// One past the right column
    pub x1: usize,
    /// One past the bottom row
    pub y1: usize,
}

impl Rect {
    /// Rectangle from its corners.
    pub const fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width in pixels.
    pub const fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in pixels.
    pub const fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    /// Number of pixels covered.
    pub const fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Smallest rectangle covering both.
    pub fn union(self, other: Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether pixel `(x, y)` lies inside.
    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Index of the top-left pixel in a frame with rows `stride` pixels apart.
    pub fn offset(&self, stride: usize) -> Option<usize> {
        self.y0.checked_mul(stride)?.checked_add(self.x0)
    }
}

fn merge(acc: Option<Rect>, rect: Rect) -> Option<Rect> {
    Some(match acc {
        Some(a) => a.union(rect),
        None => rect,
    })
}

// ============================================================================
// Frame Pair
// ============================================================================

/// The frame last sent and the frame to send next, with shared geometry.
///
/// Both buffers hold native-endian `u32` pixels with rows `stride` pixels
/// apart, as [`crate::Compressor::compress`] reads them.
#[derive(Debug)]
pub struct FramePair<'a> {
    prev: &'a mut [u32],
    next: &'a [u32],
    stride: usize,
    width: usize,
    height: usize,
    mask: u32,
}

impl<'a> FramePair<'a> {
    /// Pair two frames of `width` x `height` pixels.
    ///
    /// # Errors
    /// The geometry errors of [`crate::ImageView::from_u32`], checked for
    /// both buffers.
    pub fn new(
        prev: &'a mut [u32],
        next: &'a [u32],
        stride: usize,
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<Self> {
        let expected = required_pixels(stride, width, height)?;
        for actual in [prev.len(), next.len()] {
            if actual < expected {
                return Err(Error::BufferSizeMismatch { expected, actual });
            }
        }
        Ok(Self {
            prev,
            next,
            stride,
            width: width as usize,
            height: height as usize,
            mask: layout.color_mask(),
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether any pixel of row `y` in `x0..x1` changed.
    fn row_changed(&self, y: usize, x0: usize, x1: usize) -> bool {
        let start = y * self.stride;
        let mask = self.mask;
        self.prev[start + x0..start + x1]
            .iter()
            .zip(&self.next[start + x0..start + x1])
            .any(|(&p, &q)| (p ^ q) & mask != 0)
    }

    /// Copy the changed pixels of row `y` in `x0..x1` into the previous
    /// frame. Returns the span they occupied, if any.
    fn sync_row(&mut self, y: usize, x0: usize, x1: usize) -> Option<(usize, usize)> {
        let start = y * self.stride;
        let mask = self.mask;
        let prev = &mut self.prev[start + x0..start + x1];
        let next = &self.next[start + x0..start + x1];

        let mut span: Option<(usize, usize)> = None;
        for (i, (p, &q)) in prev.iter_mut().zip(next).enumerate() {
            if (*p ^ q) & mask != 0 {
                *p = q;
                let x = x0 + i;
                span = Some(match span {
                    Some((lo, _)) => (lo, x + 1),
                    None => (x, x + 1),
                });
            }
        }
        span
    }

    /// Synchronize every row of `region`, returning the bounds of what
    /// changed.
    fn sync_region(&mut self, region: Rect) -> Option<Rect> {
        let mut dirty = None;
        for y in region.y0..region.y1 {
            if let Some((x0, x1)) = self.sync_row(y, region.x0, region.x1) {
                dirty = merge(dirty, Rect::new(x0, y, x1, y + 1));
            }
        }
        dirty
    }
}

// ============================================================================
// Comparators
// ============================================================================

/// Strategy for splitting a frame update into rectangles.
pub trait Comparator {
    /// Report every changed region of `frames` to `on_rect`, leaving the
    /// previous frame equal to the next one in its color bytes.
    ///
    /// Every changed pixel lies inside at least one reported rectangle.
    fn compare<F: FnMut(Rect)>(&self, frames: &mut FramePair<'_>, on_rect: F);
}

/// Fixed 64x64 tiles, each reported as the bounds of its changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockComparator;

impl BlockComparator {
    const TILE_WIDTH: usize = 64;
    const TILE_HEIGHT: usize = 64;
}

impl Comparator for BlockComparator {
    fn compare<F: FnMut(Rect)>(&self, frames: &mut FramePair<'_>, mut on_rect: F) {
        let (width, height) = (frames.width, frames.height);
        for y0 in (0..height).step_by(Self::TILE_HEIGHT) {
            let y1 = (y0 + Self::TILE_HEIGHT).min(height);
            for x0 in (0..width).step_by(Self::TILE_WIDTH) {
                let x1 = (x0 + Self::TILE_WIDTH).min(width);
                if let Some(rect) = frames.sync_region(Rect::new(x0, y0, x1, y1)) {
                    on_rect(rect);
                }
            }
        }
    }
}

/// 64-pixel columns, grown downward while changes keep appearing.
///
/// A run ends after eight unchanged rows or at 128 rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripComparator;

impl StripComparator {
    const STRIP_WIDTH: usize = 64;
    const MAX_RUN_ROWS: usize = 128;
    const MAX_QUIET_ROWS: usize = 8;
}

impl Comparator for StripComparator {
    fn compare<F: FnMut(Rect)>(&self, frames: &mut FramePair<'_>, mut on_rect: F) {
        let (width, height) = (frames.width, frames.height);
        for x_start in (0..width).step_by(Self::STRIP_WIDTH) {
            let x_end = (x_start + Self::STRIP_WIDTH).min(width);
            let mut y = 0;
            while y < height {
                while y < height && !frames.row_changed(y, x_start, x_end) {
                    y += 1;
                }
                let y0 = y;
                let limit = (y0 + Self::MAX_RUN_ROWS).min(height);

                let mut span: Option<(usize, usize)> = None;
                let mut quiet = 0;
                while y < limit {
                    match frames.sync_row(y, x_start, x_end) {
                        Some((x0, x1)) => {
                            span = Some(match span {
                                Some((lo, hi)) => (lo.min(x0), hi.max(x1)),
                                None => (x0, x1),
                            });
                            quiet = 0;
                        }
                        None => {
                            if quiet >= Self::MAX_QUIET_ROWS {
                                break;
                            }
                            quiet += 1;
                        }
                    }
                    y += 1;
                }

                if let Some((x0, x1)) = span {
                    on_rect(Rect::new(x0, y0, x1, y - quiet));
                }
            }
        }
    }
}

/// Recursive halving down to 1024-pixel leaves, merging sibling results
/// when the merged rectangle wastes little area.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadtreeComparator;

impl QuadtreeComparator {
    const LEAF_PIXELS: usize = 1024;
    const SPLIT_ALIGN: usize = 8;
    /// Upper bounds for a merged rectangle
    const MAX_MERGED_WIDTH: usize = 2048;
    const MAX_MERGED_AREA: usize = (2 << 22) / 3;

    fn compare_region<F: FnMut(Rect)>(
        frames: &mut FramePair<'_>,
        region: Rect,
        on_rect: &mut F,
    ) -> Option<Rect> {
        if region.area() <= Self::LEAF_PIXELS {
            return frames.sync_region(region);
        }

        let (first, second) = if region.height() <= region.width() {
            let mid = Self::split_point(region.x0, region.x1);
            (
                Rect::new(region.x0, region.y0, mid, region.y1),
                Rect::new(mid, region.y0, region.x1, region.y1),
            )
        } else {
            let mid = Self::split_point(region.y0, region.y1);
            (
                Rect::new(region.x0, region.y0, region.x1, mid),
                Rect::new(region.x0, mid, region.x1, region.y1),
            )
        };

        let a = Self::compare_region(frames, first, on_rect);
        let b = Self::compare_region(frames, second, on_rect);
        match (a, b) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => {
                let merged = a.union(b);
                let parts = a.area() + b.area();
                let within_limits = merged.width() <= Self::MAX_MERGED_WIDTH
                    && merged.area() <= Self::MAX_MERGED_AREA;
                let cheap = merged.area() <= parts + Self::LEAF_PIXELS
                    || 15 * merged.area() <= 16 * parts;
                if within_limits && cheap {
                    Some(merged)
                } else if a.area() < b.area() {
                    on_rect(a);
                    Some(b)
                } else {
                    on_rect(b);
                    Some(a)
                }
            }
        }
    }

    /// Midpoint of `lo..hi` rounded to a multiple of the split alignment.
    fn split_point(lo: usize, hi: usize) -> usize {
        (lo + hi + Self::SPLIT_ALIGN) / (2 * Self::SPLIT_ALIGN) * Self::SPLIT_ALIGN
    }
}

impl Comparator for QuadtreeComparator {
    fn compare<F: FnMut(Rect)>(&self, frames: &mut FramePair<'_>, mut on_rect: F) {
        let whole = Rect::new(0, 0, frames.width, frames.height);
        if let Some(rect) = Self::compare_region(frames, whole, &mut on_rect) {
            on_rect(rect);
        }
    }
}
