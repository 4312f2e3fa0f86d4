pub mod masker;
pub mod overlay;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RedactError;

/// Gaussian radius (px at the default render scale of 2.0) used when no
/// radius is configured.
pub const DEFAULT_BLUR_RADIUS: u32 = 30;

/// Smallest blur radius the committer accepts unless told otherwise.
/// Weaker blurs leave page content legible.
pub const DEFAULT_MIN_BLUR_RADIUS: u32 = 10;

/// A rectangle in page-pixel coordinates of a raster rendered at the session's
/// render scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// `(left, top, right, bottom)` edges of a [`Region`].
///
/// Computed in `i64` so `x + width` can never overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBox {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the region's edges.
    pub fn bounds(&self) -> RegionBox {
        let left = i64::from(self.x);
        let top = i64::from(self.y);
        RegionBox {
            left,
            top,
            right: left + i64::from(self.width),
            bottom: top + i64::from(self.height),
        }
    }

    /// Scales origin and size by `factor`, truncating toward zero.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: (self.x as f32 * factor) as i32,
            y: (self.y as f32 * factor) as i32,
            width: (self.width as f32 * factor) as u32,
            height: (self.height as f32 * factor) as u32,
        }
    }
}

impl RegionBox {
    pub fn as_tuple(&self) -> (i64, i64, i64, i64) {
        (self.left, self.top, self.right, self.bottom)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) → {}×{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// How the pixels inside a region are destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// Gaussian blur with the given radius in pixels.
    ///
    /// `masker::apply` treats 0 as 1. [`RedactionCommitter`](crate::pipeline::committer::RedactionCommitter)
    /// rejects radii below its minimum before rendering.
    Blur { radius: u32 },
    /// Flat black fill.
    Black,
    /// Flat white fill.
    White,
}

impl MaskMode {
    pub fn blur() -> Self {
        Self::Blur {
            radius: DEFAULT_BLUR_RADIUS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MaskMode::Blur { .. } => "blur",
            MaskMode::Black => "black",
            MaskMode::White => "white",
        }
    }
}

impl Default for MaskMode {
    fn default() -> Self {
        Self::blur()
    }
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskMode::Blur { radius } => write!(f, "blur(radius={radius})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Regions to redact, keyed by 1-based page number.
///
/// The key domain is `1..=page_count`; keys outside it are rejected on insert
/// so they never reach the rendering loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRegions {
    page_count: u32,
    pages: BTreeMap<u32, Vec<Region>>,
}

impl PageRegions {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            pages: BTreeMap::new(),
        }
    }

    /// Builds a mapping from `(page, regions)` pairs, validating every key.
    pub fn from_pages(
        page_count: u32,
        pages: impl IntoIterator<Item = (u32, Vec<Region>)>,
    ) -> crate::error::Result<Self> {
        let mut mapping = Self::new(page_count);
        for (page, regions) in pages {
            mapping.insert(page, regions)?;
        }
        Ok(mapping)
    }

    /// Sets the regions of `page`, replacing any previous entry.
    pub fn insert(&mut self, page: u32, regions: Vec<Region>) -> crate::error::Result<()> {
        if page < 1 || page > self.page_count {
            return Err(RedactError::page_out_of_range(page, self.page_count));
        }
        self.pages.insert(page, regions);
        Ok(())
    }

    pub fn get(&self, page: u32) -> Option<&[Region]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Iterates pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Region])> {
        self.pages.iter().map(|(p, r)| (*p, r.as_slice()))
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Number of pages that carry an entry.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Highest page number with an entry.
    pub fn last_page(&self) -> Option<u32> {
        self.pages.keys().next_back().copied()
    }
}
