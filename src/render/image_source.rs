// Raster images as a page source: one image per page, native unit = 1 pixel

use std::path::Path;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, instrument};

use super::PageSource;
use crate::error::RedactError;

pub struct ImageDocument {
    pages: Vec<DynamicImage>,
}

impl ImageDocument {
    /// Decodes an image file as a single-page document.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            RedactError::image(format!("failed to open {}: {}", path.display(), e))
        })?;
        debug!(width = img.width(), height = img.height(), "image_loaded");
        Ok(Self { pages: vec![img] })
    }

    pub fn from_images(pages: Vec<DynamicImage>) -> Self {
        Self { pages }
    }

    pub fn page(&self, page_number: u32) -> crate::error::Result<&DynamicImage> {
        let count = self.page_count();
        page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or_else(|| RedactError::page_out_of_range(page_number, count))
    }
}

impl PageSource for ImageDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn native_size(&self, page_number: u32) -> crate::error::Result<(f32, f32)> {
        let img = self.page(page_number)?;
        Ok((img.width() as f32, img.height() as f32))
    }

    fn render_at(
        &self,
        page_number: u32,
        width: u32,
        height: u32,
    ) -> crate::error::Result<DynamicImage> {
        let img = self.page(page_number)?;
        if img.width() == width && img.height() == height {
            return Ok(img.clone());
        }
        Ok(img.resize_exact(width, height, FilterType::Lanczos3))
    }
}
