pub mod image_source;
#[cfg(feature = "pdfium")]
pub mod pdfium;

use std::path::Path;

use image::DynamicImage;

use crate::error::RedactError;
use crate::validate::{FileKind, validate_file};

pub use image_source::ImageDocument;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumDocument;

/// An open document that can be rasterized page by page.
///
/// Page numbers are 1-based. Implementations may assume callers go through
/// [`render`], which validates the page number and scale first.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Page size in the document's native units (PDF points, or pixels for
    /// raster images).
    fn native_size(&self, page_number: u32) -> crate::error::Result<(f32, f32)>;

    /// Renders the page to exactly `width` x `height` pixels.
    fn render_at(
        &self,
        page_number: u32,
        width: u32,
        height: u32,
    ) -> crate::error::Result<DynamicImage>;
}

impl<T: PageSource + ?Sized> PageSource for Box<T> {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn native_size(&self, page_number: u32) -> crate::error::Result<(f32, f32)> {
        (**self).native_size(page_number)
    }

    fn render_at(
        &self,
        page_number: u32,
        width: u32,
        height: u32,
    ) -> crate::error::Result<DynamicImage> {
        (**self).render_at(page_number, width, height)
    }
}

pub fn page_count(doc: &dyn PageSource) -> u32 {
    doc.page_count()
}

/// Fails with `PageOutOfRange` unless `1 <= page_number <= page_count`.
pub fn check_page(doc: &dyn PageSource, page_number: u32) -> crate::error::Result<()> {
    let count = doc.page_count();
    if page_number < 1 || page_number > count {
        return Err(RedactError::page_out_of_range(page_number, count));
    }
    Ok(())
}

pub fn native_size(doc: &dyn PageSource, page_number: u32) -> crate::error::Result<(f32, f32)> {
    check_page(doc, page_number)?;
    doc.native_size(page_number)
}

/// Pixel dimensions of a `native_w` x `native_h` page rendered at `scale`.
///
/// Each side is rounded to the nearest pixel and is at least 1.
pub fn scaled_dimensions(native_w: f32, native_h: f32, scale: f32) -> (u32, u32) {
    let w = (native_w * scale).round().max(1.0) as u32;
    let h = (native_h * scale).round().max(1.0) as u32;
    (w, h)
}

/// Pixel dimensions `render` would produce, without rendering.
pub fn rendered_size(
    doc: &dyn PageSource,
    page_number: u32,
    scale: f32,
) -> crate::error::Result<(u32, u32)> {
    check_scale(scale)?;
    let (w, h) = native_size(doc, page_number)?;
    Ok(scaled_dimensions(w, h, scale))
}

fn check_scale(scale: f32) -> crate::error::Result<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RedactError::render(format!(
            "render scale must be a positive number, got {scale}"
        )));
    }
    Ok(())
}

/// Renders a page at `scale` pixels per native unit.
///
/// The result is `Luma8` for greyscale sources and `Rgb8` otherwise.
///
/// # Errors
/// - `PageOutOfRange` if the page number is outside `1..=page_count`
/// - `RenderError` if the scale is not a positive finite number or the
///   backend fails
pub fn render(
    doc: &dyn PageSource,
    page_number: u32,
    scale: f32,
) -> crate::error::Result<DynamicImage> {
    let (width, height) = rendered_size(doc, page_number, scale)?;
    let raster = doc.render_at(page_number, width, height)?;
    Ok(normalize(raster))
}

/// Collapses a raster to the two colour models the masking pipeline emits.
pub fn normalize(raster: DynamicImage) -> DynamicImage {
    match raster {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => raster,
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            DynamicImage::ImageLuma8(raster.to_luma8())
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Opens a PDF or image file as a [`PageSource`].
pub fn open_document(path: impl AsRef<Path>) -> crate::error::Result<Box<dyn PageSource>> {
    let (path, kind) = validate_file(path)?;
    match kind {
        FileKind::Image => Ok(Box::new(ImageDocument::open(&path)?)),
        #[cfg(feature = "pdfium")]
        FileKind::Pdf => Ok(Box::new(PdfiumDocument::open(&path)?)),
        #[cfg(not(feature = "pdfium"))]
        FileKind::Pdf => Err(RedactError::render(format!(
            "cannot rasterize {}: built without the `pdfium` feature",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_dimensions_round_half_up() {
        assert_eq!(scaled_dimensions(612.0, 792.0, 2.0), (1224, 1584));
        assert_eq!(scaled_dimensions(10.0, 10.0, 0.25), (3, 3));
        assert_eq!(scaled_dimensions(1.0, 1.0, 0.01), (1, 1));
    }

    #[test]
    fn test_normalize_luma_alpha_to_luma() {
        let img = DynamicImage::new_luma_a8(4, 4);
        assert!(matches!(normalize(img), DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_normalize_rgba_to_rgb() {
        let img = DynamicImage::new_rgba8(4, 4);
        assert!(matches!(normalize(img), DynamicImage::ImageRgb8(_)));
    }
}
