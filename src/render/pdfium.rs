// pdfium-render wrapper: PDF page -> DynamicImage (in-memory only)

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, instrument};

use super::PageSource;
use crate::error::RedactError;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(RedactError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(RedactError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let lib_path = resolve_pdfium_lib_path()?;
    let lib_path_str = lib_path
        .to_str()
        .ok_or_else(|| RedactError::render("pdfium library path contains non-UTF-8 characters"))?;
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
    Ok(Pdfium::new(bindings))
}

fn page_index(page_number: u32) -> crate::error::Result<u16> {
    page_number
        .checked_sub(1)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or_else(|| RedactError::render(format!("page number {page_number} exceeds pdfium range")))
}

/// A PDF opened for rasterization.
///
/// Page sizes are read once at open time. Each render binds pdfium afresh and
/// reloads the file, so the handle holds no pdfium state between calls.
pub struct PdfiumDocument {
    path: PathBuf,
    page_sizes: Vec<(f32, f32)>,
}

impl PdfiumDocument {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let pdfium = create_pdfium()?;
        let document = pdfium.load_pdf_from_file(&path, None)?;

        let page_sizes: Vec<(f32, f32)> = document
            .pages()
            .iter()
            .map(|page| (page.width().value, page.height().value))
            .collect();

        debug!(pages = page_sizes.len(), "pdf_opened");
        Ok(Self { path, page_sizes })
    }
}

impl PageSource for PdfiumDocument {
    fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    fn native_size(&self, page_number: u32) -> crate::error::Result<(f32, f32)> {
        let count = self.page_count();
        page_number
            .checked_sub(1)
            .and_then(|i| self.page_sizes.get(i as usize))
            .copied()
            .ok_or_else(|| RedactError::page_out_of_range(page_number, count))
    }

    fn render_at(
        &self,
        page_number: u32,
        width: u32,
        height: u32,
    ) -> crate::error::Result<DynamicImage> {
        let index = page_index(page_number)?;
        let target_w = i32::try_from(width)
            .map_err(|_| RedactError::render("target width exceeds i32 range"))?;
        let target_h = i32::try_from(height)
            .map_err(|_| RedactError::render("target height exceeds i32 range"))?;

        let pdfium = create_pdfium()?;
        let document = pdfium.load_pdf_from_file(&self.path, None)?;
        let page = document.pages().get(index)?;

        let config = PdfRenderConfig::new()
            .set_target_width(target_w)
            .set_target_height(target_h);

        let bitmap = page.render_with_config(&config)?;
        Ok(bitmap.as_image())
    }
}
