// PDFから指定ページを取り出す（PDFまたはPNG）

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument};

use super::range::parse_page_range;
use crate::error::RedactError;
use crate::pdf::pages::PageImporter;
use crate::pdf::reader::PdfReader;
use crate::pdf::write_atomic;
use crate::render::{self, PageSource};
use crate::validate::validate_pdf;

pub const DEFAULT_EXTRACT_DPI: u32 = 150;

pub struct Separator {
    extract_dpi: u32,
}

impl Default for Separator {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACT_DPI)
    }
}

impl Separator {
    pub fn new(extract_dpi: u32) -> Self {
        Self { extract_dpi }
    }

    pub fn extract_dpi(&self) -> u32 {
        self.extract_dpi
    }

    pub fn page_count(&self, pdf: impl AsRef<Path>) -> crate::error::Result<u32> {
        let path = validate_pdf(pdf)?;
        Ok(PdfReader::open(&path)?.page_count())
    }

    /// 1ページ(1-indexed)を `scale` 倍で描画する。
    pub fn render_page(
        &self,
        pdf: impl AsRef<Path>,
        page: u32,
        scale: f32,
    ) -> crate::error::Result<DynamicImage> {
        let path = validate_pdf(pdf)?;
        let document = render::open_document(&path)?;
        render::render(document.as_ref(), page, scale)
    }

    fn select_pages(reader: &PdfReader, range: &str) -> crate::error::Result<Vec<u32>> {
        let page_count = reader.page_count();
        let indices = parse_page_range(range, page_count);
        if indices.is_empty() {
            return Err(RedactError::EmptyPageSelection {
                range: range.to_string(),
                page_count,
            });
        }
        Ok(indices)
    }

    /// 選択したページを1ページ1ファイルで `out_dir` に書き出す。
    ///
    /// ファイル名は `{stem}_page{n}.pdf`、`as_images` なら
    /// `extract_dpi` で描画した `{stem}_page{n}.png`。
    #[instrument(skip_all, fields(pdf = %pdf.as_ref().display(), range, as_images))]
    pub fn extract(
        &self,
        pdf: impl AsRef<Path>,
        range: &str,
        out_dir: &Path,
        as_images: bool,
    ) -> crate::error::Result<Vec<PathBuf>> {
        let path = validate_pdf(pdf)?;
        let reader = PdfReader::open(&path)?;
        let indices = Self::select_pages(&reader, range)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());

        std::fs::create_dir_all(out_dir)?;

        let rendered: Option<Box<dyn PageSource>> = if as_images {
            Some(render::open_document(&path)?)
        } else {
            None
        };
        let scale = self.extract_dpi as f32 / 72.0;

        let mut outputs = Vec::with_capacity(indices.len());
        for index in indices {
            let page = index + 1;
            let target = match &rendered {
                Some(document) => {
                    let target = out_dir.join(format!("{stem}_page{page}.png"));
                    let raster = render::render(document.as_ref(), page, scale)?;
                    write_atomic(&target, &encode_png(&raster)?)?;
                    target
                }
                None => {
                    let target = out_dir.join(format!("{stem}_page{page}.pdf"));
                    let mut importer = PageImporter::new();
                    importer.import_pages(reader.document(), &[index])?;
                    importer.save(&target)?;
                    target
                }
            };
            debug!(page, output = %target.display(), "page_extracted");
            outputs.push(target);
        }

        info!(files = outputs.len(), "extract_complete");
        Ok(outputs)
    }

    /// 選択したページをまとめて1つのPDFとして `output` に書き出す。
    #[instrument(skip_all, fields(pdf = %pdf.as_ref().display(), range))]
    pub fn extract_single(
        &self,
        pdf: impl AsRef<Path>,
        range: &str,
        output: &Path,
    ) -> crate::error::Result<PathBuf> {
        let path = validate_pdf(pdf)?;
        let reader = PdfReader::open(&path)?;
        let indices = Self::select_pages(&reader, range)?;

        let mut importer = PageImporter::new();
        importer.import_pages(reader.document(), &indices)?;
        importer.save(output)?;
        info!(pages = indices.len(), output = %output.display(), "extract_complete");
        Ok(output.to_path_buf())
    }
}

fn encode_png(raster: &DynamicImage) -> crate::error::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    raster.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
