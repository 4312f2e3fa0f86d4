// 複数のPDF・画像を1つのPDFにまとめる

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::error::RedactError;
use crate::pdf::pages::PageImporter;
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::RasterPdfWriter;
use crate::render::{self, ImageDocument};
use crate::validate::{FileKind, kind_of, validate_file};

pub const DEFAULT_MERGE_DPI: u32 = 300;

pub struct Aggregator {
    merge_dpi: u32,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_DPI)
    }
}

impl Aggregator {
    pub fn new(merge_dpi: u32) -> Self {
        Self { merge_dpi }
    }

    pub fn merge_dpi(&self) -> u32 {
        self.merge_dpi
    }

    /// 入力を順番どおり1つのPDFに結合し、`output` にアトミックに書き出す。
    ///
    /// 画像は `merge_dpi` で1ページのPDFに変換してから取り込む。
    /// 入力は書き込み前にすべて検証する。
    #[instrument(skip_all, fields(inputs = files.len(), output = %output.display()))]
    pub fn merge<P: AsRef<Path>>(&self, files: &[P], output: &Path) -> crate::error::Result<PathBuf> {
        if files.is_empty() {
            return Err(RedactError::NoInputs);
        }
        let validated = files
            .iter()
            .map(validate_file)
            .collect::<crate::error::Result<Vec<_>>>()?;

        let mut importer = PageImporter::new();
        for (path, kind) in &validated {
            match kind {
                FileKind::Image => {
                    let image = image::open(path).map_err(|e| {
                        RedactError::image(format!("failed to open {}: {}", path.display(), e))
                    })?;
                    let mut writer = RasterPdfWriter::with_dpi(self.merge_dpi);
                    writer.add_raster(&render::normalize(image))?;
                    importer.import_all(&writer.finish()?)?;
                }
                FileKind::Pdf => {
                    let reader = PdfReader::open(path)?;
                    importer.import_all(reader.document())?;
                }
            }
            debug!(file = %path.display(), pages = importer.page_count(), "input_merged");
        }

        let pages = importer.page_count();
        importer.save(output)?;
        info!(pages, "merge_complete");
        Ok(output.to_path_buf())
    }

    /// 入力ごとのサムネイルを返す。PDFは全ページを描画する。
    ///
    /// 存在しないパスと対応外の拡張子は読み飛ばす。
    pub fn preview<P: AsRef<Path>>(
        &self,
        files: &[P],
        scale: f32,
    ) -> crate::error::Result<Vec<DynamicImage>> {
        let mut thumbnails = Vec::new();
        for file in files {
            let path = file.as_ref();
            if !path.exists() {
                warn!(file = %path.display(), "preview_skipped: missing");
                continue;
            }
            match kind_of(path) {
                Some(FileKind::Image) => {
                    let document = ImageDocument::open(path)?;
                    thumbnails.push(render::render(&document, 1, scale)?);
                }
                Some(FileKind::Pdf) => {
                    let document = render::open_document(path)?;
                    for page in 1..=document.page_count() {
                        thumbnails.push(render::render(document.as_ref(), page, scale)?);
                    }
                }
                None => continue,
            }
        }
        Ok(thumbnails)
    }
}

