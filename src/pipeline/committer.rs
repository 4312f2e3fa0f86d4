// 墨消し確定: 全ページ描画 -> 並列マスク+エンコード -> 1つのPDFに組立

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::RedactError;
use crate::events::{EventSink, RedactionEvent, default_sink};
use crate::mask::{DEFAULT_MIN_BLUR_RADIUS, MaskMode, PageRegions, Region, masker};
use crate::pdf::write_atomic;
use crate::pdf::writer::{EncodedRaster, RasterPdfWriter};
use crate::render::{self, PageSource};

/// Summary of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub page_count: u32,
    /// 1-based numbers of pages that carried at least one region.
    pub masked_pages: Vec<u32>,
    pub regions_applied: usize,
    pub regions_dropped: usize,
    /// SHA-256 of each emitted raster, in page order.
    pub page_digests: Vec<String>,
}

/// The bytes of a redacted PDF plus its report.
#[derive(Debug, Clone)]
pub struct CommittedDocument {
    pub bytes: Vec<u8>,
    pub report: CommitReport,
}

/// Rasterizes a document, masks the requested regions, and writes one image
/// page per source page.
pub struct RedactionCommitter {
    render_scale: f32,
    parallel_workers: usize,
    min_blur_radius: u32,
    sink: Arc<dyn EventSink>,
}

impl RedactionCommitter {
    pub fn new(render_scale: f32) -> Self {
        Self::with_sink(render_scale, default_sink())
    }

    pub fn with_sink(render_scale: f32, sink: Arc<dyn EventSink>) -> Self {
        Self {
            render_scale,
            parallel_workers: 0,
            min_blur_radius: DEFAULT_MIN_BLUR_RADIUS,
            sink,
        }
    }

    /// Worker threads for the encode phase; 0 uses rayon's global pool.
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers;
        self
    }

    /// Blur modes with a smaller radius are refused by [`commit`](Self::commit).
    pub fn with_min_blur_radius(mut self, radius: u32) -> Self {
        self.min_blur_radius = radius;
        self
    }

    pub fn render_scale(&self) -> f32 {
        self.render_scale
    }

    pub fn parallel_workers(&self) -> usize {
        self.parallel_workers
    }

    pub fn min_blur_radius(&self) -> u32 {
        self.min_blur_radius
    }

    /// Produces the redacted PDF in memory.
    ///
    /// # Errors
    /// - `EmptyDocument` if the document has no pages
    /// - `PageOutOfRange` if `page_regions` names a page past the end
    /// - `ConfigError` if a blur radius is below `min_blur_radius`
    /// - `RenderError` / `EncodeFailure` from rendering or encoding
    pub fn commit(
        &self,
        document: &dyn PageSource,
        page_regions: &PageRegions,
        mode: MaskMode,
    ) -> crate::error::Result<CommittedDocument> {
        let page_count = document.page_count();
        if page_count == 0 {
            return Err(RedactError::EmptyDocument);
        }
        if let Some(last) = page_regions.last_page()
            && last > page_count
        {
            return Err(RedactError::page_out_of_range(last, page_count));
        }
        if let MaskMode::Blur { radius } = mode
            && radius < self.min_blur_radius
        {
            return Err(RedactError::config(format!(
                "blur radius {radius} is below the minimum of {}",
                self.min_blur_radius
            )));
        }

        self.sink.emit(RedactionEvent::CommitStarted {
            page_count,
            masked_pages: page_regions.len(),
            mode,
        });

        // 描画は呼び出し元スレッドで順番に行う（PageSourceはスレッド安全とは限らない）
        let mut rasters = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            let raster = render::render(document, page, self.render_scale)?;
            self.sink.emit(RedactionEvent::PageRendered {
                page,
                width: raster.width(),
                height: raster.height(),
            });
            rasters.push(raster);
        }

        let mut regions_applied = 0;
        let mut regions_dropped = 0;
        for (page, regions) in page_regions.iter() {
            let raster = &rasters[(page - 1) as usize];
            let (applied, dropped) = masker::partition(regions, raster.width(), raster.height());
            for index in dropped.iter().copied() {
                self.sink.emit(RedactionEvent::RegionDropped {
                    page,
                    index,
                    region: regions[index],
                });
            }
            regions_applied += applied.len();
            regions_dropped += dropped.len();
        }

        let encoded = self.mask_and_encode(&rasters, page_regions, mode)?;
        drop(rasters);

        let mut writer = RasterPdfWriter::new(1.0 / f64::from(self.render_scale));
        let mut page_digests = Vec::with_capacity(encoded.len());
        for (digest, raster) in &encoded {
            writer.add_page(raster);
            page_digests.push(digest.clone());
        }
        let bytes = writer
            .save_to_bytes()
            .map_err(|e| RedactError::encode(e.to_string()))?;

        let report = CommitReport {
            page_count,
            masked_pages: page_regions.iter().map(|(page, _)| page).collect(),
            regions_applied,
            regions_dropped,
            page_digests,
        };
        Ok(CommittedDocument { bytes, report })
    }

    /// Masks, digests, and encodes every raster, in page order.
    fn mask_and_encode(
        &self,
        rasters: &[DynamicImage],
        page_regions: &PageRegions,
        mode: MaskMode,
    ) -> crate::error::Result<Vec<(String, EncodedRaster)>> {
        let process = || -> crate::error::Result<Vec<(String, EncodedRaster)>> {
            rasters
                .par_iter()
                .enumerate()
                .map(|(i, raster)| {
                    let page = i as u32 + 1;
                    let masked = match page_regions.get(page) {
                        Some(regions) => Cow::Owned(masker::apply(raster, regions, mode)),
                        None => Cow::Borrowed(raster),
                    };
                    if let Some(regions) = page_regions.get(page) {
                        self.sink.emit(RedactionEvent::PageMasked {
                            page,
                            regions: regions.len(),
                        });
                    }
                    let digest = raster_digest(&masked);
                    let encoded = EncodedRaster::encode(&masked)?;
                    Ok((digest, encoded))
                })
                .collect()
        };

        if self.parallel_workers == 0 {
            return process();
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_workers)
            .build()
            .map_err(|e| RedactError::config(format!("cannot start worker pool: {e}")))?;
        pool.install(process)
    }

    /// Commits and writes the PDF to `output` atomically.
    ///
    /// Nothing is written unless the whole document was produced.
    pub fn commit_to_file(
        &self,
        document: &dyn PageSource,
        page_regions: &PageRegions,
        mode: MaskMode,
        output: &Path,
    ) -> crate::error::Result<CommitReport> {
        let committed = self.commit(document, page_regions, mode)?;
        write_atomic(output, &committed.bytes)?;
        self.sink.emit(RedactionEvent::CommitFinished {
            page_count: committed.report.page_count,
            output: Some(output.to_path_buf()),
        });
        Ok(committed.report)
    }

    /// Commits a document with regions on a single page.
    pub fn commit_page(
        &self,
        document: &dyn PageSource,
        page: u32,
        regions: Vec<Region>,
        mode: MaskMode,
    ) -> crate::error::Result<CommittedDocument> {
        let page_regions = PageRegions::from_pages(document.page_count(), [(page, regions)])?;
        self.commit(document, &page_regions, mode)
    }
}

/// SHA-256 over a raster's dimensions, colour model, and pixel bytes.
pub fn raster_digest(raster: &DynamicImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raster.width().to_le_bytes());
    hasher.update(raster.height().to_le_bytes());
    match raster {
        DynamicImage::ImageLuma8(gray) => {
            hasher.update(b"L");
            hasher.update(gray.as_raw());
        }
        DynamicImage::ImageRgb8(rgb) => {
            hasher.update(b"RGB");
            hasher.update(rgb.as_raw());
        }
        other => {
            hasher.update(b"RGB");
            hasher.update(other.to_rgb8().as_raw());
        }
    }
    hex::encode(hasher.finalize())
}
