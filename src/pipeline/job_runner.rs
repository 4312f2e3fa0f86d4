// ジョブ単位の実行: 墨消し / 結合 / ページ抽出

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::assemble::{Aggregator, Separator};
use crate::config::job::{ExtractTarget, Job};
use crate::config::merged::MergedRedactConfig;
use crate::config::resolve_path;
use crate::config::settings::Settings;
use crate::mask::{PageRegions, Region};
use crate::pdf::write_atomic;
use crate::pipeline::committer::RedactionCommitter;
use crate::render;

/// Configuration for a single job, with every path resolved.
#[derive(Debug, Clone)]
pub enum JobConfig {
    Redact {
        input_path: PathBuf,
        output_path: PathBuf,
        /// 1-based page → regions, checked against the page count at run time.
        regions: BTreeMap<u32, Vec<Region>>,
        config: MergedRedactConfig,
        report_path: Option<PathBuf>,
    },
    Merge {
        input_paths: Vec<PathBuf>,
        output_path: PathBuf,
        dpi: u32,
    },
    Extract {
        input_path: PathBuf,
        pages: String,
        target: ExtractTarget<PathBuf>,
        dpi: u32,
    },
}

impl JobConfig {
    /// Merges `job` with `settings` and resolves its paths against `base_dir`.
    pub fn from_job(job: &Job, settings: &Settings, base_dir: &Path) -> crate::error::Result<Self> {
        match job {
            Job::Redact(redact) => Ok(JobConfig::Redact {
                input_path: resolve_path(base_dir, &redact.input),
                output_path: resolve_path(base_dir, &redact.output),
                regions: redact.regions.clone(),
                config: MergedRedactConfig::new(settings, redact)?,
                report_path: redact.report.as_deref().map(|p| resolve_path(base_dir, p)),
            }),
            Job::Merge(merge) => Ok(JobConfig::Merge {
                input_paths: merge
                    .inputs
                    .iter()
                    .map(|p| resolve_path(base_dir, p))
                    .collect(),
                output_path: resolve_path(base_dir, &merge.output),
                dpi: merge.dpi.unwrap_or(settings.merge_dpi),
            }),
            Job::Extract(extract) => {
                let target = match extract.target()? {
                    ExtractTarget::Single(output) => {
                        ExtractTarget::Single(resolve_path(base_dir, output))
                    }
                    ExtractTarget::Split { dir, as_images } => ExtractTarget::Split {
                        dir: resolve_path(base_dir, dir),
                        as_images,
                    },
                };
                Ok(JobConfig::Extract {
                    input_path: resolve_path(base_dir, &extract.input),
                    pages: extract.pages.clone(),
                    target,
                    dpi: extract.dpi.unwrap_or(settings.extract_dpi),
                })
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JobConfig::Redact { .. } => "redact",
            JobConfig::Merge { .. } => "merge",
            JobConfig::Extract { .. } => "extract",
        }
    }

    /// Human-readable input for status lines.
    pub fn input_label(&self) -> String {
        match self {
            JobConfig::Redact { input_path, .. } | JobConfig::Extract { input_path, .. } => {
                input_path.display().to_string()
            }
            JobConfig::Merge { input_paths, .. } => input_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub kind: &'static str,
    pub input_label: String,
    pub output_paths: Vec<PathBuf>,
    pub pages_processed: usize,
}

/// Run a single job to completion.
///
/// A failed redact job leaves neither the output PDF nor its report behind.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    match config {
        JobConfig::Redact {
            input_path,
            output_path,
            regions,
            config: merged,
            report_path,
        } => {
            let document = render::open_document(input_path)?;
            let page_regions = PageRegions::from_pages(document.page_count(), regions.clone())?;
            let committer = RedactionCommitter::new(merged.render_scale)
                .with_parallel_workers(merged.parallel_workers)
                .with_min_blur_radius(merged.min_blur_radius);
            let committed = committer.commit(document.as_ref(), &page_regions, merged.mode)?;
            let report = committed.report;

            // レポートを先に書く。PDFの書き込みに失敗したらレポートも消す
            if let Some(report_path) = report_path {
                let json = serde_json::to_vec_pretty(&report)?;
                write_atomic(report_path, &json)?;
            }
            if let Err(e) = write_atomic(output_path, &committed.bytes) {
                if let Some(report_path) = report_path
                    && let Err(remove_err) = std::fs::remove_file(report_path)
                {
                    warn!(report = %report_path.display(), %remove_err, "stale report left behind");
                }
                return Err(e);
            }

            let mut output_paths = vec![output_path.clone()];
            output_paths.extend(report_path.iter().cloned());
            Ok(JobResult {
                kind: config.kind(),
                input_label: config.input_label(),
                output_paths,
                pages_processed: report.page_count as usize,
            })
        }
        JobConfig::Merge {
            input_paths,
            output_path,
            dpi,
        } => {
            let output = Aggregator::new(*dpi).merge(input_paths, output_path)?;
            let pages_processed = Separator::default().page_count(&output)? as usize;
            Ok(JobResult {
                kind: config.kind(),
                input_label: config.input_label(),
                output_paths: vec![output],
                pages_processed,
            })
        }
        JobConfig::Extract {
            input_path,
            pages,
            target,
            dpi,
        } => {
            let separator = Separator::new(*dpi);
            let (output_paths, pages_processed) = match target {
                ExtractTarget::Single(output) => {
                    let page_count = separator.page_count(input_path)?;
                    let selected = crate::assemble::parse_page_range(pages, page_count).len();
                    (
                        vec![separator.extract_single(input_path, pages, output)?],
                        selected,
                    )
                }
                ExtractTarget::Split { dir, as_images } => {
                    let outputs = separator.extract(input_path, pages, dir, *as_images)?;
                    let count = outputs.len();
                    (outputs, count)
                }
            };
            Ok(JobResult {
                kind: config.kind(),
                input_label: config.input_label(),
                output_paths,
                pages_processed,
            })
        }
    }
}
