use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::mask::{MaskMode, Region};

/// 設定ファイル上のマスク種別。ぼかし半径は別キーで指定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskKind {
    #[default]
    Blur,
    Black,
    White,
}

impl MaskKind {
    pub fn to_mode(self, blur_radius: u32) -> MaskMode {
        match self {
            MaskKind::Blur => MaskMode::Blur {
                radius: blur_radius,
            },
            MaskKind::Black => MaskMode::Black,
            MaskKind::White => MaskMode::White,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

impl JobFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Job {
    Redact(RedactJob),
    Merge(MergeJob),
    Extract(ExtractJob),
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Redact(_) => "redact",
            Job::Merge(_) => "merge",
            Job::Extract(_) => "extract",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedactJob {
    pub input: String,
    pub output: String,
    pub mode: Option<MaskKind>,
    pub blur_radius: Option<u32>,
    pub render_scale: Option<f32>,
    /// CommitReportをJSONで書き出す先。
    pub report: Option<String>,
    /// 1-indexedページ番号 -> 領域（render_scale基準のピクセル座標）
    #[serde(default)]
    pub regions: BTreeMap<u32, Vec<Region>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeJob {
    pub inputs: Vec<String>,
    pub output: String,
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractJob {
    pub input: String,
    /// ページ範囲文字列 (`"1-3, 5"`)
    pub pages: String,
    pub output: Option<String>,
    pub output_dir: Option<String>,
    #[serde(default)]
    pub as_images: bool,
    pub dpi: Option<u32>,
}

/// 抽出ジョブの出力先。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractTarget<P> {
    /// 選択ページを1つのPDFへ
    Single(P),
    /// 1ページ1ファイル
    Split { dir: P, as_images: bool },
}

impl ExtractJob {
    /// `output` と `output_dir` のどちらか一方だけを受け付ける。
    pub fn target(&self) -> crate::error::Result<ExtractTarget<&str>> {
        match (&self.output, &self.output_dir) {
            (Some(output), None) => {
                if self.as_images {
                    return Err(crate::error::RedactError::config(
                        "as_images requires output_dir",
                    ));
                }
                Ok(ExtractTarget::Single(output.as_str()))
            }
            (None, Some(dir)) => Ok(ExtractTarget::Split {
                dir: dir.as_str(),
                as_images: self.as_images,
            }),
            (Some(_), Some(_)) => Err(crate::error::RedactError::config(
                "extract job takes either output or output_dir, not both",
            )),
            (None, None) => Err(crate::error::RedactError::config(
                "extract job needs output or output_dir",
            )),
        }
    }
}
