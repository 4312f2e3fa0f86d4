use std::path::Path;

use serde::Deserialize;

use super::job::MaskKind;
use crate::mask::{DEFAULT_BLUR_RADIUS, DEFAULT_MIN_BLUR_RADIUS};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 墨消し時のレンダリング倍率（PDFポイントあたりのピクセル数）。
    pub render_scale: f32,
    pub mask_mode: MaskKind,
    /// ぼかし半径(px, render_scale基準)。
    pub blur_radius: u32,
    pub min_blur_radius: u32,
    pub merge_dpi: u32,
    pub extract_dpi: u32,
    /// 0ならrayonのデフォルト。
    pub parallel_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            render_scale: 2.0,
            mask_mode: MaskKind::Blur,
            blur_radius: DEFAULT_BLUR_RADIUS,
            min_blur_radius: DEFAULT_MIN_BLUR_RADIUS,
            merge_dpi: 300,
            extract_dpi: 150,
            parallel_workers: 0,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::RedactError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// 倍率・DPIが正であること、ぼかし半径が下限以上であることを確認する。
    pub fn validate(&self) -> crate::error::Result<()> {
        check_scale("render_scale", self.render_scale)?;
        if self.merge_dpi == 0 {
            return Err(crate::error::RedactError::config("merge_dpi must be positive"));
        }
        if self.extract_dpi == 0 {
            return Err(crate::error::RedactError::config("extract_dpi must be positive"));
        }
        check_blur_radius(self.blur_radius, self.min_blur_radius)
    }
}

pub(crate) fn check_scale(name: &str, value: f32) -> crate::error::Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(crate::error::RedactError::config(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn check_blur_radius(radius: u32, min: u32) -> crate::error::Result<()> {
    if radius < min {
        return Err(crate::error::RedactError::config(format!(
            "blur_radius {radius} is below min_blur_radius {min}"
        )));
    }
    Ok(())
}
