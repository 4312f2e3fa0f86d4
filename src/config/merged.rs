use super::job::RedactJob;
use super::settings::{Settings, check_blur_radius, check_scale};
use crate::mask::MaskMode;

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRedactConfig {
    pub render_scale: f32,
    pub mode: MaskMode,
    pub min_blur_radius: u32,
    pub parallel_workers: usize,
}

impl MergedRedactConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    ///
    /// 上書き後の倍率とぼかし半径はSettingsと同じ規則で検証する。
    pub fn new(settings: &Settings, job: &RedactJob) -> crate::error::Result<Self> {
        let render_scale = job.render_scale.unwrap_or(settings.render_scale);
        check_scale("render_scale", render_scale)?;

        let blur_radius = job.blur_radius.unwrap_or(settings.blur_radius);
        let kind = job.mode.unwrap_or(settings.mask_mode);
        let mode = kind.to_mode(blur_radius);
        if matches!(mode, MaskMode::Blur { .. }) {
            check_blur_radius(blur_radius, settings.min_blur_radius)?;
        }

        Ok(MergedRedactConfig {
            render_scale,
            mode,
            min_blur_radius: settings.min_blur_radius,
            parallel_workers: settings.parallel_workers,
        })
    }
}
