// Region masking: raster + regions + mode -> new raster

use image::{DynamicImage, ImageBuffer, Luma, Pixel, Rgb, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use super::{MaskMode, Region};

/// A region's box clamped to a raster, in non-negative pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamps a region's box to `[0,width] × [0,height]`.
///
/// Returns `None` when the clamped box has no area (degenerate or entirely
/// off-canvas regions).
pub fn clamp(region: &Region, width: u32, height: u32) -> Option<PixelBox> {
    let b = region.bounds();
    let left = b.left.clamp(0, i64::from(width));
    let top = b.top.clamp(0, i64::from(height));
    let right = b.right.clamp(0, i64::from(width));
    let bottom = b.bottom.clamp(0, i64::from(height));

    if right <= left || bottom <= top {
        return None;
    }

    // All four values are within [0, u32::MAX] after clamping.
    Some(PixelBox {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Splits region indices into those that survive clamping and those dropped.
pub fn partition(regions: &[Region], width: u32, height: u32) -> (Vec<usize>, Vec<usize>) {
    let mut applied = Vec::new();
    let mut dropped = Vec::new();
    for (i, region) in regions.iter().enumerate() {
        if clamp(region, width, height).is_some() {
            applied.push(i);
        } else {
            dropped.push(i);
        }
    }
    (applied, dropped)
}

/// Applies `mode` to every region of `raster` and returns the masked copy.
///
/// Regions are processed in insertion order, so later regions operate on the
/// result of earlier ones where they overlap. Regions whose clamped box is
/// empty are skipped. The input raster is never modified.
///
/// Greyscale rasters stay greyscale; any colour model other than `Luma8` and
/// `Rgb8` is converted to `Rgb8` first.
pub fn apply(raster: &DynamicImage, regions: &[Region], mode: MaskMode) -> DynamicImage {
    let mut result = raster.clone();
    if regions.is_empty() {
        return result;
    }

    let (width, height) = (raster.width(), raster.height());
    let boxes: Vec<PixelBox> = regions
        .iter()
        .filter_map(|r| clamp(r, width, height))
        .collect();
    if boxes.is_empty() {
        return result;
    }

    match &mut result {
        DynamicImage::ImageLuma8(gray) => {
            for b in &boxes {
                mask_box(gray, *b, mode, Luma([0]), Luma([255]));
            }
        }
        DynamicImage::ImageRgb8(rgb) => {
            for b in &boxes {
                mask_box(rgb, *b, mode, Rgb([0, 0, 0]), Rgb([255, 255, 255]));
            }
        }
        other => {
            let mut rgb = other.to_rgb8();
            for b in &boxes {
                mask_box(&mut rgb, *b, mode, Rgb([0, 0, 0]), Rgb([255, 255, 255]));
            }
            *other = DynamicImage::ImageRgb8(rgb);
        }
    }

    result
}

fn mask_box<P>(
    buf: &mut ImageBuffer<P, Vec<u8>>,
    b: PixelBox,
    mode: MaskMode,
    black: P,
    white: P,
) where
    P: Pixel<Subpixel = u8> + 'static,
{
    match mode {
        MaskMode::Blur { radius } => {
            let original = imageops::crop_imm(&*buf, b.x, b.y, b.width, b.height).to_image();
            let blurred = imageops::blur(&original, radius.max(1) as f32);
            imageops::replace(buf, &blurred, i64::from(b.x), i64::from(b.y));
        }
        MaskMode::Black => fill(buf, b, black),
        MaskMode::White => fill(buf, b, white),
    }
}

fn fill<P>(buf: &mut ImageBuffer<P, Vec<u8>>, b: PixelBox, color: P)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    // Non-empty after clamp(); coordinates fit in i32 for any raster `image` can hold.
    let rect = Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height);
    draw_filled_rect_mut(buf, rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside() {
        let b = clamp(&Region::new(10, 20, 30, 40), 100, 100).expect("inside");
        assert_eq!(
            b,
            PixelBox {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn test_clamp_partially_outside() {
        let b = clamp(&Region::new(-10, 90, 30, 40), 100, 100).expect("partial");
        assert_eq!(
            b,
            PixelBox {
                x: 0,
                y: 90,
                width: 20,
                height: 10
            }
        );
    }

    #[test]
    fn test_clamp_off_canvas_is_none() {
        assert!(clamp(&Region::new(200, 200, 10, 10), 100, 100).is_none());
        assert!(clamp(&Region::new(-50, 0, 20, 10), 100, 100).is_none());
    }

    #[test]
    fn test_clamp_zero_size_is_none() {
        assert!(clamp(&Region::new(5, 5, 0, 10), 100, 100).is_none());
        assert!(clamp(&Region::new(5, 5, 10, 0), 100, 100).is_none());
    }

    #[test]
    fn test_partition_reports_dropped_indices() {
        let regions = [
            Region::new(0, 0, 10, 10),
            Region::new(500, 500, 10, 10),
            Region::new(1, 1, 0, 0),
            Region::new(5, 5, 5, 5),
        ];
        let (applied, dropped) = partition(&regions, 100, 100);
        assert_eq!(applied, vec![0, 3]);
        assert_eq!(dropped, vec![1, 2]);
    }

    #[test]
    fn test_rgba_input_becomes_rgb() {
        let img = DynamicImage::new_rgba8(20, 20);
        let out = apply(&img, &[Region::new(0, 0, 5, 5)], MaskMode::Black);
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }
}
