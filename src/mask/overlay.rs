// Preview decorations: region outlines, index labels, pending-corner marker

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::Region;
use super::masker::clamp;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0xff, 0x33, 0x66]);
pub const MARKER_COLOR: Rgb<u8> = Rgb([0x00, 0xff, 0x88]);
pub const MARKER_RIM_COLOR: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);

const OUTLINE_WIDTH: u32 = 3;
const LABEL_OFFSET: i32 = 5;
const LABEL_SCALE: u32 = 2;
const MARKER_RADIUS: i32 = 8;

/// 3x5 bitmap glyphs for the digits 0-9, one row per byte, MSB-first in the
/// low three bits.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Draws one outline and one 1-based label per region, in insertion order.
///
/// Regions that fall entirely outside the canvas are not drawn.
pub fn draw_regions(canvas: &mut RgbImage, regions: &[Region]) {
    let (width, height) = canvas.dimensions();
    for (i, region) in regions.iter().enumerate() {
        let Some(b) = clamp(region, width, height) else {
            continue;
        };

        for inset in 0..OUTLINE_WIDTH {
            let w = b.width.saturating_sub(2 * inset);
            let h = b.height.saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((b.x + inset) as i32, (b.y + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(canvas, rect, OUTLINE_COLOR);
        }

        draw_label(
            canvas,
            b.x as i32 + LABEL_OFFSET,
            b.y as i32 + LABEL_OFFSET,
            i + 1,
        );
    }
}

/// Draws the marker disc shown while a rectangle awaits its second corner.
pub fn draw_marker(canvas: &mut RgbImage, x: i32, y: i32) {
    draw_filled_circle_mut(canvas, (x, y), MARKER_RADIUS + 1, MARKER_RIM_COLOR);
    draw_filled_circle_mut(canvas, (x, y), MARKER_RADIUS, MARKER_COLOR);
}

/// Draws `number` in decimal with its top-left corner at `(x, y)`.
pub fn draw_label(canvas: &mut RgbImage, x: i32, y: i32, number: usize) {
    let advance = (4 * LABEL_SCALE) as i32;
    for (n, ch) in number.to_string().bytes().enumerate() {
        let glyph = &DIGITS[usize::from(ch - b'0')];
        draw_glyph(canvas, x + n as i32 * advance, y, glyph);
    }
}

fn draw_glyph(canvas: &mut RgbImage, x: i32, y: i32, glyph: &[u8; 5]) {
    let s = LABEL_SCALE as i32;
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..3 {
            if bits & (0b100 >> col) != 0 {
                let rect = Rect::at(x + col * s, y + row as i32 * s).of_size(LABEL_SCALE, LABEL_SCALE);
                draw_filled_rect_mut(canvas, rect, OUTLINE_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_drawn_on_box_edge() {
        let mut canvas = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        draw_regions(&mut canvas, &[Region::new(10, 10, 50, 40)]);
        assert_eq!(*canvas.get_pixel(10, 30), OUTLINE_COLOR);
        assert_eq!(*canvas.get_pixel(12, 30), OUTLINE_COLOR);
        assert_eq!(*canvas.get_pixel(35, 49), OUTLINE_COLOR);
        // interior away from the label stays untouched
        assert_eq!(*canvas.get_pixel(40, 30), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_label_pixels_inside_outline() {
        let mut canvas = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        draw_regions(&mut canvas, &[Region::new(10, 10, 60, 60)]);
        // "1" glyph: middle column of the first row is lit at (x+2, y)
        assert_eq!(*canvas.get_pixel(15 + 2, 15), OUTLINE_COLOR);
    }

    #[test]
    fn test_marker_centre_colour() {
        let mut canvas = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
        draw_marker(&mut canvas, 25, 25);
        assert_eq!(*canvas.get_pixel(25, 25), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(25 + MARKER_RADIUS as u32 + 1, 25), MARKER_RIM_COLOR);
    }

    #[test]
    fn test_off_canvas_region_not_drawn() {
        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([1, 2, 3]));
        draw_regions(&mut canvas, &[Region::new(100, 100, 10, 10)]);
        assert!(canvas.pixels().all(|p| *p == Rgb([1, 2, 3])));
    }
}
