/// Overlay glyph rasterization
///
/// Stickers and captions are drawn without a font engine so the output
/// is identical on every machine:
/// - Stickers from the editor palette are procedural shapes in a square
///   cell of `size × size` pixels
/// - Unknown sticker glyphs become a solid tile with a color derived from
///   the glyph itself
/// - Captions use a 5×7 bitmap font scaled to the cell height
///
/// All glyphs are centered on their anchor and painted opaque.

use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};

use super::compositor::DEFAULT_OVERLAY_FONT_SIZE;
use crate::state::overlay::Point;

/// Sticker palette offered by the editor
pub const STICKERS: [&str; 8] = ["❤️", "⭐", "🎉", "😊", "🎈", "✨", "🔥", "👍"];

/// Caption fill (canvas default fill style)
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Heart,
    Star,
    Party,
    Smiley,
    Balloon,
    Sparkle,
    Flame,
    Thumb,
    Tile(Rgba<u8>),
}

impl Shape {
    fn for_glyph(glyph: &str) -> Shape {
        // Emoji presentation selector does not change the sticker
        match glyph.trim_end_matches('\u{FE0F}') {
            "❤" => Shape::Heart,
            "⭐" => Shape::Star,
            "🎉" => Shape::Party,
            "😊" => Shape::Smiley,
            "🎈" => Shape::Balloon,
            "✨" => Shape::Sparkle,
            "🔥" => Shape::Flame,
            "👍" => Shape::Thumb,
            other => Shape::Tile(tile_color(other)),
        }
    }

    /// Color at normalized cell coordinates (u, v) in [-1, 1], y pointing down
    fn color_at(self, u: f32, v: f32) -> Option<Rgba<u8>> {
        match self {
            Shape::Heart => {
                let x = u * 1.25;
                let y = -v * 1.25 + 0.25;
                let a = x * x + y * y - 1.0;
                (a * a * a - x * x * y * y * y <= 0.0).then_some(Rgba([220, 20, 60, 255]))
            }
            Shape::Star => point_in_polygon(u, v, &STAR).then_some(Rgba([255, 200, 0, 255])),
            Shape::Party => {
                if !point_in_polygon(u, v, &CONE) {
                    return None;
                }
                // Diagonal stripes on the cone
                let stripe = ((u + v) * 3.0).floor() as i32;
                Some(if stripe.rem_euclid(2) == 0 {
                    Rgba([255, 215, 0, 255])
                } else {
                    Rgba([148, 0, 211, 255])
                })
            }
            Shape::Smiley => {
                if u * u + v * v > 1.0 {
                    return None;
                }
                let feature = Rgba([90, 50, 0, 255]);
                let eye = |cx: f32| (u - cx).powi(2) + (v + 0.3).powi(2) <= 0.0144;
                if eye(-0.35) || eye(0.35) {
                    return Some(feature);
                }
                let r = (u * u + v * v).sqrt();
                if v > 0.2 && (0.45..=0.6).contains(&r) {
                    return Some(feature);
                }
                Some(Rgba([255, 204, 0, 255]))
            }
            Shape::Balloon => {
                if (u / 0.75).powi(2) + ((v + 0.15) / 0.8).powi(2) <= 1.0 {
                    Some(Rgba([30, 144, 255, 255]))
                } else if u.abs() <= 0.04 && v > 0.65 {
                    Some(Rgba([128, 128, 128, 255]))
                } else {
                    None
                }
            }
            Shape::Sparkle => {
                (u.abs().sqrt() + v.abs().sqrt() <= 1.0).then_some(Rgba([255, 236, 139, 255]))
            }
            Shape::Flame => {
                let bulb = u * u + (v - 0.3).powi(2) <= 0.49;
                let tip = (-1.0..=0.3).contains(&v) && u.abs() <= 0.7 * (v + 1.0) / 1.3;
                if !(bulb || tip) {
                    return None;
                }
                let core = u * u + (v - 0.4).powi(2) <= 0.09;
                Some(if core {
                    Rgba([255, 230, 0, 255])
                } else {
                    Rgba([255, 120, 0, 255])
                })
            }
            Shape::Thumb => {
                let fist = u.abs() <= 0.8 && (-0.2..=0.9).contains(&v);
                let thumb = (-0.5..=-0.05).contains(&u) && (-0.95..=-0.2).contains(&v);
                (fist || thumb).then_some(Rgba([255, 190, 90, 255]))
            }
            Shape::Tile(color) => Some(color),
        }
    }
}

/// Five-pointed star, outer radius 1, inner radius 0.45, first point up
const STAR: [(f32, f32); 10] = [
    (0.0, -1.0),
    (0.2645, -0.3641),
    (0.9511, -0.3090),
    (0.4280, 0.1391),
    (0.5878, 0.8090),
    (0.0, 0.45),
    (-0.5878, 0.8090),
    (-0.4280, 0.1391),
    (-0.9511, -0.3090),
    (-0.2645, -0.3641),
];

/// Party cone
const CONE: [(f32, f32); 3] = [(-0.9, 0.9), (0.95, 0.6), (-0.3, -0.95)];

fn point_in_polygon(x: f32, y: f32, poly: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (xi, yi) = poly[i];
        let (xj, yj) = poly[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Stable color for a glyph we have no drawing for
fn tile_color(glyph: &str) -> Rgba<u8> {
    let digest = Sha256::digest(glyph.as_bytes());
    Rgba([digest[0], digest[1], digest[2], 255])
}

/// Color a sticker drawn at an integer `anchor` with the default overlay
/// size paints at the anchor pixel
///
/// For fractional anchors or other sizes use [`sticker_pixel_color`].
pub fn sticker_anchor_color(glyph: &str) -> Option<Rgba<u8>> {
    sticker_pixel_color(glyph, Point::new(0.0, 0.0), DEFAULT_OVERLAY_FONT_SIZE, 0, 0)
}

/// Color a sticker drawn at `anchor` in a `size × size` cell paints at
/// pixel (`px`, `py`), or `None` where it leaves the canvas untouched
pub fn sticker_pixel_color(
    glyph: &str,
    anchor: Point,
    size: u32,
    px: u32,
    py: u32,
) -> Option<Rgba<u8>> {
    let (u, v) = cell_coords(anchor, size, px as i64, py as i64)?;
    Shape::for_glyph(glyph).color_at(u, v)
}

/// Normalized cell coordinates of a pixel center, `None` outside the cell
fn cell_coords(anchor: Point, size: u32, px: i64, py: i64) -> Option<(f32, f32)> {
    let half = size.max(1) as f32 / 2.0;
    let u = (px as f32 + 0.5 - anchor.x) / half;
    let v = (py as f32 + 0.5 - anchor.y) / half;
    (u.abs() <= 1.0 && v.abs() <= 1.0).then_some((u, v))
}

/// Draw a sticker centered on `anchor` in a `size × size` cell
pub fn draw_sticker(canvas: &mut RgbaImage, anchor: Point, size: u32, glyph: &str) {
    let shape = Shape::for_glyph(glyph);
    let half = size.max(1) as f32 / 2.0;

    let x0 = (anchor.x - half).floor() as i64;
    let y0 = (anchor.y - half).floor() as i64;
    let x1 = (anchor.x + half).ceil() as i64;
    let y1 = (anchor.y + half).ceil() as i64;

    for py in y0.max(0)..y1.min(canvas.height() as i64) {
        for px in x0.max(0)..x1.min(canvas.width() as i64) {
            let Some((u, v)) = cell_coords(anchor, size, px, py) else {
                continue;
            };
            if let Some(color) = shape.color_at(u, v) {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Draw a single line of caption text centered on `anchor`
///
/// The 7-row font is scaled so a glyph is roughly `size` pixels tall
/// including its one-row leading.
pub fn draw_text(canvas: &mut RgbaImage, anchor: Point, size: u32, content: &str) {
    let scale = (size / 8).max(1) as i64;
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return;
    }

    let advance = 6 * scale;
    let width = chars.len() as i64 * advance - scale;
    let height = 7 * scale;

    // Entirely off the canvas: nothing to draw, and the anchor may be far
    // outside the range the integer math below can hold
    let (half_w, half_h) = (width as f64 / 2.0 + 1.0, height as f64 / 2.0 + 1.0);
    let (x, y) = (anchor.x as f64, anchor.y as f64);
    if x + half_w < 0.0
        || x - half_w > canvas.width() as f64
        || y + half_h < 0.0
        || y - half_h > canvas.height() as f64
    {
        return;
    }

    let left = anchor.x.round() as i64 - width / 2;
    let top = anchor.y.round() as i64 - height / 2;

    for (index, c) in chars.iter().enumerate() {
        let rows = glyph_rows(*c);
        let gx = left + index as i64 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                fill_block(
                    canvas,
                    gx + col as i64 * scale,
                    top + row as i64 * scale,
                    scale,
                    TEXT_COLOR,
                );
            }
        }
    }
}

fn fill_block(canvas: &mut RgbaImage, x: i64, y: i64, scale: i64, color: Rgba<u8>) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    for py in y.max(0)..(y + scale).min(h) {
        for px in x.max(0)..(x + scale).min(w) {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// 5×7 bitmap rows, bit 4 is the leftmost column
fn glyph_rows(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        '@' => [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E],
        // Anything else: hollow box
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn test_every_palette_sticker_covers_its_anchor() {
        for glyph in STICKERS {
            let mut canvas = blank(64, 64);
            draw_sticker(&mut canvas, Point::new(32.0, 32.0), 48, glyph);
            assert_eq!(
                Some(*canvas.get_pixel(32, 32)),
                sticker_anchor_color(glyph),
                "sticker {glyph}"
            );
        }
    }

    #[test]
    fn test_palette_anchor_colors_are_distinct() {
        let mut colors: Vec<Rgba<u8>> = STICKERS
            .iter()
            .filter_map(|g| sticker_anchor_color(g))
            .collect();
        let before = colors.len();
        colors.sort_by_key(|c| c.0);
        colors.dedup();
        assert_eq!(before, STICKERS.len());
        assert_eq!(colors.len(), before);
    }

    #[test]
    fn test_presentation_selector_is_ignored() {
        assert_eq!(sticker_anchor_color("❤️"), sticker_anchor_color("❤"));
    }

    #[test]
    fn test_unknown_glyph_tile_is_stable() {
        let a = sticker_anchor_color("🦄");
        assert_eq!(a, sticker_anchor_color("🦄"));
        assert_ne!(a, sticker_anchor_color("🐙"));
    }

    #[test]
    fn test_sticker_is_clipped_at_canvas_edge() {
        let mut canvas = blank(20, 20);
        draw_sticker(&mut canvas, Point::new(0.0, 0.0), 48, "🦄");
        // Tile covers the visible quarter, no panic on negative coordinates
        let tile = sticker_anchor_color("🦄").unwrap();
        assert_eq!(canvas.get_pixel(0, 0), &tile);
        assert_eq!(canvas.get_pixel(19, 19), &tile);
    }

    #[test]
    fn test_text_is_drawn_around_anchor() {
        let mut canvas = blank(200, 80);
        draw_text(&mut canvas, Point::new(100.0, 40.0), 48, "HI");
        let inked = canvas.pixels().filter(|p| **p == TEXT_COLOR).count();
        assert!(inked > 0);

        // "H" left stem starts at the left edge of the text box
        let scale = 6;
        let width = 2 * 6 * scale - scale;
        let left = 100 - width / 2;
        let top = 40 - 7 * scale / 2;
        assert_eq!(canvas.get_pixel(left as u32, top as u32), &TEXT_COLOR);
        assert_eq!(canvas.get_pixel((left - 1) as u32, top as u32), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_text_far_off_canvas_draws_nothing() {
        for anchor in [
            Point::new(-1.0e30, 5.0),
            Point::new(5.0, 1.0e30),
            Point::new(f32::MAX, f32::MIN),
            Point::new(-300.0, 10.0),
        ] {
            let mut canvas = blank(32, 32);
            draw_text(&mut canvas, anchor, 48, "Hello");
            assert_eq!(canvas, blank(32, 32), "anchor {:?}", anchor);
        }
    }

    #[test]
    fn test_text_partly_off_canvas_is_clipped() {
        let mut canvas = blank(32, 32);
        draw_text(&mut canvas, Point::new(0.0, 16.0), 48, "HH");
        assert!(canvas.pixels().any(|p| *p == TEXT_COLOR));
    }

    #[test]
    fn test_pixel_color_matches_drawing_at_fractional_anchor() {
        let anchor = Point::new(32.7, 32.2);
        for glyph in STICKERS {
            let mut canvas = blank(64, 64);
            draw_sticker(&mut canvas, anchor, 48, glyph);
            for (px, py) in [(32, 32), (20, 41), (50, 15)] {
                let expected = sticker_pixel_color(glyph, anchor, 48, px, py)
                    .unwrap_or(Rgba([255, 255, 255, 255]));
                assert_eq!(*canvas.get_pixel(px, py), expected, "{glyph} at ({px}, {py})");
            }
        }
        // Outside the cell nothing is painted
        assert_eq!(sticker_pixel_color("🦄", anchor, 48, 0, 0), None);
    }

    #[test]
    fn test_lowercase_uses_uppercase_glyphs() {
        assert_eq!(glyph_rows('a'), glyph_rows('A'));
        assert_eq!(glyph_rows('é'), glyph_rows('\u{1}'));
    }
}
