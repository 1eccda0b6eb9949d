/// Caption lettering
///
/// Captions are drawn with an embedded 5x7 bitmap font, scaled up to the
/// layout's caption size and sheared to the right so the text leans like
/// handwriting. Characters outside printable ASCII render as '?'.

use image::{Rgb, RgbImage};

/// Caption ink (#202020)
pub const INK: Rgb<u8> = Rgb([0x20, 0x20, 0x20]);

/// Horizontal lean per unit of height
const SLANT: f32 = 0.25;

/// Glyph cell height relative to the nominal font size
const CAP_HEIGHT: f32 = 0.7;

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Glyph width plus one column of spacing
const ADVANCE: u32 = GLYPH_W + 1;

/// Rows of each glyph, bit 4 = leftmost pixel. Indexed by `ch - ' '`.
static GLYPHS: [[u8; 7]; 95] = [
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000], // ' '
    [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100], // !
    [0b01010, 0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000], // "
    [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010], // #
    [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100], // $
    [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011], // %
    [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101], // &
    [0b01100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000], // '
    [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010], // (
    [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000], // )
    [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000], // *
    [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000], // +
    [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000], // ,
    [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000], // -
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100], // .
    [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000], // /
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110], // 0
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111], // 2
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110], // 3
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110], // 5
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000], // 7
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100], // 9
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000], // :
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000], // ;
    [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010], // <
    [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000], // =
    [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000], // >
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100], // ?
    [0b01110, 0b10001, 0b00001, 0b01101, 0b10101, 0b10101, 0b01110], // @
    [0b01110, 0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001], // A
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110], // B
    [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110], // C
    [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100], // D
    [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111], // E
    [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000], // F
    [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111], // G
    [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001], // H
    [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // I
    [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100], // J
    [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001], // K
    [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111], // L
    [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001], // M
    [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001], // N
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // O
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000], // P
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101], // Q
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001], // R
    [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110], // S
    [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100], // T
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // U
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // V
    [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010], // W
    [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001], // X
    [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100], // Y
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111], // Z
    [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110], // [
    [0b00000, 0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b00000], // \
    [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110], // ]
    [0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000, 0b00000], // ^
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111], // _
    [0b01000, 0b00100, 0b00010, 0b00000, 0b00000, 0b00000, 0b00000], // `
    [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111], // a
    [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b11110], // b
    [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110], // c
    [0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10001, 0b01111], // d
    [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110], // e
    [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000], // f
    [0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110], // g
    [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001], // h
    [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110], // i
    [0b00010, 0b00000, 0b00110, 0b00010, 0b00010, 0b10010, 0b01100], // j
    [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010], // k
    [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // l
    [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001], // m
    [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001], // n
    [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // o
    [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000], // p
    [0b00000, 0b00000, 0b01101, 0b10011, 0b01111, 0b00001, 0b00001], // q
    [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000], // r
    [0b00000, 0b00000, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110], // s
    [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110], // t
    [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101], // u
    [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // v
    [0b00000, 0b00000, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010], // w
    [0b00000, 0b00000, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001], // x
    [0b00000, 0b00000, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110], // y
    [0b00000, 0b00000, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111], // z
    [0b00010, 0b00100, 0b00100, 0b01000, 0b00100, 0b00100, 0b00010], // {
    [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100], // |
    [0b01000, 0b00100, 0b00100, 0b00010, 0b00100, 0b00100, 0b01000], // }
    [0b00000, 0b00000, 0b01000, 0b10101, 0b00010, 0b00000, 0b00000], // ~
];

/// Bitmap rows for `ch`
pub fn glyph(ch: char) -> &'static [u8; 7] {
    let index = match ch {
        ' '..='~' => ch as usize - ' ' as usize,
        _ => '?' as usize - ' ' as usize,
    };
    &GLYPHS[index]
}

/// Pixel size of one glyph cell for a nominal font size
pub fn cell_size(font_px: u32) -> f32 {
    font_px as f32 * CAP_HEIGHT / GLYPH_H as f32
}

/// Rendered width of `text` (including lean) at the given cell size
pub fn text_width(text: &str, cell: f32) -> f32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0.0;
    }
    let columns = count * ADVANCE - 1;
    columns as f32 * cell + GLYPH_H as f32 * cell * SLANT
}

/// Draw `text` centered on (`center_x`, `center_y`).
///
/// # Arguments
/// * `canvas` - Target surface
/// * `text` - Caption; empty strings draw nothing
/// * `font_px` - Nominal caption size from the layout
/// * `max_width` - The text is scaled down until it fits this width
///
/// # Returns
/// The cell size actually used (0.0 when nothing was drawn)
pub fn draw_caption(
    canvas: &mut RgbImage,
    text: &str,
    center_x: f32,
    center_y: f32,
    font_px: u32,
    max_width: f32,
) -> f32 {
    if text.is_empty() {
        return 0.0;
    }

    let mut cell = cell_size(font_px);
    let nominal_width = text_width(text, cell);
    if nominal_width > max_width && nominal_width > 0.0 {
        cell *= max_width / nominal_width;
    }

    let width = text_width(text, cell);
    let left = center_x - width / 2.0;
    let top = center_y - GLYPH_H as f32 * cell / 2.0;

    for (i, ch) in text.chars().enumerate() {
        let origin_x = left + (i as u32 * ADVANCE) as f32 * cell;
        draw_glyph(canvas, glyph(ch), origin_x, top, cell);
    }
    cell
}

fn draw_glyph(canvas: &mut RgbImage, rows: &[u8; 7], x: f32, y: f32, cell: f32) {
    for (ry, bits) in rows.iter().enumerate() {
        // lower rows lean less, so the glyph tilts right
        let lean = (GLYPH_H as usize - ry) as f32 * cell * SLANT;
        for rx in 0..GLYPH_W {
            if bits & (1 << (GLYPH_W - 1 - rx)) != 0 {
                let x0 = x + lean + rx as f32 * cell;
                let y0 = y + ry as f32 * cell;
                fill_rect(canvas, x0, y0, x0 + cell, y0 + cell, INK);
            }
        }
    }
}

/// Fill the pixels whose centers lie inside the rectangle, clipped to the canvas
fn fill_rect(canvas: &mut RgbImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    let clamp = |v: f32, max: u32| (v.round().max(0.0) as u32).min(max);
    let (px0, px1) = (clamp(x0, w), clamp(x1, w));
    let (py0, py1) = (clamp(y0, h), clamp(y1, h));
    for py in py0..py1 {
        for px in px0..px1 {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: Rgb<u8> = Rgb([0xf8, 0xf8, 0xf8]);

    fn ink_columns(canvas: &RgbImage) -> Option<(u32, u32)> {
        let cols: Vec<u32> = (0..canvas.width())
            .filter(|&x| (0..canvas.height()).any(|y| *canvas.get_pixel(x, y) == INK))
            .collect();
        Some((*cols.first()?, *cols.last()?))
    }

    #[test]
    fn test_unknown_characters_fall_back() {
        assert_eq!(glyph('é'), glyph('?'));
        assert_eq!(glyph('\n'), glyph('?'));
        assert_ne!(glyph('A'), glyph('?'));
        assert_eq!(glyph(' '), &[0; 7]);
    }

    #[test]
    fn test_empty_caption_draws_nothing() {
        let mut canvas = RgbImage::from_pixel(100, 40, PAPER);
        assert_eq!(draw_caption(&mut canvas, "", 50.0, 20.0, 20, 100.0), 0.0);
        assert!(canvas.pixels().all(|p| *p == PAPER));
    }

    #[test]
    fn test_caption_is_centered() {
        let mut canvas = RgbImage::from_pixel(400, 100, PAPER);
        draw_caption(&mut canvas, "HI", 200.0, 50.0, 40, 400.0);
        let (first, last) = ink_columns(&canvas).unwrap();
        let mid = (first + last) as f32 / 2.0;
        assert!((mid - 200.0).abs() < 6.0, "ink spans {first}..{last}");
    }

    #[test]
    fn test_long_caption_shrinks_to_fit() {
        let text = "a very long caption that would overflow!";
        let mut canvas = RgbImage::from_pixel(880, 200, PAPER);
        let cell = draw_caption(&mut canvas, text, 440.0, 100.0, 60, 790.0);
        assert!(cell < cell_size(60));
        let (first, last) = ink_columns(&canvas).unwrap();
        assert!(first >= 44 && last <= 836, "ink spans {first}..{last}");
    }
}
