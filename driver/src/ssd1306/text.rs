//! Glyph rasterizer: turns characters into framebuffer pixel writes.

use crate::font::GlyphSource;
use crate::{OledError, OledResult};

use super::framebuffer::Framebuffer;

/// Draws a single character with its top-left corner at `(x, y)`.
///
/// The origin has to be on screen; pixels falling past the display edge
/// are clipped silently.
///
/// # Errors
/// - `OledError::OutOfRange` when the origin lies outside the resolution.
/// - `OledError::InvalidArgument` when the source has no glyph for `c`.
pub(crate) fn draw_char(
    fb: &mut Framebuffer,
    glyphs: &dyn GlyphSource,
    x: usize,
    y: usize,
    c: u8,
) -> OledResult<()> {
    if x >= fb.width() || y >= fb.height() {
        return Err(OledError::OutOfRange);
    }

    let glyph = match glyphs.glyph(c) {
        Some(glyph) => glyph,
        None => return Err(OledError::InvalidArgument),
    };

    for (row, &bits) in glyph.iter().enumerate() {
        for col in 0..glyphs.glyph_width() {
            if bits & (0x80 >> col) != 0 {
                // Off the edge is allowed; the character just clips.
                let _ = fb.draw_pixel(x + col, y + row);
            }
        }
    }

    Ok(())
}

/// Renders a string with its top-left corner at `(x, y)`, one glyph cell
/// (glyph width plus a blank column) per character.
///
/// The whole string has to fit: the check runs up front and nothing is
/// drawn when it fails, unlike the per-pixel clipping of [draw_char].
/// A character that still fails to draw does not stop the rest of the
/// string; the first failure is returned once rendering is complete.
///
/// # Errors
/// - `OledError::OutOfBounds` when the string's rendered width does not
///   fit between `x` and the display edge, or the glyph height does not
///   fit below `y`.
pub(crate) fn draw_str(
    fb: &mut Framebuffer,
    glyphs: &dyn GlyphSource,
    x: usize,
    y: usize,
    text: &[u8],
) -> OledResult<()> {
    let pitch = glyphs.glyph_width() + 1;

    if y + glyphs.glyph_height() > fb.height() {
        return Err(OledError::OutOfBounds);
    }
    if x + text.len() * pitch > fb.width() {
        return Err(OledError::OutOfBounds);
    }

    let mut first_failure = Ok(());
    for (index, &c) in text.iter().enumerate() {
        let result = draw_char(fb, glyphs, x + index * pitch, y, c);
        if first_failure.is_ok() {
            first_failure = result;
        }
    }

    first_failure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Font8x8;

    fn lit_pixels(fb: &Framebuffer) -> usize {
        fb.bytes()[1..]
            .iter()
            .map(|cell| cell.count_ones() as usize)
            .sum()
    }

    fn pixel(fb: &Framebuffer, x: usize, y: usize) -> bool {
        let cell = 1 + (y / 8) * fb.width() + x;
        fb.bytes()[cell] & (1 << (y % 8)) != 0
    }

    #[test]
    fn draw_char_rasterizes_the_glyph_rows() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        draw_char(&mut fb, &Font8x8, 0, 0, b'|').unwrap();

        // '|' is a two-pixel-wide column: 0x18 on rows 0..=6, blank last row.
        for y in 0..7 {
            assert!(pixel(&fb, 3, y));
            assert!(pixel(&fb, 4, y));
            assert!(!pixel(&fb, 2, y));
            assert!(!pixel(&fb, 5, y));
        }
        assert!(!pixel(&fb, 3, 7));
        assert_eq!(lit_pixels(&fb), 14);
    }

    #[test]
    fn draw_char_clips_at_the_display_edge() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        draw_char(&mut fb, &Font8x8, 126, 60, b'#').unwrap();

        // Only the 2x4 corner that fits may light up.
        assert!(lit_pixels(&fb) <= 8);
        for x in 126..128 {
            for y in 60..64 {
                let expected = Font8x8.glyph(b'#').unwrap()[y - 60] & (0x80 >> (x - 126)) != 0;
                assert_eq!(pixel(&fb, x, y), expected);
            }
        }
    }

    #[test]
    fn draw_char_rejects_an_off_screen_origin() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        assert_eq!(
            draw_char(&mut fb, &Font8x8, 128, 0, b'a'),
            Err(OledError::OutOfRange)
        );
        assert_eq!(
            draw_char(&mut fb, &Font8x8, 0, 64, b'a'),
            Err(OledError::OutOfRange)
        );
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn draw_char_reports_missing_glyphs() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        assert_eq!(
            draw_char(&mut fb, &Font8x8, 0, 0, 0x7F),
            Err(OledError::InvalidArgument)
        );
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn draw_str_accepts_an_exact_fit_and_rejects_one_more() {
        let mut fb = Framebuffer::new(128, 64).unwrap();

        // 14 cells of 9 pixels = 126 <= 128.
        let exact = [b'-'; 14];
        draw_str(&mut fb, &Font8x8, 0, 0, &exact).unwrap();

        let mut fb = Framebuffer::new(128, 64).unwrap();
        let too_many = [b'-'; 15];
        assert_eq!(
            draw_str(&mut fb, &Font8x8, 0, 0, &too_many),
            Err(OledError::OutOfBounds)
        );
        assert_eq!(lit_pixels(&fb), 0);

        // The same string fails once x leaves too little room.
        assert_eq!(
            draw_str(&mut fb, &Font8x8, 3, 0, &exact),
            Err(OledError::OutOfBounds)
        );
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn draw_str_rejects_a_baseline_past_the_bottom() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        draw_str(&mut fb, &Font8x8, 0, 56, b"ok").unwrap();
        assert_eq!(
            draw_str(&mut fb, &Font8x8, 0, 57, b"ok"),
            Err(OledError::OutOfBounds)
        );
    }

    #[test]
    fn draw_str_keeps_going_after_a_bad_character() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        let result = draw_str(&mut fb, &Font8x8, 0, 0, &[b'A', 0x7F, b'B']);
        assert_eq!(result, Err(OledError::InvalidArgument));

        // 'B' still landed at the third cell.
        let mut reference = Framebuffer::new(128, 64).unwrap();
        draw_char(&mut reference, &Font8x8, 0, 0, b'A').unwrap();
        draw_char(&mut reference, &Font8x8, 18, 0, b'B').unwrap();
        assert_eq!(fb, reference);
    }
}
