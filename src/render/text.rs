use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::RgbaImage;

use super::blend_pixel;
use crate::error::{VidError, VidResult};

pub const HEADING_FONT_SIZE: f32 = 70.0;
pub const HEADING_STROKE_WIDTH: i32 = 2;

/// Bold sans-serif used when the requested font does not resolve to a file.
pub const FALLBACK_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

pub struct HeadingStyle {
    pub font_size: f32,
    pub fill: [u8; 3],
    pub stroke: [u8; 3],
    pub stroke_width: i32,
}

/// The caller's font field is honored when it names a readable font file;
/// otherwise the fixed fallback is used.
pub fn resolve_font_path(requested: &str, fallback: &Path) -> PathBuf {
    let candidate = Path::new(requested);
    if candidate.is_file() {
        candidate.to_path_buf()
    } else {
        fallback.to_path_buf()
    }
}

pub fn load_font(path: &Path) -> VidResult<Font> {
    let bytes = std::fs::read(path)
        .map_err(|e| VidError::render(format!("failed to read font {}: {}", path.display(), e)))?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| VidError::render(format!("failed to parse font {}: {}", path.display(), e)))
}

/// Rasterize the heading with an outline onto a transparent canvas of the
/// target size. Produced once per run and reused for the whole duration.
///
/// The outline is drawn by repeating the text at every integer offset
/// within the stroke-width box, then the fill goes on top at the unshifted
/// centered position. O(stroke²) draws, but stroke width is small and this
/// runs once, not per frame.
pub fn render_heading(
    text: &str,
    font: &Font,
    style: &HeadingStyle,
    width: u32,
    height: u32,
) -> VidResult<RgbaImage> {
    if text.is_empty() {
        return Err(VidError::validation("heading text is required"));
    }

    let mut canvas = RgbaImage::new(width, height);
    let text_w = measure_width(font, text, style.font_size);
    let (x, y) = centered_origin(text_w, style.font_size as i32, width, height);

    let sw = style.stroke_width;
    for dx in -sw..=sw {
        for dy in -sw..=sw {
            draw_text(&mut canvas, font, text, style.font_size, x + dx, y + dy, style.stroke);
        }
    }
    draw_text(&mut canvas, font, text, style.font_size, x, y, style.fill);

    Ok(canvas)
}

pub fn measure_width(font: &Font, text: &str, font_size: f32) -> i32 {
    let mut width = 0.0f32;
    for ch in text.chars() {
        let (metrics, _) = font.rasterize(ch, font_size);
        width += metrics.advance_width;
    }
    width.ceil() as i32
}

fn centered_origin(text_w: i32, text_h: i32, width: u32, height: u32) -> (i32, i32) {
    ((width as i32 - text_w) / 2, (height as i32 - text_h) / 2)
}

fn draw_text(
    canvas: &mut RgbaImage,
    font: &Font,
    text: &str,
    font_size: f32,
    x: i32,
    y: i32,
    color: [u8; 3],
) {
    let (width, height) = canvas.dimensions();
    let mut cursor_x = x;

    for ch in text.chars() {
        let (metrics, bitmap) = font.rasterize(ch, font_size);
        let glyph_y = y + font_size as i32 - metrics.height as i32 - metrics.ymin;

        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                let coverage = bitmap[gy * metrics.width + gx];
                if coverage == 0 {
                    continue;
                }

                let px = cursor_x + gx as i32;
                let py = glyph_y + gy as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                    continue;
                }

                let dst = canvas.get_pixel_mut(px as u32, py as u32);
                blend_pixel(dst, color, coverage);
            }
        }

        cursor_x += metrics.advance_width as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Any locally available bold sans font; tests needing real glyph
    /// rasterization skip when none is installed.
    fn test_font() -> Option<Font> {
        let candidates = [
            FALLBACK_FONT_PATH,
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        ];
        candidates
            .iter()
            .find_map(|p| load_font(Path::new(p)).ok())
    }

    fn style() -> HeadingStyle {
        HeadingStyle {
            font_size: HEADING_FONT_SIZE,
            fill: [255, 255, 255],
            stroke: [0, 0, 0],
            stroke_width: HEADING_STROKE_WIDTH,
        }
    }

    #[test]
    fn empty_heading_is_a_validation_error() {
        let Some(font) = test_font() else { return };
        let err = render_heading("", &font, &style(), 320, 240).unwrap_err();
        assert!(matches!(err, VidError::Validation(_)));
    }

    #[test]
    fn rendering_is_idempotent() {
        let Some(font) = test_font() else { return };
        let a = render_heading("Halo", &font, &style(), 320, 240).unwrap();
        let b = render_heading("Halo", &font, &style(), 320, 240).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn canvas_matches_requested_size_and_has_ink() {
        let Some(font) = test_font() else { return };
        let img = render_heading("Halo", &font, &style(), 320, 240).unwrap();
        assert_eq!(img.dimensions(), (320, 240));
        assert!(img.pixels().any(|p| p[3] > 0));
        // Corners stay transparent for a short centered heading.
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn centered_origin_centers_both_axes() {
        assert_eq!(centered_origin(100, 70, 300, 270), (100, 100));
        // Text wider than the canvas pushes the origin negative.
        assert_eq!(centered_origin(400, 70, 300, 270), (-50, 100));
    }

    #[test]
    fn unknown_font_name_falls_back() {
        let resolved = resolve_font_path("Arial", Path::new(FALLBACK_FONT_PATH));
        assert_eq!(resolved, PathBuf::from(FALLBACK_FONT_PATH));
    }
}
