//! Text rendering backends for overlays and labels.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;
use std::path::Path;

/// Measures and draws short strings.
///
/// `measure` must report the box `draw_mut` fills when drawing at the same
/// height, so callers can center text on its rendered extent.
pub trait TextRenderer {
    /// `(width, height)` in pixels of `text` drawn `height` pixels tall.
    fn measure(&self, text: &str, height: f32) -> (u32, u32);

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw_mut(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, height: f32, color: Rgb<u8>);
}

impl<T: TextRenderer + ?Sized> TextRenderer for &T {
    fn measure(&self, text: &str, height: f32) -> (u32, u32) {
        (**self).measure(text, height)
    }

    fn draw_mut(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, height: f32, color: Rgb<u8>) {
        (**self).draw_mut(canvas, text, x, y, height, color)
    }
}

impl<T: TextRenderer + ?Sized> TextRenderer for Box<T> {
    fn measure(&self, text: &str, height: f32) -> (u32, u32) {
        (**self).measure(text, height)
    }

    fn draw_mut(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, height: f32, color: Rgb<u8>) {
        (**self).draw_mut(canvas, text, x, y, height, color)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("font data could not be parsed")]
    Invalid,
}

/// TrueType/OpenType rendering through `ab_glyph`.
pub struct FontRenderer {
    font: FontVec,
}

impl FontRenderer {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let font = FontVec::try_from_vec(data).map_err(|_| FontError::Invalid)?;
        Ok(Self { font })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let renderer = Self::from_bytes(std::fs::read(path)?)?;
        log::debug!("loaded font {}", path.display());
        Ok(renderer)
    }
}

impl TextRenderer for FontRenderer {
    fn measure(&self, text: &str, height: f32) -> (u32, u32) {
        let (w, h) = text_size(PxScale::from(height), &self.font, text);
        (w as u32, h as u32)
    }

    fn draw_mut(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, height: f32, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, PxScale::from(height), &self.font, text);
    }
}

/// A glyph of the built-in font: polylines in a box `width` wide and 1 tall,
/// y pointing down.
struct Glyph {
    width: f32,
    strokes: &'static [&'static [(f32, f32)]],
}

const DIGIT_W: f32 = 0.6;

fn glyph(c: char) -> Glyph {
    let strokes: &'static [&'static [(f32, f32)]] = match c {
        '0' => &[&[(0.0, 0.0), (0.6, 0.0), (0.6, 1.0), (0.0, 1.0), (0.0, 0.0)]],
        '1' => &[&[(0.1, 0.2), (0.3, 0.0), (0.3, 1.0)]],
        '2' => &[&[(0.0, 0.0), (0.6, 0.0), (0.6, 0.5), (0.0, 0.5), (0.0, 1.0), (0.6, 1.0)]],
        '3' => &[
            &[(0.0, 0.0), (0.6, 0.0), (0.6, 1.0), (0.0, 1.0)],
            &[(0.0, 0.5), (0.6, 0.5)],
        ],
        '4' => &[&[(0.0, 0.0), (0.0, 0.5), (0.6, 0.5)], &[(0.6, 0.0), (0.6, 1.0)]],
        '5' => &[&[(0.6, 0.0), (0.0, 0.0), (0.0, 0.5), (0.6, 0.5), (0.6, 1.0), (0.0, 1.0)]],
        '6' => &[&[(0.6, 0.0), (0.0, 0.0), (0.0, 1.0), (0.6, 1.0), (0.6, 0.5), (0.0, 0.5)]],
        '7' => &[&[(0.0, 0.0), (0.6, 0.0), (0.6, 1.0)]],
        '8' => &[
            &[(0.0, 0.0), (0.6, 0.0), (0.6, 1.0), (0.0, 1.0), (0.0, 0.0)],
            &[(0.0, 0.5), (0.6, 0.5)],
        ],
        '9' => &[&[(0.6, 0.5), (0.0, 0.5), (0.0, 0.0), (0.6, 0.0), (0.6, 1.0), (0.0, 1.0)]],
        '.' => &[&[(0.0, 1.0)]],
        ':' => &[&[(0.0, 0.35)], &[(0.0, 0.85)]],
        '-' => &[&[(0.0, 0.5), (0.6, 0.5)]],
        's' => &[&[(0.5, 0.4), (0.0, 0.4), (0.0, 0.7), (0.5, 0.7), (0.5, 1.0), (0.0, 1.0)]],
        'm' => &[
            &[(0.0, 1.0), (0.0, 0.4), (0.6, 0.4), (0.6, 1.0)],
            &[(0.3, 0.4), (0.3, 1.0)],
        ],
        _ => &[],
    };
    let width = match c {
        '.' | ':' => 0.0,
        's' => 0.5,
        _ => DIGIT_W,
    };
    Glyph { width, strokes }
}

/// Built-in segment font: digits, `.`, `:`, `-`, `s`, `m` and space.
/// Other characters advance like a digit but draw nothing.
#[derive(Clone, Copy, Debug)]
pub struct StrokeFont {
    /// Stroke thickness as a fraction of the text height.
    pub weight: f32,
}

impl Default for StrokeFont {
    fn default() -> Self {
        Self { weight: 0.14 }
    }
}

struct Layout {
    thickness: f32,
    scale: f32,
    gap: f32,
}

impl StrokeFont {
    fn layout(&self, height: f32) -> Layout {
        let height = height.max(1.0);
        let thickness = (height * self.weight).clamp(1.0, height);
        let scale = (height - thickness).max(0.0);
        Layout {
            thickness,
            scale,
            gap: 0.25 * scale,
        }
    }

    fn width(&self, text: &str, l: &Layout) -> f32 {
        let n = text.chars().count();
        if n == 0 {
            return 0.0;
        }
        let glyphs: f32 = text
            .chars()
            .map(|c| glyph(c).width * l.scale + l.thickness)
            .sum();
        glyphs + l.gap * (n - 1) as f32
    }
}

fn thick_segment(canvas: &mut RgbImage, a: (f32, f32), b: (f32, f32), thickness: f32, color: Rgb<u8>) {
    let r = thickness / 2.0;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    if len > 0.0 && r >= 1.0 {
        let (nx, ny) = (-dy / len * r, dx / len * r);
        let pts = [
            Point::new((a.0 + nx).round() as i32, (a.1 + ny).round() as i32),
            Point::new((b.0 + nx).round() as i32, (b.1 + ny).round() as i32),
            Point::new((b.0 - nx).round() as i32, (b.1 - ny).round() as i32),
            Point::new((a.0 - nx).round() as i32, (a.1 - ny).round() as i32),
        ];
        if pts[0] != pts[3] {
            draw_polygon_mut(canvas, &pts, color);
        }
    } else if len > 0.0 {
        draw_line_segment_mut(canvas, a, b, color);
    }

    let rr = (r - 0.5).round().max(0.0) as i32;
    for p in [a, b] {
        draw_filled_circle_mut(canvas, (p.0.round() as i32, p.1.round() as i32), rr, color);
    }
}

impl TextRenderer for StrokeFont {
    fn measure(&self, text: &str, height: f32) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }
        let l = self.layout(height);
        (self.width(text, &l).ceil() as u32, height.max(1.0).ceil() as u32)
    }

    fn draw_mut(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, height: f32, color: Rgb<u8>) {
        let l = self.layout(height);
        let half = l.thickness / 2.0;
        let mut pen = x as f32;
        for c in text.chars() {
            let g = glyph(c);
            for stroke in g.strokes {
                let to_px = |(gx, gy): (f32, f32)| (pen + half + gx * l.scale, y as f32 + half + gy * l.scale);
                match stroke {
                    [single] => thick_segment(canvas, to_px(*single), to_px(*single), l.thickness, color),
                    _ => {
                        for pair in stroke.windows(2) {
                            thick_segment(canvas, to_px(pair[0]), to_px(pair[1]), l.thickness, color);
                        }
                    }
                }
            }
            pen += g.width * l.scale + l.thickness + l.gap;
        }
    }
}
