use crate::{OverlayError, OverlayStyle, TextRenderer};
use image::{Rgb, RgbImage};
use sudoku_lens_core::{Grid, Symbol, SymbolGrid};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Render solved symbols onto a black `width × height` canvas aligned with
/// the rectified board.
///
/// Only cells that are blank in `puzzle` are drawn; each symbol is centered
/// in its cell on the renderer's measured text box.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(solved, puzzle, renderer, style))
)]
pub fn compose_overlay<R>(
    width: u32,
    height: u32,
    solved: &Grid<Symbol>,
    puzzle: &SymbolGrid,
    renderer: &R,
    style: &OverlayStyle,
) -> Result<RgbImage, OverlayError>
where
    R: TextRenderer + ?Sized,
{
    if solved.order() != puzzle.order() {
        return Err(OverlayError::OrderMismatch {
            solved: solved.order(),
            puzzle: puzzle.order(),
        });
    }

    let mut canvas = RgbImage::new(width, height);
    let n = solved.order().get() as u32;
    let cw = width / n;
    let ch = height / n;
    if cw == 0 || ch == 0 {
        return Ok(canvas);
    }

    let text_h = style.height_frac * cw.min(ch) as f32;
    let color = Rgb(style.color);
    let mut drawn = 0usize;

    for ((row, col), symbol) in solved.iter() {
        if puzzle[(row, col)].is_some() {
            continue;
        }
        let text = symbol.to_string();
        let (tw, th) = renderer.measure(&text, text_h);
        let cx = col as i32 * cw as i32 + cw as i32 / 2;
        let cy = row as i32 * ch as i32 + ch as i32 / 2;
        let x = cx - tw as i32 / 2;
        let y = cy - th as i32 / 2;
        renderer.draw_mut(&mut canvas, &text, x, y, text_h, color);
        drawn += 1;
    }

    log::debug!("overlay: drew {drawn} solved symbols on {width}x{height}");
    Ok(canvas)
}

/// Copy every non-black pixel of `overlay` onto a copy of `base`.
pub fn paint_over(base: &RgbImage, overlay: &RgbImage) -> Result<RgbImage, OverlayError> {
    if base.dimensions() != overlay.dimensions() {
        return Err(OverlayError::SizeMismatch {
            expected: base.dimensions(),
            got: overlay.dimensions(),
        });
    }
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        if src.0 != [0, 0, 0] {
            *dst = *src;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrokeFont;
    use sudoku_lens_core::GridOrder;

    fn ink_in(img: &RgbImage, x0: u32, y0: u32, w: u32) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in y0..y0 + w {
            for x in x0..x0 + w {
                if img.get_pixel(x, y).0 != [0, 0, 0] {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn draws_only_originally_blank_cells_centered() {
        let order = GridOrder::SUDOKU;
        let solved = Grid::from_fn(order, |row, col| {
            let v = if (row, col) == (0, 0) { 5 } else { 3 };
            Symbol::new(v, order).unwrap()
        });
        let puzzle = Grid::from_fn(order, |row, col| {
            if (row, col) == (0, 0) {
                None
            } else {
                Some(Symbol::new(3, order).unwrap())
            }
        });

        let overlay = compose_overlay(450, 450, &solved, &puzzle, &StrokeFont::default(), &OverlayStyle::default())
            .unwrap();
        assert_eq!(overlay.dimensions(), (450, 450));

        let five = ink_in(&overlay, 0, 0, 50);
        assert!(!five.is_empty());
        let (sx, sy) = five
            .iter()
            .fold((0u64, 0u64), |(ax, ay), &(x, y)| (ax + x as u64, ay + y as u64));
        let mx = sx as f32 / five.len() as f32;
        let my = sy as f32 / five.len() as f32;
        assert!((mx - 25.0).abs() < 5.0 && (my - 25.0).abs() < 5.0, "ink centroid ({mx}, {my})");

        assert!(ink_in(&overlay, 50, 0, 50).is_empty());
        assert!(overlay
            .enumerate_pixels()
            .all(|(x, y, p)| p.0 == [0, 0, 0] || (x < 50 && y < 50)));
    }

    #[test]
    fn symbol_color_comes_from_style() {
        let order = GridOrder::new(2).unwrap();
        let solved = Grid::from_fn(order, |_, _| Symbol::new(1, order).unwrap());
        let puzzle = Grid::from_fn(order, |_, _| None);
        let style = OverlayStyle {
            color: [0, 200, 0],
            ..OverlayStyle::default()
        };

        let overlay = compose_overlay(100, 100, &solved, &puzzle, &StrokeFont::default(), &style).unwrap();
        let colors: std::collections::HashSet<[u8; 3]> = overlay.pixels().map(|p| p.0).collect();
        assert!(colors.contains(&[0, 200, 0]));
        assert!(colors.iter().all(|c| *c == [0, 0, 0] || *c == [0, 200, 0]));
        for (x0, y0) in [(0, 0), (50, 0), (0, 50), (50, 50)] {
            assert!(!ink_in(&overlay, x0, y0, 50).is_empty());
        }
    }

    #[test]
    fn painting_keeps_base_under_black() {
        let base = RgbImage::from_pixel(4, 4, Rgb([250, 250, 250]));
        let mut overlay = RgbImage::new(4, 4);
        overlay.put_pixel(1, 2, Rgb([255, 0, 0]));

        let out = paint_over(&base, &overlay).unwrap();
        assert_eq!(out.get_pixel(1, 2), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(0, 0), &Rgb([250, 250, 250]));
        assert!(matches!(
            paint_over(&base, &RgbImage::new(3, 4)),
            Err(OverlayError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn order_mismatch_is_an_error() {
        let solved = Grid::from_fn(GridOrder::new(4).unwrap(), |_, _| {
            Symbol::new(1, GridOrder::new(4).unwrap()).unwrap()
        });
        let puzzle = Grid::from_fn(GridOrder::SUDOKU, |_, _| None);
        assert!(matches!(
            compose_overlay(90, 90, &solved, &puzzle, &StrokeFont::default(), &OverlayStyle::default()),
            Err(OverlayError::OrderMismatch { .. })
        ));
    }
}
