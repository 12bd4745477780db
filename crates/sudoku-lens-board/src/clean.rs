//! Per-cell cleaning: decide whether a cell holds a symbol and normalize it
//! for the classifier.

use crate::CleanerParams;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashSet;
use sudoku_lens_core::Grid;

/// A partitioned cell after cleaning.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// Normalized image handed to the classifier.
    Content(GrayImage),
    Blank,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }

    pub fn image(&self) -> Option<&GrayImage> {
        match self {
            Cell::Content(img) => Some(img),
            Cell::Blank => None,
        }
    }
}

/// Output of a single [`CellCleaner::clean`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanedCell {
    pub image: GrayImage,
    pub has_content: bool,
}

impl CleanedCell {
    pub fn blank(image: GrayImage) -> Self {
        Self {
            image,
            has_content: false,
        }
    }
}

/// Pure per-cell operation; closures `Fn(&GrayImage) -> CleanedCell` qualify.
pub trait CellCleaner {
    fn clean(&self, cell: &GrayImage) -> CleanedCell;
}

impl<F> CellCleaner for F
where
    F: Fn(&GrayImage) -> CleanedCell,
{
    fn clean(&self, cell: &GrayImage) -> CleanedCell {
        self(cell)
    }
}

/// Apply `cleaner` to every cell; cells without content become [`Cell::Blank`].
pub fn clean_cells<C>(cells: &Grid<GrayImage>, cleaner: &C) -> Grid<Cell>
where
    C: CellCleaner + ?Sized,
{
    let out = cells.map(|img| {
        let cleaned = cleaner.clean(img);
        if cleaned.has_content {
            Cell::Content(cleaned.image)
        } else {
            Cell::Blank
        }
    });
    let blanks = out.iter().filter(|(_, c)| c.is_blank()).count();
    log::debug!(
        "cleaned {} cells, {} blank",
        cells.order().cell_count(),
        blanks
    );
    out
}

/// Default cleaner: margin trim, contrast gate, Otsu mask, border-touching
/// blob removal, fill gate, then a padded square crop around the remaining
/// ink resized to `output_size`. Ink is white on black in the output.
#[derive(Clone, Debug, Default)]
pub struct OtsuCellCleaner {
    pub params: CleanerParams,
}

impl OtsuCellCleaner {
    pub fn new(params: CleanerParams) -> Self {
        Self { params }
    }

    fn blank(&self) -> CleanedCell {
        let n = self.params.output_size.max(1);
        CleanedCell::blank(GrayImage::new(n, n))
    }

    fn ink_mask(&self, cell: &GrayImage) -> Option<GrayImage> {
        let (w, h) = cell.dimensions();
        let mx = (w as f32 * self.params.margin_frac).round() as u32;
        let my = (h as f32 * self.params.margin_frac).round() as u32;
        if 2 * mx >= w || 2 * my >= h {
            return None;
        }
        let (iw, ih) = (w - 2 * mx, h - 2 * my);
        let inner = imageops::crop_imm(cell, mx, my, iw, ih).to_image();

        let lo = inner.as_raw().iter().copied().min()?;
        let hi = inner.as_raw().iter().copied().max()?;
        if hi - lo < self.params.min_contrast {
            return None;
        }

        Some(threshold(&inner, otsu_level(&inner), ThresholdType::BinaryInverted))
    }
}

fn clear_border_blobs(mask: &mut GrayImage) {
    let (w, h) = mask.dimensions();
    let labels = connected_components(&*mask, Connectivity::Eight, Luma([0u8]));

    let mut touching = HashSet::new();
    for x in 0..w {
        touching.insert(labels.get_pixel(x, 0).0[0]);
        touching.insert(labels.get_pixel(x, h - 1).0[0]);
    }
    for y in 0..h {
        touching.insert(labels.get_pixel(0, y).0[0]);
        touching.insert(labels.get_pixel(w - 1, y).0[0]);
    }
    touching.remove(&0);

    for (x, y, p) in mask.enumerate_pixels_mut() {
        if touching.contains(&labels.get_pixel(x, y).0[0]) {
            p.0[0] = 0;
        }
    }
}

fn ink_bounds(mask: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    mask.enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .fold(None, |acc, (x, y, _)| match acc {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}

impl CellCleaner for OtsuCellCleaner {
    fn clean(&self, cell: &GrayImage) -> CleanedCell {
        let Some(mut mask) = self.ink_mask(cell) else {
            return self.blank();
        };
        clear_border_blobs(&mut mask);

        let area = (mask.width() * mask.height()) as f32;
        let ink = mask.pixels().filter(|p| p.0[0] > 0).count() as f32;
        if ink / area < self.params.min_fill {
            return self.blank();
        }
        let Some((x0, y0, x1, y1)) = ink_bounds(&mask) else {
            return self.blank();
        };

        let (bw, bh) = (x1 - x0 + 1, y1 - y0 + 1);
        let longer = bw.max(bh);
        let pad = (longer as f32 * self.params.pad_frac).round() as u32;
        let side = longer + 2 * pad;
        let ox = (side - bw) / 2;
        let oy = (side - bh) / 2;

        let square = GrayImage::from_fn(side, side, |x, y| {
            if x < ox || y < oy || x >= ox + bw || y >= oy + bh {
                return Luma([0]);
            }
            *mask.get_pixel(x0 + x - ox, y0 + y - oy)
        });

        let n = self.params.output_size.max(1);
        CleanedCell {
            image: imageops::resize(&square, n, n, FilterType::Triangle),
            has_content: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_lens_core::GridOrder;

    fn paper(w: u32) -> GrayImage {
        GrayImage::from_pixel(w, w, Luma([230]))
    }

    fn fill(img: &mut GrayImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>, v: u8) {
        for y in ys {
            for x in xs.clone() {
                img.put_pixel(x, y, Luma([v]));
            }
        }
    }

    #[test]
    fn uniform_cell_is_blank() {
        let cleaned = OtsuCellCleaner::default().clean(&paper(50));
        assert!(!cleaned.has_content);
        assert_eq!(cleaned.image.dimensions(), (50, 50));
    }

    #[test]
    fn centered_stroke_is_content() {
        let mut cell = paper(50);
        fill(&mut cell, 22..28, 12..38, 20);

        let cleaned = OtsuCellCleaner::default().clean(&cell);
        assert!(cleaned.has_content);
        assert_eq!(cleaned.image.dimensions(), (50, 50));
        assert!(cleaned.image.get_pixel(25, 25).0[0] > 200);
        assert_eq!(cleaned.image.get_pixel(2, 25).0[0], 0);
    }

    #[test]
    fn grid_line_residue_is_blank() {
        let mut cell = paper(50);
        // Thick grid line surviving the margin trim, touching the left edge.
        fill(&mut cell, 0..9, 0..50, 20);
        let cleaned = OtsuCellCleaner::default().clean(&cell);
        assert!(!cleaned.has_content);
    }

    #[test]
    fn speck_below_min_fill_is_blank() {
        let mut cell = paper(50);
        fill(&mut cell, 24..26, 24..26, 20);
        assert!(!OtsuCellCleaner::default().clean(&cell).has_content);
    }

    #[test]
    fn orchestration_tags_cells() {
        let order = GridOrder::new(2).unwrap();
        let cells = Grid::from_fn(order, |row, col| {
            GrayImage::from_pixel(4, 4, Luma([(row * 2 + col) as u8]))
        });
        let odd = |img: &GrayImage| CleanedCell {
            image: img.clone(),
            has_content: img.get_pixel(0, 0).0[0] % 2 == 1,
        };

        let out = clean_cells(&cells, &odd);
        assert!(out[(0, 0)].is_blank());
        assert_eq!(out[(0, 1)].image().unwrap().get_pixel(0, 0).0[0], 1);
        assert!(out[(1, 0)].is_blank());
        assert!(!out[(1, 1)].is_blank());
    }
}
