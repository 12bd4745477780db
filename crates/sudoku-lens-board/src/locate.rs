//! Board boundary location: the largest external contour whose polygon
//! approximation has exactly four vertices.

use crate::{AnnotationStyle, LocatorParams};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use nalgebra::Point2;
use sudoku_lens_core::{extreme_corners, polygon_area, Corners};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// The accepted board candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardBoundary {
    /// Extreme corners of the full contour point set.
    pub corners: Corners,
    /// Every border pixel of the accepted contour, in tracing order.
    pub contour: Vec<Point2<f32>>,
    /// The four vertices of the contour's polygon approximation.
    pub polygon: Vec<Point2<f32>>,
    /// Enclosed contour area in square pixels.
    pub area: f64,
}

struct Candidate {
    points: Vec<Point<u32>>,
    area: f64,
}

fn external_candidates(binary: &GrayImage, min_area: f64) -> Vec<Candidate> {
    let contours: Vec<Contour<u32>> = find_contours(binary);
    let total = contours.len();

    let mut out: Vec<Candidate> = contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| c.points.len() >= 4)
        .filter_map(|c| {
            let pts: Vec<Point2<f32>> = c
                .points
                .iter()
                .map(|p| Point2::new(p.x as f32, p.y as f32))
                .collect();
            let area = polygon_area(&pts);
            (area > 0.0 && area >= min_area).then_some(Candidate {
                points: c.points,
                area,
            })
        })
        .collect();

    out.sort_by(|a, b| b.area.total_cmp(&a.area));
    log::debug!(
        "{} contours traced, {} external candidates",
        total,
        out.len()
    );
    out
}

/// Douglas–Peucker simplification of a closed curve.
///
/// The curve is cut at two mutually distant points, each half is simplified
/// as an open chain and the halves are joined again, so the result does not
/// depend on where border tracing happened to start. Returned vertices are
/// not repeated at the end.
pub fn approximate_closed_polygon(curve: &[Point<u32>], epsilon: f64) -> Vec<Point<u32>> {
    let n = curve.len();
    if n < 3 || epsilon <= 0.0 {
        return curve.to_vec();
    }

    let farthest_from = |origin: Point<u32>| {
        let mut best = (0usize, -1.0f64);
        for (i, p) in curve.iter().enumerate() {
            let d = (p.x as f64 - origin.x as f64).hypot(p.y as f64 - origin.y as f64);
            if d > best.1 {
                best = (i, d);
            }
        }
        best
    };

    let (a, _) = farthest_from(curve[0]);
    let (b, span) = farthest_from(curve[a]);
    if span <= 0.0 {
        return vec![curve[0]];
    }

    let chain = |from: usize, to: usize| -> Vec<Point<u32>> {
        let len = (to + n - from) % n;
        (0..=len).map(|k| curve[(from + k) % n]).collect()
    };

    let mut out = Vec::new();
    for (from, to) in [(a, b), (b, a)] {
        let part = chain(from, to);
        let mut simplified = if part.len() <= 2 {
            part
        } else {
            approximate_polygon_dp(&part, epsilon, false)
        };
        // The chain end is the next chain's start.
        simplified.pop();
        out.extend(simplified);
    }
    out
}

/// Find the board in a binary mask (non-zero = foreground).
///
/// Contours are visited largest-area first; the first whose closed polygon
/// approximation (tolerance = `approx_epsilon_frac` × perimeter) has exactly
/// four vertices wins. `None` is the normal outcome for frames without a
/// board.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(binary, params), fields(width = binary.width(), height = binary.height()))
)]
pub fn locate_board(binary: &GrayImage, params: &LocatorParams) -> Option<BoardBoundary> {
    let image_area = binary.width() as f64 * binary.height() as f64;
    let candidates = external_candidates(binary, params.min_area_frac * image_area);
    let limit = params.max_candidates.unwrap_or(usize::MAX);

    for (rank, cand) in candidates.into_iter().take(limit).enumerate() {
        let perimeter = arc_length(&cand.points, true);
        let polygon = approximate_closed_polygon(&cand.points, params.approx_epsilon_frac * perimeter);
        log::trace!(
            "candidate #{rank}: area {:.0}, perimeter {:.0}, {} vertices",
            cand.area,
            perimeter,
            polygon.len()
        );
        if polygon.len() != 4 {
            continue;
        }

        let contour: Vec<Point2<f32>> = cand
            .points
            .iter()
            .map(|p| Point2::new(p.x as f32, p.y as f32))
            .collect();
        let corners = extreme_corners(&contour)?;
        log::debug!(
            "board candidate #{rank} accepted: area {:.0}, corners {:?}",
            cand.area,
            corners.to_pixels()
        );
        return Some(BoardBoundary {
            corners,
            contour,
            polygon: polygon
                .iter()
                .map(|p| Point2::new(p.x as f32, p.y as f32))
                .collect(),
            area: cand.area,
        });
    }

    log::debug!("no four-sided contour found");
    None
}

/// Draw the accepted contour outline and its corner markers onto `img`.
///
/// Intended for a display copy of the photo; rectification must read an
/// unannotated image.
pub fn annotate_boundary_mut(img: &mut RgbImage, boundary: &BoardBoundary, style: &AnnotationStyle) {
    let n = boundary.contour.len();
    if n >= 2 {
        let color = Rgb(style.outline_color);
        let half = (style.outline_thickness.max(1) as i32 - 1) / 2;
        let extra = (style.outline_thickness.max(1) as i32 - 1) % 2;
        for i in 0..n {
            let a = boundary.contour[i];
            let b = boundary.contour[(i + 1) % n];
            for dy in -half..=half + extra {
                for dx in -half..=half + extra {
                    draw_line_segment_mut(
                        img,
                        (a.x + dx as f32, a.y + dy as f32),
                        (b.x + dx as f32, b.y + dy as f32),
                        color,
                    );
                }
            }
        }
    }

    if style.corner_radius > 0 {
        for (x, y) in boundary.corners.to_pixels() {
            draw_filled_circle_mut(img, (x, y), style.corner_radius, Rgb(style.corner_color));
        }
    }
}
