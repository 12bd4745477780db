//! Geometry primitives: board corners, extreme-corner selection, distances
//! and destination coordinate arrays.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Why a set of four corners cannot be used as a board quadrilateral.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornersError {
    #[error("corner coordinates must be finite")]
    NonFinite,
    #[error("corners are not mutually distinct")]
    Coincident,
    #[error("corners do not form a convex quadrilateral in TL, TR, BR, BL order")]
    NotConvex,
}

/// The four extreme corners of a board, in canonical order.
///
/// The order (top-left, top-right, bottom-right, bottom-left) is semantic:
/// homography construction and re-projection pair these points index-wise
/// with rectangle corners built by [`rect_corners`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
}

impl Corners {
    pub fn new(
        top_left: Point2<f32>,
        top_right: Point2<f32>,
        bottom_right: Point2<f32>,
        bottom_left: Point2<f32>,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn from_array(pts: [Point2<f32>; 4]) -> Self {
        let [tl, tr, br, bl] = pts;
        Self::new(tl, tr, br, bl)
    }

    /// Corners as `[TL, TR, BR, BL]`.
    #[inline]
    pub fn to_array(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Lengths of the four sides: top, right, bottom, left.
    pub fn edge_lengths(&self) -> [f32; 4] {
        [
            distance(self.top_left, self.top_right),
            distance(self.top_right, self.bottom_right),
            distance(self.bottom_right, self.bottom_left),
            distance(self.bottom_left, self.top_left),
        ]
    }

    pub fn max_edge_length(&self) -> f32 {
        self.edge_lengths().into_iter().fold(0.0, f32::max)
    }

    /// Corners rounded to integer pixel addresses.
    pub fn to_pixels(&self) -> [(i32, i32); 4] {
        self.to_array()
            .map(|p| (p.x.round() as i32, p.y.round() as i32))
    }

    /// Check the quadrilateral invariant: finite, distinct, strictly convex,
    /// wound TL → TR → BR → BL in image coordinates (y down).
    pub fn validate(&self) -> Result<(), CornersError> {
        let pts = self.to_array();
        if pts.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(CornersError::NonFinite);
        }

        for i in 0..4 {
            for j in (i + 1)..4 {
                if distance(pts[i], pts[j]) < 1e-3 {
                    return Err(CornersError::Coincident);
                }
            }
        }

        for k in 0..4 {
            let a = pts[k];
            let b = pts[(k + 1) % 4];
            let c = pts[(k + 2) % 4];
            let e1x = (b.x - a.x) as f64;
            let e1y = (b.y - a.y) as f64;
            let e2x = (c.x - b.x) as f64;
            let e2y = (c.y - b.y) as f64;
            if e1x * e2y - e1y * e2x <= 0.0 {
                return Err(CornersError::NotConvex);
            }
        }

        Ok(())
    }
}

#[inline]
pub fn distance(a: Point2<f32>, b: Point2<f32>) -> f32 {
    nalgebra::distance(&a, &b)
}

/// Select the board corners from a polygon's point set.
///
/// Four independent reductions:
/// - top-left: min(x + y)
/// - top-right: max(x - y)
/// - bottom-right: max(x + y)
/// - bottom-left: min(x - y)
///
/// Ties are broken on `(x, y)` so the result does not depend on the order
/// of `points`. Returns `None` for an empty slice. Boards rotated by more
/// than ~45° are not handled: the diagonal keys then pick the wrong vertex.
pub fn extreme_corners(points: &[Point2<f32>]) -> Option<Corners> {
    let top_left = select_min(points, |p| p.x + p.y)?;
    let top_right = select_min(points, |p| -(p.x - p.y))?;
    let bottom_right = select_min(points, |p| -(p.x + p.y))?;
    let bottom_left = select_min(points, |p| p.x - p.y)?;
    Some(Corners::new(top_left, top_right, bottom_right, bottom_left))
}

fn select_min<F>(points: &[Point2<f32>], key: F) -> Option<Point2<f32>>
where
    F: Fn(&Point2<f32>) -> f32,
{
    points
        .iter()
        .copied()
        .fold(None::<(f32, Point2<f32>)>, |best, p| {
            let k = key(&p);
            match best {
                None => Some((k, p)),
                Some((bk, bp)) => {
                    let better = k < bk || (k == bk && (p.x, p.y) < (bp.x, bp.y));
                    if better {
                        Some((k, p))
                    } else {
                        Some((bk, bp))
                    }
                }
            }
        })
        .map(|(_, p)| p)
}

/// Corners of a `width × height` pixel rectangle in TL, TR, BR, BL order,
/// addressing the outermost pixel centers `(0, 0) .. (w-1, h-1)`.
pub fn rect_corners(width: u32, height: u32) -> [Point2<f32>; 4] {
    let w = width.saturating_sub(1) as f32;
    let h = height.saturating_sub(1) as f32;
    [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ]
}

#[inline]
pub fn square_corners(side: u32) -> [Point2<f32>; 4] {
    rect_corners(side, side)
}

/// Unsigned area of a closed polygon (shoelace formula).
pub fn polygon_area(points: &[Point2<f32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut twice = 0.0f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    (twice * 0.5).abs()
}
