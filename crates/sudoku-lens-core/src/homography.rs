use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// A 3×3 planar perspective transform, `dst ~ H * src`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.h[(r, c)];
            }
        }
        out
    }

    /// Map a point; returns non-finite coordinates for points on the line at infinity.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        let inv = self.h.try_inverse()?;
        Some(Self::new(normalize_scale(inv).unwrap_or(inv)))
    }
}

fn hartley_transform(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// Translate to the centroid and scale so the mean distance is sqrt(2).
fn condition_points(pts: &[Point2<f32>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    let n = pts.len().max(1) as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / n;

    let t = hartley_transform(cx, cy, mean_dist);
    let out = pts
        .iter()
        .map(|p| {
            let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
            Point2::new(v[0], v[1])
        })
        .collect();
    (out, t)
}

fn normalize_scale(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(h / s)
}

fn uncondition(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    normalize_scale(t_dst_inv * hn * t_src)
}

/// Solve `H` with `dst ~ H * src` from exactly four correspondences
/// (h33 fixed to 1). Corner order must agree between `src` and `dst`.
///
/// Returns `None` when the configuration is degenerate (three collinear
/// points, repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let (s, ts) = condition_points(src);
    let (d, td) = condition_points(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (s[k].x, s[k].y);
        let (u, v) = (d[k].x, d[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = Homography::new(uncondition(hn, ts, td)?);

    // A near-singular system still "solves"; reject it unless the four
    // correspondences are actually reproduced.
    let extent = dst
        .iter()
        .fold(1.0f32, |m, p| m.max(p.x.abs()).max(p.y.abs()));
    let tol = 1e-3 * extent;
    let reproduced = src.iter().zip(dst.iter()).all(|(s, d)| {
        let m = h.apply(*s);
        m.x.is_finite() && m.y.is_finite() && (m.x - d.x).abs() <= tol && (m.y - d.y).abs() <= tol
    });
    if !reproduced || h.h.determinant().abs() < 1e-12 {
        return None;
    }
    Some(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const PHOTO_QUAD: [(f32, f32); 4] = [(62.0, 41.0), (371.0, 58.0), (355.0, 380.0), (48.0, 352.0)];

    fn board_square(side: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
    }

    fn photo_quad() -> [Point2<f32>; 4] {
        PHOTO_QUAD.map(|(x, y)| Point2::new(x, y))
    }

    #[test]
    fn photographed_board_maps_onto_square_and_back() {
        let square = board_square(449.0);
        let h = homography_from_4pt(&photo_quad(), &square).expect("board quad");
        for (q, s) in photo_quad().iter().zip(square.iter()) {
            let m = h.apply(*q);
            assert_abs_diff_eq!(m.x, s.x, epsilon = 1e-2);
            assert_abs_diff_eq!(m.y, s.y, epsilon = 1e-2);
        }

        let back = h.inverse().expect("invertible");
        let centre = Point2::new(224.5_f32, 224.5);
        let round = h.apply(back.apply(centre));
        assert_abs_diff_eq!(round.x, centre.x, epsilon = 1e-3);
        assert_abs_diff_eq!(round.y, centre.y, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_corner_sets_have_no_homography() {
        // Two corners merged into one: effectively a triangle.
        let folded = [
            Point2::new(10.0_f32, 10.0),
            Point2::new(200.0, 12.0),
            Point2::new(200.0, 12.0),
            Point2::new(8.0, 190.0),
        ];
        assert!(homography_from_4pt(&folded, &board_square(99.0)).is_none());

        let diagonal = [(0.0, 0.0), (5.0, 5.0), (9.0, 9.0), (20.0, 20.0)].map(|(x, y)| Point2::new(x, y));
        assert!(homography_from_4pt(&diagonal, &board_square(99.0)).is_none());
    }

    #[test]
    fn rows_are_stored_row_major() {
        let h = Homography::from_array([[2.0, 0.0, 5.0], [0.0, 2.0, -3.0], [0.0, 0.0, 1.0]]);
        assert_eq!(h.h[(0, 2)], 5.0);
        assert_eq!(h.to_array()[1], [0.0, 2.0, -3.0]);
        assert_eq!(h.apply(Point2::new(1.0, 1.0)), Point2::new(7.0, -1.0));
        assert_eq!(Homography::identity().apply(Point2::new(3.0, 4.0)), Point2::new(3.0, 4.0));
    }
}
