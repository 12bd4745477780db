use crate::{LabelStyle, OverlayError, TextRenderer};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use sudoku_lens_core::{homography_from_4pt, rect_corners, saturating_add, warp_perspective, Corners};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Project a rectified-frame `overlay` back onto `dest` inside `corners`.
///
/// The overlay rectangle `(0,0), (w-1,0), (w-1,h-1), (0,h-1)` is mapped onto
/// the corners with a homography solved from scratch for this call. The
/// quadrilateral is cleared in a copy of `dest` and the warped overlay is
/// added per channel with saturation; pixels outside the quad are unchanged.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(overlay, dest, corners), fields(width = dest.width(), height = dest.height()))
)]
pub fn reproject(overlay: &RgbImage, dest: &RgbImage, corners: &Corners) -> Result<RgbImage, OverlayError> {
    corners.validate()?;
    let (w, h) = overlay.dimensions();
    if w < 2 || h < 2 {
        return Err(OverlayError::EmptyOverlay { width: w, height: h });
    }

    let h_img_from_overlay =
        homography_from_4pt(&rect_corners(w, h), &corners.to_array()).ok_or(OverlayError::Homography)?;
    let h_overlay_from_img = h_img_from_overlay.inverse().ok_or(OverlayError::Homography)?;

    let warped = warp_perspective(overlay, &h_overlay_from_img, dest.width(), dest.height());

    let mut base = dest.clone();
    clear_quad_mut(&mut base, corners);

    let out = saturating_add(&base, &warped).ok_or(OverlayError::SizeMismatch {
        expected: base.dimensions(),
        got: warped.dimensions(),
    })?;
    log::debug!("re-projected {w}x{h} overlay into {}x{}", dest.width(), dest.height());
    Ok(out)
}

fn clear_quad_mut(img: &mut RgbImage, corners: &Corners) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(4);
    for (x, y) in corners.to_pixels() {
        let p = Point::new(x, y);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() >= 3 {
        draw_polygon_mut(img, &poly, Rgb([0, 0, 0]));
    }
}

/// Stamp `text` at the label's fixed screen position; no-op when disabled.
pub fn stamp_label_mut<R>(img: &mut RgbImage, text: &str, renderer: &R, style: &LabelStyle)
where
    R: TextRenderer + ?Sized,
{
    if !style.enabled || text.is_empty() {
        return;
    }
    let [x, y] = style.position;
    renderer.draw_mut(img, text, x, y, style.height, Rgb(style.color));
}
