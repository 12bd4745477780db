use image::{ImageBuffer, Pixel};
use sudoku_lens_core::{
    homography_from_4pt, square_corners, warp_perspective, Corners, CornersError, Homography,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("invalid board corners: {0}")]
    InvalidCorners(#[from] CornersError),
    #[error("rectified side {side}px is too small")]
    TooSmall { side: u32 },
    #[error("corner homography is singular")]
    Singular,
}

/// Square, fronto-parallel view of the board.
#[derive(Clone, Debug)]
pub struct RectifiedBoard<P: Pixel<Subpixel = u8>> {
    pub image: ImageBuffer<P, Vec<u8>>,
    pub side: u32,
    /// Corners in the source photo the view was built from.
    pub corners: Corners,
    pub h_rect_from_img: Homography,
    pub h_img_from_rect: Homography,
}

/// Output side for a quad: the longest of its four edges, truncated.
#[inline]
pub fn target_side(corners: &Corners) -> u32 {
    corners.max_edge_length().floor() as u32
}

/// Warp the board region of `photo` onto an S×S square, S = [`target_side`].
///
/// Corner `k` maps to the `k`-th corner of the square, with TL at `(0, 0)`
/// and BR at `(S-1, S-1)`. Parts of the square that fall outside the photo
/// are black.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(photo, corners), fields(width = photo.width(), height = photo.height()))
)]
pub fn rectify_board<P>(
    photo: &ImageBuffer<P, Vec<u8>>,
    corners: &Corners,
) -> Result<RectifiedBoard<P>, RectifyError>
where
    P: Pixel<Subpixel = u8>,
{
    corners.validate()?;

    let side = target_side(corners);
    if side < 2 {
        return Err(RectifyError::TooSmall { side });
    }

    let dst = square_corners(side);
    let h_rect_from_img =
        homography_from_4pt(&corners.to_array(), &dst).ok_or(RectifyError::Singular)?;
    let h_img_from_rect = h_rect_from_img.inverse().ok_or(RectifyError::Singular)?;

    let image = warp_perspective(photo, &h_img_from_rect, side, side);
    log::debug!("rectified board to {side}x{side}");

    Ok(RectifiedBoard {
        image,
        side,
        corners: *corners,
        h_rect_from_img,
        h_img_from_rect,
    })
}
