//! Photo binarization.

use crate::{ThresholdMode, ThresholdParams};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Turn a color photo into a foreground mask: dark board ink becomes 255,
/// paper and background 0.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(photo, params), fields(width = photo.width(), height = photo.height()))
)]
pub fn binarize(photo: &RgbImage, params: &ThresholdParams) -> GrayImage {
    let gray = image::imageops::grayscale(photo);
    let smooth = if params.blur_sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(&gray, params.blur_sigma)
    } else {
        gray
    };

    match params.mode {
        ThresholdMode::Otsu => {
            let level = otsu_level(&smooth);
            log::trace!("global otsu level {level}");
            threshold(&smooth, level, ThresholdType::BinaryInverted)
        }
        ThresholdMode::AdaptiveMean => {
            let r = params.block_radius.max(1);
            let means = imageproc::filter::box_filter(&smooth, r, r);
            GrayImage::from_fn(smooth.width(), smooth.height(), |x, y| {
                let v = smooth.get_pixel(x, y).0[0] as i16;
                let m = means.get_pixel(x, y).0[0] as i16;
                ink(v <= m - params.offset)
            })
        }
    }
}

#[inline]
fn ink(is_ink: bool) -> Luma<u8> {
    Luma([if is_ink { 255 } else { 0 }])
}
