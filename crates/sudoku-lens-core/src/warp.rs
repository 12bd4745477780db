//! Bilinear sampling and inverse-mapped perspective warping on 8-bit
//! `image` buffers of any channel count.

use crate::Homography;
use image::{ImageBuffer, Pixel};
use nalgebra::Point2;

const MAX_CHANNELS: usize = 4;

#[inline]
fn texel<P>(src: &ImageBuffer<P, Vec<u8>>, x: i64, y: i64, c: usize) -> f32
where
    P: Pixel<Subpixel = u8>,
{
    if x < 0 || y < 0 || x >= src.width() as i64 || y >= src.height() as i64 {
        return 0.0;
    }
    let n = P::CHANNEL_COUNT as usize;
    let idx = (y as usize * src.width() as usize + x as usize) * n + c;
    src.as_raw()[idx] as f32
}

/// Bilinear sample at a sub-pixel position, integer coordinates addressing
/// pixel centers. Samples outside the image read as zero.
#[inline]
pub fn sample_bilinear<P>(src: &ImageBuffer<P, Vec<u8>>, x: f32, y: f32) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let n = (P::CHANNEL_COUNT as usize).min(MAX_CHANNELS);
    let mut out = [0u8; MAX_CHANNELS];

    if x.is_finite() && y.is_finite() {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        for (c, v) in out.iter_mut().enumerate().take(n) {
            let p00 = texel(src, x0, y0, c);
            let p10 = texel(src, x0 + 1, y0, c);
            let p01 = texel(src, x0, y0 + 1, c);
            let p11 = texel(src, x0 + 1, y0 + 1, c);

            let a = p00 + fx * (p10 - p00);
            let b = p01 + fx * (p11 - p01);
            *v = (a + fy * (b - a) + 0.5).clamp(0.0, 255.0) as u8;
        }
    }

    *P::from_slice(&out[..n])
}

/// Warp into an `out_w × out_h` image: every destination pixel `(x, y)` is
/// mapped through `h_src_from_dst` and bilinearly sampled from `src`.
/// Destination pixels that map outside `src` stay zero.
pub fn warp_perspective<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    h_src_from_dst: &Homography,
    out_w: u32,
    out_h: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    ImageBuffer::from_fn(out_w, out_h, |x, y| {
        let p = h_src_from_dst.apply(Point2::new(x as f32, y as f32));
        sample_bilinear(src, p.x, p.y)
    })
}

/// Per-channel saturating sum of two equally sized images.
///
/// Returns `None` when the dimensions differ.
pub fn saturating_add<P>(
    a: &ImageBuffer<P, Vec<u8>>,
    b: &ImageBuffer<P, Vec<u8>>,
) -> Option<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    if a.dimensions() != b.dimensions() {
        return None;
    }
    let data: Vec<u8> = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&x, &y)| x.saturating_add(y))
        .collect();
    ImageBuffer::from_raw(a.width(), a.height(), data)
}
