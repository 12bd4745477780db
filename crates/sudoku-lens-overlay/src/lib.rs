//! Overlay composition and re-projection for sudoku-lens.
//!
//! [`compose_overlay`] draws solved symbols on a black canvas in the
//! rectified board frame; [`reproject`] warps that canvas back into the photo
//! through the board corners and [`stamp_label_mut`] adds screen-fixed text.
//! Text goes through a [`TextRenderer`]: the built-in [`StrokeFont`] or a
//! TrueType [`FontRenderer`].

mod compose;
mod params;
mod reproject;
mod text;

use sudoku_lens_core::{CornersError, GridOrder};

pub use compose::{compose_overlay, paint_over};
pub use params::{LabelStyle, OverlayStyle};
pub use reproject::{reproject, stamp_label_mut};
pub use text::{FontError, FontRenderer, StrokeFont, TextRenderer};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("solved grid is {solved} but the puzzle is {puzzle}")]
    OrderMismatch { solved: GridOrder, puzzle: GridOrder },
    #[error("invalid target corners: {0}")]
    InvalidCorners(#[from] CornersError),
    #[error("overlay of {width}x{height} is too small to re-project")]
    EmptyOverlay { width: u32, height: u32 },
    #[error("overlay homography is singular")]
    Homography,
    #[error("image size mismatch: expected {expected:?}, got {got:?}")]
    SizeMismatch { expected: (u32, u32), got: (u32, u32) },
}
