//! Core types and utilities for the sudoku-lens pipeline.
//!
//! This crate is intentionally small and purely geometric: points and board
//! corners, homographies, bilinear sampling / perspective warping on
//! `image` buffers, and the N×N grid model shared by every later stage.
//! It does *not* know how boards are found or how overlays are drawn.

mod geometry;
mod grid;
mod homography;
mod logger;
mod warp;

pub use geometry::{
    distance, extreme_corners, polygon_area, rect_corners, square_corners, Corners, CornersError,
};
pub use grid::{Grid, GridOrder, GridOrderError, Symbol, SymbolError, SymbolGrid};
pub use homography::{homography_from_4pt, Homography};
pub use warp::{sample_bilinear, saturating_add, warp_perspective};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
