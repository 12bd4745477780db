//! Board extraction for sudoku-lens, built on top of `sudoku-lens-core`.
//!
//! Stages, in pipeline order:
//! 1. [`binarize`]: photo → foreground mask (board ink = white).
//! 2. [`locate_board`]: largest external contour that simplifies to four
//!    vertices, plus its extreme corners.
//! 3. [`rectify_board`]: perspective warp of the corner quadrilateral into a
//!    square whose side matches the longest board edge.
//! 4. [`split_into_cells`]: N×N equal cells; remainder pixels are dropped.
//! 5. [`clean_cells`]: per-cell content check and normalization through a
//!    pluggable [`CellCleaner`].
//!
//! ```
//! use image::{GrayImage, Luma};
//! use sudoku_lens_board::{locate_board, LocatorParams};
//!
//! let mask = GrayImage::from_pixel(64, 64, Luma([0]));
//! assert!(locate_board(&mask, &LocatorParams::default()).is_none());
//! ```

mod clean;
mod locate;
mod params;
mod partition;
mod rectify;
mod threshold;

pub use clean::{clean_cells, Cell, CellCleaner, CleanedCell, OtsuCellCleaner};
pub use locate::{annotate_boundary_mut, approximate_closed_polygon, locate_board, BoardBoundary};
pub use params::{AnnotationStyle, CleanerParams, LocatorParams, ThresholdMode, ThresholdParams};
pub use partition::{cell_side, split_into_cells, PartitionError};
pub use rectify::{rectify_board, target_side, RectifiedBoard, RectifyError};
pub use threshold::binarize;
