//! Find a sudoku board in a photo, read it, and paint the solution back in
//! the photo's own perspective.
//!
//! This facade re-exports the stage crates as modules and adds the per-frame
//! [`Pipeline`], which wires them together around two injected capabilities:
//! a [`DigitClassifier`] for non-blank cells and a [`PuzzleSolver`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use image::GrayImage;
//! use sudoku_lens::core::{Grid, Symbol, SymbolGrid};
//! use sudoku_lens::{ClassifyError, Pipeline, PipelineParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = image::open("board.jpg")?.to_rgb8();
//! let classify = |_cell: &GrayImage| -> Result<Symbol, ClassifyError> {
//!     Err(ClassifyError::Model("no model loaded".into()))
//! };
//! let solve = |_puzzle: &SymbolGrid| -> Option<Grid<Symbol>> { None };
//!
//! let pipeline = Pipeline::new(PipelineParams::default(), classify, solve);
//! let report = pipeline.process_frame(&photo)?;
//! println!("{:?}", report.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `sudoku_lens::core`: corners, homographies, warping, grid model, logger.
//! - `sudoku_lens::board`: binarize, locate, rectify, partition, clean.
//! - `sudoku_lens::overlay`: overlay composition, re-projection, text.

pub use sudoku_lens_board as board;
pub use sudoku_lens_core as core;
pub use sudoku_lens_overlay as overlay;

mod params;
mod pipeline;

pub use params::{ConfigError, PipelineParams};
pub use pipeline::{
    ClassifyError, DigitClassifier, FrameReport, FrameStatus, Pipeline, PipelineError,
    PuzzleSolver, SkipReason,
};
pub use sudoku_lens_core::{Corners, Grid, GridOrder, Symbol, SymbolGrid};

/// Install a `tracing` subscriber and forward `log` records into it.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let _ = tracing_log::LogTracer::init();
    sudoku_lens_core::init_tracing(json);
}
