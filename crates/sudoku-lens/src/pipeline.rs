//! Per-frame orchestration: binarize, locate, rectify, partition, clean,
//! classify, solve, compose and re-project.

use crate::board::{
    annotate_boundary_mut, binarize, clean_cells, locate_board, rectify_board, split_into_cells,
    Cell, CellCleaner, OtsuCellCleaner,
};
use crate::core::{Corners, Grid, GridOrder, Symbol, SymbolError, SymbolGrid};
use crate::overlay::{
    compose_overlay, paint_over, reproject, stamp_label_mut, OverlayError, StrokeFont, TextRenderer,
};
use crate::PipelineParams;
use image::{GrayImage, RgbImage};
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("classifier failed: {0}")]
    Model(String),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

/// Maps a cleaned, non-blank cell image to its printed symbol.
pub trait DigitClassifier {
    fn classify(&self, cell: &GrayImage) -> Result<Symbol, ClassifyError>;
}

impl<F> DigitClassifier for F
where
    F: Fn(&GrayImage) -> Result<Symbol, ClassifyError>,
{
    fn classify(&self, cell: &GrayImage) -> Result<Symbol, ClassifyError> {
        self(cell)
    }
}

/// Completes a partially filled grid; `None` means unsolvable.
pub trait PuzzleSolver {
    fn solve(&self, puzzle: &SymbolGrid) -> Option<Grid<Symbol>>;
}

impl<F> PuzzleSolver for F
where
    F: Fn(&SymbolGrid) -> Option<Grid<Symbol>>,
{
    fn solve(&self, puzzle: &SymbolGrid) -> Option<Grid<Symbol>> {
        self(puzzle)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("classifier failed on cell ({row}, {col})")]
    Classifier {
        row: usize,
        col: usize,
        #[source]
        source: ClassifyError,
    },
    #[error("solver returned a {got} grid for a {expected} puzzle")]
    SolutionOrder { expected: GridOrder, got: GridOrder },
    #[error("solution is inconsistent with the puzzle at cell ({row}, {col})")]
    InvalidSolution { row: usize, col: usize },
    #[error(transparent)]
    Overlay(#[from] OverlayError),
}

/// Why a frame produced no overlay. All of these are ordinary outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    BoundaryNotFound,
    DegenerateCorners,
    Unsolvable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Solved,
    Skipped(SkipReason),
}

/// Result of one [`Pipeline::process_frame`] call.
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub status: FrameStatus,
    /// Output frame: the composited photo when solved, otherwise the
    /// (possibly annotated) input.
    pub output: RgbImage,
    pub corners: Option<Corners>,
    /// Recognised symbols, `None` for blank cells.
    pub puzzle: Option<SymbolGrid>,
    pub solution: Option<Grid<Symbol>>,
    pub elapsed: Duration,
}

impl FrameReport {
    pub fn is_solved(&self) -> bool {
        self.status == FrameStatus::Solved
    }
}

/// The frame pipeline with its injected classifier, solver, text renderer
/// and cell cleaner.
///
/// Holds no per-frame state; `process_frame` takes `&self`.
pub struct Pipeline<C, S, R = StrokeFont, K = OtsuCellCleaner> {
    params: PipelineParams,
    cleaner: K,
    classifier: C,
    solver: S,
    renderer: R,
}

impl<C, S> Pipeline<C, S, StrokeFont, OtsuCellCleaner>
where
    C: DigitClassifier,
    S: PuzzleSolver,
{
    pub fn new(params: PipelineParams, classifier: C, solver: S) -> Self {
        Self {
            cleaner: OtsuCellCleaner::new(params.cleaner.clone()),
            params,
            classifier,
            solver,
            renderer: StrokeFont::default(),
        }
    }
}

impl<C, S, R, K> Pipeline<C, S, R, K>
where
    C: DigitClassifier,
    S: PuzzleSolver,
    R: TextRenderer,
    K: CellCleaner,
{
    /// Swap the text renderer used for symbols and the label.
    pub fn with_renderer<R2: TextRenderer>(self, renderer: R2) -> Pipeline<C, S, R2, K> {
        Pipeline {
            params: self.params,
            cleaner: self.cleaner,
            classifier: self.classifier,
            solver: self.solver,
            renderer,
        }
    }

    /// Swap the per-cell cleaner. `params.cleaner` only configures the
    /// default [`OtsuCellCleaner`].
    pub fn with_cleaner<K2: CellCleaner>(self, cleaner: K2) -> Pipeline<C, S, R, K2> {
        Pipeline {
            params: self.params,
            cleaner,
            classifier: self.classifier,
            solver: self.solver,
            renderer: self.renderer,
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    fn skipped(
        &self,
        reason: SkipReason,
        output: RgbImage,
        corners: Option<Corners>,
        puzzle: Option<SymbolGrid>,
        started: Instant,
    ) -> FrameReport {
        log::debug!("frame skipped: {reason:?}");
        FrameReport {
            status: FrameStatus::Skipped(reason),
            output,
            corners,
            puzzle,
            solution: None,
            elapsed: started.elapsed(),
        }
    }

    fn recognise(&self, cells: &Grid<Cell>) -> Result<SymbolGrid, PipelineError> {
        let order = self.params.order;
        cells.try_map(|(row, col), cell| {
            let Some(img) = cell.image() else {
                return Ok(None);
            };
            let symbol = self
                .classifier
                .classify(img)
                .and_then(|s| Symbol::new(s.value() as usize, order).map_err(ClassifyError::from))
                .map_err(|source| PipelineError::Classifier { row, col, source })?;
            Ok(Some(symbol))
        })
    }

    fn check_solution(&self, puzzle: &SymbolGrid, solution: &Grid<Symbol>) -> Result<(), PipelineError> {
        if solution.order() != puzzle.order() {
            return Err(PipelineError::SolutionOrder {
                expected: puzzle.order(),
                got: solution.order(),
            });
        }
        let n = puzzle.order().get();
        for ((row, col), s) in solution.iter() {
            let out_of_range = s.value() as usize > n;
            let contradicts = puzzle[(row, col)].is_some_and(|given| given != *s);
            if out_of_range || contradicts {
                return Err(PipelineError::InvalidSolution { row, col });
            }
        }
        Ok(())
    }

    /// Run every stage on one photo.
    ///
    /// Frames without a usable board, or whose puzzle the solver rejects,
    /// come back as [`FrameStatus::Skipped`] with the input (annotated when
    /// configured) as output. Classifier failures and malformed solutions
    /// are errors.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, photo), fields(width = photo.width(), height = photo.height()))
    )]
    pub fn process_frame(&self, photo: &RgbImage) -> Result<FrameReport, PipelineError> {
        let started = Instant::now();
        let p = &self.params;

        let mask = binarize(photo, &p.threshold);
        let mut display = photo.clone();
        let Some(boundary) = locate_board(&mask, &p.locator) else {
            return Ok(self.skipped(SkipReason::BoundaryNotFound, display, None, None, started));
        };
        let corners = boundary.corners;
        if p.annotate {
            annotate_boundary_mut(&mut display, &boundary, &p.annotation);
        }

        let rectified = match rectify_board(photo, &corners) {
            Ok(r) => r,
            Err(err) => {
                log::debug!("rectification rejected: {err}");
                return Ok(self.skipped(SkipReason::DegenerateCorners, display, Some(corners), None, started));
            }
        };

        let gray = image::imageops::grayscale(&rectified.image);
        let cells = match split_into_cells(&gray, p.order) {
            Ok(cells) => cells,
            Err(err) => {
                log::debug!("partition rejected: {err}");
                return Ok(self.skipped(SkipReason::DegenerateCorners, display, Some(corners), None, started));
            }
        };

        let cleaned = clean_cells(&cells, &self.cleaner);
        let puzzle = self.recognise(&cleaned)?;
        log::debug!(
            "recognised {} givens, {} blanks",
            puzzle.order().cell_count() - puzzle.blank_count(),
            puzzle.blank_count()
        );

        let Some(solution) = self.solver.solve(&puzzle) else {
            return Ok(self.skipped(SkipReason::Unsolvable, display, Some(corners), Some(puzzle), started));
        };
        self.check_solution(&puzzle, &solution)?;

        let overlay = compose_overlay(
            rectified.side,
            rectified.side,
            &solution,
            &puzzle,
            &self.renderer,
            &p.overlay,
        )?;
        let source = if p.keep_board {
            paint_over(&rectified.image, &overlay)?
        } else {
            overlay
        };

        let mut output = reproject(&source, &display, &corners)?;
        let elapsed = started.elapsed();
        stamp_label_mut(
            &mut output,
            &format!("{:.3}s", elapsed.as_secs_f64()),
            &self.renderer,
            &p.label,
        );
        log::debug!("frame solved in {:.3}s", elapsed.as_secs_f64());

        Ok(FrameReport {
            status: FrameStatus::Solved,
            output,
            corners: Some(corners),
            puzzle: Some(puzzle),
            solution: Some(solution),
            elapsed,
        })
    }
}
