use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use nalgebra::Point2;
use sudoku_lens::board::{
    annotate_boundary_mut, binarize, locate_board, AnnotationStyle, CleanedCell, LocatorParams,
    ThresholdMode, ThresholdParams,
};
use sudoku_lens::core::{homography_from_4pt, sample_bilinear, square_corners};
use sudoku_lens::overlay::{LabelStyle, StrokeFont, TextRenderer};
use sudoku_lens::{
    ClassifyError, ConfigError, FrameStatus, Grid, GridOrder, Pipeline, PipelineError,
    PipelineParams, SkipReason, Symbol, SymbolGrid,
};

const CELL: u32 = 30;
const QUAD: [(f32, f32); 4] = [(60.0, 50.0), (340.0, 62.0), (332.0, 345.0), (48.0, 330.0)];
const GIVENS: [(usize, usize, &str); 5] = [(0, 1, "3"), (2, 4, "7"), (4, 4, "5"), (6, 2, "1"), (8, 8, "9")];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Printed board: thick outer frame, thin cell lines, black digits.
fn flat_board(n: u32, givens: &[(usize, usize, &str)]) -> RgbImage {
    let side = n * CELL;
    let black = Rgb([0, 0, 0]);
    let mut board = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
    for k in 0..=n {
        let (t, pos) = match k {
            0 => (4, 0),
            k if k == n => (4, side as i32 - 4),
            k => (2, (k * CELL) as i32 - 1),
        };
        draw_filled_rect_mut(&mut board, Rect::at(pos, 0).of_size(t, side), black);
        draw_filled_rect_mut(&mut board, Rect::at(0, pos).of_size(side, t), black);
    }

    let font = StrokeFont::default();
    for &(row, col, text) in givens {
        let (w, h) = font.measure(text, 18.0);
        let x = (col as u32 * CELL) as i32 + (CELL as i32 - w as i32) / 2;
        let y = (row as u32 * CELL) as i32 + (CELL as i32 - h as i32) / 2;
        font.draw_mut(&mut board, text, x, y, 18.0, black);
    }
    board
}

/// The board seen in perspective on a grey table.
fn photograph(board: &RgbImage) -> RgbImage {
    let quad = QUAD.map(|(x, y)| Point2::new(x, y));
    let h_board_from_img = homography_from_4pt(&quad, &square_corners(board.width())).unwrap();
    let max = (board.width() - 1) as f32;
    RgbImage::from_fn(400, 400, |x, y| {
        let p = h_board_from_img.apply(Point2::new(x as f32, y as f32));
        if p.x >= 0.0 && p.y >= 0.0 && p.x <= max && p.y <= max {
            sample_bilinear(board, p.x, p.y)
        } else {
            Rgb([200, 200, 200])
        }
    })
}

fn sudoku_photo() -> RgbImage {
    photograph(&flat_board(9, &GIVENS))
}

fn always_one(_: &GrayImage) -> Result<Symbol, ClassifyError> {
    Ok(Symbol::new(1, GridOrder::SUDOKU)?)
}

fn fill_blanks_with_two(puzzle: &SymbolGrid) -> Option<Grid<Symbol>> {
    let order = puzzle.order();
    let two = Symbol::new(2, order).ok()?;
    Some(Grid::from_fn(order, |r, c| puzzle[(r, c)].unwrap_or(two)))
}

fn never_solves(_: &SymbolGrid) -> Option<Grid<Symbol>> {
    None
}

fn without_label() -> PipelineParams {
    PipelineParams {
        label: LabelStyle {
            enabled: false,
            ..LabelStyle::default()
        },
        ..PipelineParams::default()
    }
}

/// Image position of a point given in rectified-board pixels.
fn board_to_photo(board_side: u32, x: f32, y: f32) -> (u32, u32) {
    let quad = QUAD.map(|(x, y)| Point2::new(x, y));
    let h = homography_from_4pt(&square_corners(board_side), &quad).unwrap();
    let p = h.apply(Point2::new(x, y));
    (p.x.round() as u32, p.y.round() as u32)
}

#[test]
fn photo_without_board_passes_through() {
    init_logging();
    let photo = RgbImage::from_pixel(320, 240, Rgb([180, 170, 160]));
    let pipeline = Pipeline::new(PipelineParams::default(), always_one, fill_blanks_with_two);

    let report = pipeline.process_frame(&photo).unwrap();
    assert_eq!(report.status, FrameStatus::Skipped(SkipReason::BoundaryNotFound));
    assert_eq!(report.output, photo);
    assert!(report.corners.is_none());
}

#[test]
fn board_too_small_to_split_is_degenerate() {
    init_logging();
    let mut photo = RgbImage::from_pixel(100, 100, Rgb([200, 200, 200]));
    draw_filled_rect_mut(&mut photo, Rect::at(40, 40).of_size(8, 8), Rgb([0, 0, 0]));
    let params = PipelineParams {
        threshold: ThresholdParams {
            mode: ThresholdMode::Otsu,
            blur_sigma: 0.0,
            ..ThresholdParams::default()
        },
        ..PipelineParams::default()
    };
    let pipeline = Pipeline::new(params.clone(), always_one, fill_blanks_with_two);

    let report = pipeline.process_frame(&photo).unwrap();
    assert_eq!(report.status, FrameStatus::Skipped(SkipReason::DegenerateCorners));
    assert!(report.puzzle.is_none());

    let corners = report.corners.unwrap();
    assert_eq!(corners.to_pixels(), [(40, 40), (47, 40), (47, 47), (40, 47)]);

    let boundary = locate_board(&binarize(&photo, &params.threshold), &params.locator).unwrap();
    let mut expected = photo.clone();
    annotate_boundary_mut(&mut expected, &boundary, &params.annotation);
    assert_eq!(report.output, expected);
}

#[test]
fn custom_cleaner_decides_which_cells_are_blank() {
    init_logging();
    let all_blank = |cell: &GrayImage| CleanedCell::blank(cell.clone());
    let pipeline =
        Pipeline::new(without_label(), always_one, fill_blanks_with_two).with_cleaner(all_blank);

    let report = pipeline.process_frame(&sudoku_photo()).unwrap();
    assert!(report.is_solved(), "status {:?}", report.status);
    let puzzle = report.puzzle.unwrap();
    assert!(puzzle.iter().all(|(_, s)| s.is_none()));
    assert_eq!(puzzle.blank_count(), 81);
}

#[test]
fn solved_frame_changes_only_the_board_region() {
    init_logging();
    let photo = sudoku_photo();
    let pipeline = Pipeline::new(without_label(), always_one, fill_blanks_with_two);

    let report = pipeline.process_frame(&photo).unwrap();
    assert!(report.is_solved(), "status {:?}", report.status);

    let corners = report.corners.unwrap();
    for (got, want) in corners.to_array().iter().zip(QUAD) {
        assert!(
            (got.x - want.0).abs() <= 3.0 && (got.y - want.1).abs() <= 3.0,
            "corner {got:?} vs {want:?}"
        );
    }

    let puzzle = report.puzzle.as_ref().unwrap();
    for (row, col, _) in GIVENS {
        assert!(puzzle[(row, col)].is_some(), "given at ({row}, {col}) missed");
    }
    assert_eq!(puzzle.blank_count(), 81 - GIVENS.len());

    for (x, y, p) in report.output.enumerate_pixels() {
        if x < 36 || x > 356 || y < 38 || y > 358 {
            assert_eq!(p, photo.get_pixel(x, y), "pixel ({x}, {y}) outside the board changed");
        }
    }

    // Solved "2" painted near the center of blank cell (1, 1).
    let (cx, cy) = board_to_photo(9 * CELL, 1.5 * CELL as f32, 1.5 * CELL as f32);
    let red = (cx - 10..cx + 10)
        .flat_map(|x| (cy - 10..cy + 10).map(move |y| (x, y)))
        .any(|(x, y)| {
            let p = report.output.get_pixel(x, y).0;
            p[0] > 180 && p[1] < 100 && p[2] < 100
        });
    assert!(red, "no overlay ink near ({cx}, {cy})");
}

#[test]
fn unsolvable_frame_is_the_annotated_photo() {
    init_logging();
    let photo = sudoku_photo();
    let pipeline = Pipeline::new(PipelineParams::default(), always_one, never_solves);

    let report = pipeline.process_frame(&photo).unwrap();
    assert_eq!(report.status, FrameStatus::Skipped(SkipReason::Unsolvable));
    assert!(report.puzzle.is_some());
    assert!(report.solution.is_none());

    let boundary = locate_board(
        &binarize(&photo, &ThresholdParams::default()),
        &LocatorParams::default(),
    )
    .unwrap();
    let mut expected = photo.clone();
    annotate_boundary_mut(&mut expected, &boundary, &AnnotationStyle::default());
    assert_eq!(report.output, expected);
}

#[test]
fn classifier_failure_names_the_cell() {
    init_logging();
    let failing = |_: &GrayImage| -> Result<Symbol, ClassifyError> {
        Err(ClassifyError::Model("weights missing".into()))
    };
    let pipeline = Pipeline::new(PipelineParams::default(), failing, fill_blanks_with_two);

    match pipeline.process_frame(&sudoku_photo()) {
        Err(PipelineError::Classifier { row, col, .. }) => assert_eq!((row, col), (0, 1)),
        other => panic!("expected classifier error, got {:?}", other.map(|r| r.status)),
    }
}

#[test]
fn solver_that_rewrites_givens_is_rejected() {
    init_logging();
    let rewrite = |p: &SymbolGrid| -> Option<Grid<Symbol>> {
        let three = Symbol::new(3, p.order()).ok()?;
        Some(Grid::from_fn(p.order(), |_, _| three))
    };
    let pipeline = Pipeline::new(PipelineParams::default(), always_one, rewrite);

    assert!(matches!(
        pipeline.process_frame(&sudoku_photo()),
        Err(PipelineError::InvalidSolution { row: 0, col: 1 })
    ));
}

#[test]
fn bare_overlay_blacks_out_given_cells() {
    init_logging();
    let photo = sudoku_photo();
    let params = PipelineParams {
        keep_board: false,
        ..without_label()
    };
    let pipeline = Pipeline::new(params, always_one, fill_blanks_with_two);

    let report = pipeline.process_frame(&photo).unwrap();
    assert!(report.is_solved());

    let (cx, cy) = board_to_photo(9 * CELL, 4.5 * CELL as f32, 4.5 * CELL as f32);
    for y in cy - 4..=cy + 4 {
        for x in cx - 4..=cx + 4 {
            assert_eq!(report.output.get_pixel(x, y), &Rgb([0, 0, 0]));
        }
    }
}

#[test]
fn elapsed_label_is_stamped_on_solved_frames() {
    init_logging();
    let params = PipelineParams {
        annotate: false,
        ..PipelineParams::default()
    };
    let style = params.label.clone();
    let pipeline = Pipeline::new(params, always_one, fill_blanks_with_two);

    let report = pipeline.process_frame(&sudoku_photo()).unwrap();
    assert!(report.is_solved());

    let [lx, ly] = style.position;
    let stamped = (lx as u32..lx as u32 + 80)
        .flat_map(|x| (ly as u32..ly as u32 + 24).map(move |y| (x, y)))
        .any(|(x, y)| report.output.get_pixel(x, y).0 == style.color);
    assert!(stamped);
}

#[test]
fn grid_order_is_configurable() {
    init_logging();
    let givens = [(0, 0, "4"), (3, 2, "1")];
    let photo = photograph(&flat_board(4, &givens));
    let params = PipelineParams {
        order: GridOrder::new(4).unwrap(),
        ..without_label()
    };
    let pipeline = Pipeline::new(params, always_one, fill_blanks_with_two);

    let report = pipeline.process_frame(&photo).unwrap();
    assert!(report.is_solved(), "status {:?}", report.status);
    let puzzle = report.puzzle.unwrap();
    assert_eq!(puzzle.order().get(), 4);
    assert_eq!(puzzle.blank_count(), 16 - givens.len());
    assert!(puzzle[(0, 0)].is_some() && puzzle[(3, 2)].is_some());
}

#[test]
fn params_round_trip_through_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");

    let params = PipelineParams {
        order: GridOrder::new(6).unwrap(),
        keep_board: false,
        ..PipelineParams::default()
    };
    params.write_json(&path).unwrap();
    assert_eq!(PipelineParams::load_json(&path).unwrap(), params);

    assert!(matches!(
        PipelineParams::load_json(dir.path().join("missing.json")),
        Err(ConfigError::Io(_))
    ));
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        PipelineParams::load_json(&path),
        Err(ConfigError::Json(_))
    ));
}
