use image::{ImageBuffer, Pixel};
use sudoku_lens_core::{Grid, GridOrder};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    #[error("board image must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
    #[error("{side}px board is too small for a {order} grid")]
    CellTooSmall { side: u32, order: GridOrder },
}

/// Cell side for an `S`-pixel board: `S / N`, truncated.
///
/// The rightmost and bottom `S mod N` pixel strips belong to no cell.
#[inline]
pub fn cell_side(side: u32, order: GridOrder) -> u32 {
    side / order.get() as u32
}

/// Cut a square board into N×N equal cells.
///
/// Cell `(row, col)` covers pixels `[col·w, (col+1)·w) × [row·w, (row+1)·w)`
/// with `w` = [`cell_side`].
pub fn split_into_cells<P>(
    board: &ImageBuffer<P, Vec<u8>>,
    order: GridOrder,
) -> Result<Grid<ImageBuffer<P, Vec<u8>>>, PartitionError>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = board.dimensions();
    if width != height {
        return Err(PartitionError::NotSquare { width, height });
    }

    let w = cell_side(width, order);
    if w == 0 {
        return Err(PartitionError::CellTooSmall { side: width, order });
    }

    log::trace!("splitting {width}px board into {order} cells of {w}px");
    Ok(Grid::from_fn(order, |row, col| {
        let x0 = col as u32 * w;
        let y0 = row as u32 * w;
        ImageBuffer::from_fn(w, w, |x, y| *board.get_pixel(x0 + x, y0 + y))
    }))
}
