//! The N×N grid model shared by partitioning, classification, solving and
//! overlay composition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOrderError {
    #[error("grid order must be in 1..={max}, got {got}")]
    OutOfRange { got: usize, max: usize },
}

/// Number of cells per side of the board.
///
/// Every stage receives the order explicitly; 9 is only the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct GridOrder(usize);

impl GridOrder {
    /// Largest order whose symbols still fit a `u8`.
    pub const MAX: usize = u8::MAX as usize;

    pub const SUDOKU: GridOrder = GridOrder(9);

    pub fn new(n: usize) -> Result<Self, GridOrderError> {
        if n == 0 || n > Self::MAX {
            return Err(GridOrderError::OutOfRange {
                got: n,
                max: Self::MAX,
            });
        }
        Ok(Self(n))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    #[inline]
    pub fn cell_count(self) -> usize {
        self.0 * self.0
    }
}

impl Default for GridOrder {
    fn default() -> Self {
        Self::SUDOKU
    }
}

impl TryFrom<usize> for GridOrder {
    type Error = GridOrderError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<GridOrder> for usize {
    fn from(order: GridOrder) -> usize {
        order.0
    }
}

impl fmt::Display for GridOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.0, self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol {value} outside 1..={max}")]
    OutOfRange { value: usize, max: usize },
}

/// A printed or solved cell value, `1..=N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(u8);

impl Symbol {
    pub fn new(value: usize, order: GridOrder) -> Result<Self, SymbolError> {
        if value == 0 || value > order.get() {
            return Err(SymbolError::OutOfRange {
                value,
                max: order.get(),
            });
        }
        Ok(Self(value as u8))
    }

    /// Symbol from a zero-based class index, as produced by classifiers.
    pub fn from_class_index(index: usize, order: GridOrder) -> Result<Self, SymbolError> {
        Self::new(index + 1, order)
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row-major N×N container indexed by `(row, col)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    order: GridOrder,
    cells: Vec<T>,
}

/// Per-cell recognised symbols; `None` marks a blank cell.
pub type SymbolGrid = Grid<Option<Symbol>>;

impl<T> Grid<T> {
    pub fn from_fn<F>(order: GridOrder, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let n = order.get();
        let mut cells = Vec::with_capacity(order.cell_count());
        for row in 0..n {
            for col in 0..n {
                cells.push(f(row, col));
            }
        }
        Self { order, cells }
    }

    /// Build from nested rows; `None` unless the rows form an N×N square.
    pub fn from_rows(order: GridOrder, rows: Vec<Vec<T>>) -> Option<Self> {
        let n = order.get();
        if rows.len() != n || rows.iter().any(|r| r.len() != n) {
            return None;
        }
        let cells = rows.into_iter().flatten().collect();
        Some(Self { order, cells })
    }

    #[inline]
    pub fn order(&self) -> GridOrder {
        self.order
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        let n = self.order.get();
        if row >= n || col >= n {
            return None;
        }
        self.cells.get(row * n + col)
    }

    /// Cells with their `(row, col)` coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let n = self.order.get();
        self.cells
            .iter()
            .enumerate()
            .map(move |(k, v)| ((k / n, k % n), v))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks(self.order.get())
    }

    pub fn map<U, F>(&self, mut f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            order: self.order,
            cells: self.cells.iter().map(&mut f).collect(),
        }
    }

    pub fn into_map<U, F>(self, f: F) -> Grid<U>
    where
        F: FnMut(T) -> U,
    {
        Grid {
            order: self.order,
            cells: self.cells.into_iter().map(f).collect(),
        }
    }

    /// Fallible row-major map that stops at the first error, reporting the
    /// failing `(row, col)`.
    pub fn try_map<U, E, F>(&self, mut f: F) -> Result<Grid<U>, E>
    where
        F: FnMut((usize, usize), &T) -> Result<U, E>,
    {
        let mut cells = Vec::with_capacity(self.cells.len());
        for (rc, v) in self.iter() {
            cells.push(f(rc, v)?);
        }
        Ok(Grid {
            order: self.order,
            cells,
        })
    }
}

impl SymbolGrid {
    pub fn blank_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        let n = self.order.get();
        assert!(row < n && col < n, "cell ({row}, {col}) outside {}", self.order);
        &self.cells[row * n + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        let n = self.order.get();
        assert!(row < n && col < n, "cell ({row}, {col}) outside {}", self.order);
        &mut self.cells[row * n + col]
    }
}
