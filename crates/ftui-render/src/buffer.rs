#![forbid(unsafe_code)]

//! Fixed-size 2-D cell grid: the rasterization target for a single frame.

use crate::cell::{Cell, CellColor, StyleFlags};
use crate::errors::RenderError;
use crate::grapheme_pool::GraphemePool;
use unicode_segmentation::UnicodeSegmentation;

/// A rectangular region, used by [`Buffer::clear_region`] and by the
/// rasterizer when placing `Box`/`Positioned` render nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// 1-indexed row of the top-left corner.
    pub row: usize,
    /// 1-indexed column of the top-left corner.
    pub col: usize,
    /// Width in columns.
    pub width: usize,
    /// Height in rows.
    pub height: usize,
}

/// A single in-bounds cell write, for [`Buffer::set_many`].
#[derive(Debug, Clone, Copy)]
pub struct CellWrite {
    /// 1-indexed row.
    pub row: usize,
    /// 1-indexed column.
    pub col: usize,
    /// The cell to write.
    pub cell: Cell,
}

/// A fixed-size, row-major grid of [`Cell`]s, 1-indexed in `(row, col)`.
///
/// Every in-bounds coordinate always has a value; there is no "unset" state.
/// A freshly constructed or resized buffer is filled with [`Cell::empty`].
#[derive(Debug, Clone)]
pub struct Buffer {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    pool: GraphemePool,
}

impl Buffer {
    /// Largest permitted row count.
    pub const MAX_ROWS: usize = 500;
    /// Largest permitted column count.
    pub const MAX_COLS: usize = 1000;

    /// Allocate a `rows`x`cols` grid, every cell initialized to
    /// [`Cell::empty`].
    pub fn new(rows: usize, cols: usize) -> Result<Self, RenderError> {
        Self::check_dimensions(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::empty(); rows * cols],
            pool: GraphemePool::new(),
        })
    }

    fn check_dimensions(rows: usize, cols: usize) -> Result<(), RenderError> {
        if rows == 0 || cols == 0 || rows > Self::MAX_ROWS || cols > Self::MAX_COLS {
            return Err(RenderError::DimensionsTooLarge {
                rows,
                cols,
                max_rows: Self::MAX_ROWS,
                max_cols: Self::MAX_COLS,
            });
        }
        Ok(())
    }

    /// Row count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row >= 1 && row <= self.rows && col >= 1 && col <= self.cols
    }

    fn index(&self, row: usize, col: usize) -> usize {
        (row - 1) * self.cols + (col - 1)
    }

    /// Read the cell at `(row, col)`. Returns [`Cell::empty`] if out of
    /// bounds; this accessor never fails.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Cell {
        if self.in_bounds(row, col) {
            self.cells[self.index(row, col)]
        } else {
            Cell::empty()
        }
    }

    /// Overwrite the cell at `(row, col)`. In-bounds writes are unconditional.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), RenderError> {
        if !self.in_bounds(row, col) {
            return Err(RenderError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let idx = self.index(row, col);
        self.cells[idx] = cell;
        Ok(())
    }

    /// Write a raw cell without bounds checking. Used by hot paths (e.g. the
    /// rasterizer) that have already validated the coordinate.
    #[inline]
    pub(crate) fn set_unchecked(&mut self, row: usize, col: usize, cell: Cell) {
        let idx = self.index(row, col);
        self.cells[idx] = cell;
    }

    /// Write every entry in `writes`, silently dropping out-of-bounds ones.
    pub fn set_many(&mut self, writes: &[CellWrite]) {
        for w in writes {
            if self.in_bounds(w.row, w.col) {
                self.set_unchecked(w.row, w.col, w.cell);
            }
        }
    }

    /// Reset every in-bounds cell of `rect` to [`Cell::empty`]. A no-op if
    /// `rect.width == 0` or `rect.height == 0`.
    pub fn clear_region(&mut self, rect: Rect) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        for r in rect.row..rect.row + rect.height {
            for c in rect.col..rect.col + rect.width {
                if self.in_bounds(r, c) {
                    self.set_unchecked(r, c, Cell::empty());
                }
            }
        }
    }

    /// Reset every cell to [`Cell::empty`].
    pub fn clear(&mut self) {
        self.cells.fill(Cell::empty());
    }

    /// Produce a new buffer of `(new_rows, new_cols)`, preserving content at
    /// every coordinate within both the old and new bounds. New cells are
    /// empty.
    pub fn resize(&self, new_rows: usize, new_cols: usize) -> Result<Self, RenderError> {
        let mut out = Self::new(new_rows, new_cols)?;
        let shared_rows = self.rows.min(new_rows);
        let shared_cols = self.cols.min(new_cols);
        for r in 1..=shared_rows {
            for c in 1..=shared_cols {
                out.set_unchecked(r, c, self.get(r, c));
            }
        }
        Ok(out)
    }

    /// Read an entire row in column order with one bulk lookup.
    #[must_use]
    pub fn row_cells(&self, row: usize) -> &[Cell] {
        if row < 1 || row > self.rows {
            return &[];
        }
        let start = (row - 1) * self.cols;
        &self.cells[start..start + self.cols]
    }

    /// Every cell in the buffer, in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The grapheme pool backing multi-codepoint glyphs written through
    /// [`Buffer::write_string`].
    #[must_use]
    pub fn grapheme_pool(&self) -> &GraphemePool {
        &self.pool
    }

    /// Walk `s` grapheme cluster by grapheme cluster starting at
    /// `(row, col)`, writing one cell per grapheme (and a style-inheriting
    /// placeholder cell after any wide primary). Returns the total column
    /// advance, including any overrun past the right edge.
    ///
    /// Writes whose target column has already run off the grid are still
    /// counted in the returned advance but are not written (same silent
    /// drop behavior as other out-of-bounds writes in this API).
    pub fn write_string(
        &mut self,
        row: usize,
        col: usize,
        s: &str,
        fg: CellColor,
        bg: CellColor,
        flags: StyleFlags,
    ) -> usize {
        let mut cursor = col;
        for grapheme in s.graphemes(true) {
            let cell = Cell::from_grapheme(&mut self.pool, grapheme, fg, bg, flags);
            let width = cell.width().max(1) as usize;
            if self.in_bounds(row, cursor) {
                self.set_unchecked(row, cursor, cell);
                if width == 2 && self.in_bounds(row, cursor + 1) {
                    self.set_unchecked(row, cursor + 1, Cell::placeholder(&cell));
                }
            }
            cursor += width;
        }
        cursor - col
    }

    /// Structural content equality: same dimensions and every cell equal.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.cells == other.cells
    }
}
