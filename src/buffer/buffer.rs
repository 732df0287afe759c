//! Buffer: A fixed grid of cells holding one frame.
//!
//! Cells are stored row-major in a contiguous `Vec`:
//! `index = y * width + x`.

use super::cell::{Cell, Style};

/// A grid of cells representing one painted frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
}

impl Buffer {
    /// Create a new buffer with every cell empty.
    ///
    /// # Panics
    /// Panics if width or height is 0.
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0 && height > 0, "Buffer dimensions must be non-zero");
        Self {
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
            width,
            height,
        }
    }

    /// Buffer width in columns.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in rows.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Underlying cells, row-major.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Convert (x, y) to a linear index, `None` when out of bounds.
    #[inline]
    pub fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// Cell at (x, y).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Set a cell at (x, y). Returns `false` if out of bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        if let Some(idx) = self.index_of(x, y) {
            self.cells[idx] = cell;
            true
        } else {
            false
        }
    }

    /// Write `text` starting at (x, y), clipped at the right edge.
    ///
    /// Returns the number of columns used.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            let cell = Cell::new(ch).with_style(style);
            let width = u16::from(cell.display_width());
            if col.saturating_add(width) > self.width {
                break;
            }
            self.set(col, y, cell);
            if width == 2 {
                self.set(col + 1, y, Cell::continuation(style));
            }
            col += width;
        }
        col - x
    }

    /// Fill `width` cells of row `y` starting at `x` with blanks in `style`.
    pub fn fill_span(&mut self, x: u16, y: u16, width: u16, style: Style) {
        let end = x.saturating_add(width).min(self.width);
        for col in x..end {
            self.set(col, y, Cell::EMPTY.with_style(style));
        }
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Copy content from a buffer of the same dimensions.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        self.cells.copy_from_slice(&other.cells);
    }

    /// Row `y` as plain text, trailing blanks trimmed.
    pub fn row_text(&self, y: u16) -> String {
        let Some(start) = self.index_of(0, y) else {
            return String::new();
        };
        let row = &self.cells[start..start + usize::from(self.width)];
        let text: String = row
            .iter()
            .filter(|cell| !cell.is_continuation())
            .map(Cell::glyph)
            .collect();
        text.trim_end().to_string()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
