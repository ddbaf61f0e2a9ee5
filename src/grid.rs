//! Grid model: the playfield matrix of cells and the active-form projection.

use crate::form::{FORM_COLORS, Form};

/// Packed `0xAARRGGBB` colour, the layout the pixel renderer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba(pub u32);

impl Rgba {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }
}

/// Fixed colours the cell states map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Form colours, picked by `Form::color_index`.
    pub forms: [Rgba; FORM_COLORS as usize],
    /// Empty cells.
    pub background: Rgba,
    /// Rows in the first phase of a clear.
    pub highlight: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            forms: [
                Rgba::from_rgb(255, 0, 0),
                Rgba::from_rgb(0, 255, 0),
                Rgba::from_rgb(0, 0, 255),
            ],
            background: Rgba::from_rgb(0, 0, 0),
            highlight: Rgba::from_rgb(255, 255, 255),
        }
    }
}

impl Palette {
    #[inline]
    pub fn form_color(&self, index: u8) -> Rgba {
        self.forms[(index % FORM_COLORS) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Empty,
    Filled,
    Active,
    Clearing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub color: Rgba,
    pub state: CellState,
}

impl Cell {
    pub const fn empty(background: Rgba) -> Self {
        Self {
            color: background,
            state: CellState::Empty,
        }
    }
}

/// Playfield: `rows` x `cols` cells, row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
    palette: Palette,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, palette: Palette) -> Self {
        let cells = (0..rows)
            .map(|_| vec![Cell::empty(palette.background); cols])
            .collect();
        Self {
            rows,
            cols,
            cells,
            palette,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[cfg(test)]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Signed lookup; anything off the grid is `None`.
    #[inline]
    pub fn get_signed(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.get(row as usize, col as usize)
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = cell;
        }
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.iter().map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn count_state(&self, state: CellState) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.state == state)
            .count()
    }

    /// Marks an occupied cell `Filled` with the given form colour. Builds
    /// stacks directly without dropping forms.
    #[cfg(test)]
    pub fn fill(&mut self, row: usize, col: usize, color_index: u8) {
        let color = self.palette.form_color(color_index);
        self.set(
            row,
            col,
            Cell {
                color,
                state: CellState::Filled,
            },
        );
    }

    /// Resets every `Active` cell to empty background.
    pub fn clear_active_projection(&mut self) {
        let empty = Cell::empty(self.palette.background);
        for cell in self.cells.iter_mut().flatten() {
            if cell.state == CellState::Active {
                *cell = empty;
            }
        }
    }

    /// Marks the cells covered by `form` as `Active`. Cells off the grid are skipped.
    pub fn paint_active_projection(&mut self, form: &Form) {
        let color = self.palette.form_color(form.color_index);
        for (row, col) in form.cells() {
            if row < 0 || col < 0 {
                continue;
            }
            self.set(
                row as usize,
                col as usize,
                Cell {
                    color,
                    state: CellState::Active,
                },
            );
        }
    }

    /// Commits the active projection: every `Active` cell becomes `Filled`, colour kept.
    pub fn lock_active_to_filled(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            if cell.state == CellState::Active {
                cell.state = CellState::Filled;
            }
        }
    }

    /// First clear phase: the whole row turns to highlighted `Clearing` cells.
    pub fn mark_row_clearing(&mut self, row: usize) {
        let cell = Cell {
            color: self.palette.highlight,
            state: CellState::Clearing,
        };
        if let Some(r) = self.cells.get_mut(row) {
            r.fill(cell);
        }
    }

    pub fn empty_row(&mut self, row: usize) {
        let cell = Cell::empty(self.palette.background);
        if let Some(r) = self.cells.get_mut(row) {
            r.fill(cell);
        }
    }

    /// Moves the `Filled` cells of every row above `row` down by one. Source cells
    /// are emptied as they move, so row 0 ends up empty of `Filled` cells.
    pub fn shift_filled_down_into(&mut self, row: usize) {
        let empty = Cell::empty(self.palette.background);
        for dst in (1..=row.min(self.rows.saturating_sub(1))).rev() {
            let src = dst - 1;
            for col in 0..self.cols {
                let above = self.cells[src][col];
                if above.state == CellState::Filled {
                    self.cells[dst][col] = above;
                    self.cells[src][col] = empty;
                }
            }
        }
    }
}
