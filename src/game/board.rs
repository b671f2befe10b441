use std::fmt;

use super::Cell;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Number of same-colour discs in a line needed to win.
const CONNECT: usize = 4;

/// Axes checked around the last disc: horizontal, vertical and both diagonals.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 6x7 connect-four board. Row 0 is the top, row 5 is the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropError {
    ColumnFull,
    InvalidColumn,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Build a board from raw cells. Floating discs are not rejected.
    pub fn from_cells(cells: [[Cell; COLS]; ROWS]) -> Self {
        Board { cells }
    }

    /// Get the cell at a specific position
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn cells(&self) -> &[[Cell; COLS]; ROWS] {
        &self.cells
    }

    /// Check if a column is full. Out-of-range columns count as full.
    pub fn is_column_full(&self, col: usize) -> bool {
        if col >= COLS {
            return true;
        }
        self.cells[0][col] != Cell::Empty
    }

    /// Lowest empty row in a column, where the next disc would land.
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).rev().find(|&row| self.cells[row][col] == Cell::Empty)
    }

    /// Drop a piece in a column, returns the row where it landed
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> Result<usize, DropError> {
        if col >= COLS {
            return Err(DropError::InvalidColumn);
        }
        let row = self.landing_row(col).ok_or(DropError::ColumnFull)?;
        self.cells[row][col] = cell;
        Ok(row)
    }

    /// Columns that can still take a disc, in ascending order.
    pub fn open_columns(&self) -> Vec<usize> {
        (0..COLS).filter(|&col| !self.is_column_full(col)).collect()
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// Check if the disc at (row, col) completes a line.
    ///
    /// Only the four axes through that cell are scanned, walking outward in
    /// both directions.
    pub fn check_win(&self, row: usize, col: usize) -> bool {
        let cell = self.get(row, col);
        if cell == Cell::Empty {
            return false;
        }

        AXES.iter()
            .any(|&(dr, dc)| self.streak(row, col, dr, dc, cell) >= CONNECT)
    }

    /// Length of the run of `cell` through (row, col) along one axis.
    fn streak(&self, row: usize, col: usize, dr: isize, dc: isize, cell: Cell) -> usize {
        1 + self.count_from(row, col, dr, dc, cell) + self.count_from(row, col, -dr, -dc, cell)
    }

    fn count_from(&self, row: usize, col: usize, dr: isize, dc: isize, cell: Cell) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && self.cells[r as usize][c as usize] == cell
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    /// Any line of four for `cell` anywhere on the board.
    pub fn has_line(&self, cell: Cell) -> bool {
        (0..ROWS).any(|row| {
            (0..COLS).any(|col| self.cells[row][col] == cell && self.check_win(row, col))
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for col in 0..COLS {
            write!(f, " {col}")?;
        }
        writeln!(f)?;
        for (row, cells) in self.cells.iter().enumerate() {
            write!(f, "{row}")?;
            for cell in cells {
                write!(f, " {}", cell.to_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
