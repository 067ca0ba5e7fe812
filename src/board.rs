//! The grid of cells and every operation that touches it.

use std::fmt::{self, Display};
use std::ops::Index;

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::error::{GameError, Result};

/// Offsets of the eight surrounding cells, clockwise from the top-left.
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// A position on the board as `(row, col)`.
///
/// Components are signed so that any integer the player types can be
/// represented and rejected if it falls outside the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position(pub isize, pub isize);

/// A single cell of the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    row: usize,
    col: usize,
    adjacent: u8,
    mined: bool,
    covered: bool,
    flagged: bool,
}

impl Cell {
    fn new(row: usize, col: usize) -> Cell {
        Cell {
            row,
            col,
            adjacent: 0,
            mined: false,
            covered: true,
            flagged: false,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Number of mined cells among the eight neighbours.
    pub fn adjacent_mine_count(&self) -> u8 {
        self.adjacent
    }

    pub fn is_mined(&self) -> bool {
        self.mined
    }

    pub fn is_covered(&self) -> bool {
        self.covered
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// What the player sees for this cell.
    pub fn token(&self) -> Token {
        match self {
            Cell { flagged: true, .. } => Token::Flag,
            Cell { covered: true, .. } => Token::Covered,
            Cell { mined: true, .. } => Token::Mine,
            Cell { adjacent: 0, .. } => Token::Empty,
            Cell { adjacent, .. } => Token::Count(*adjacent),
        }
    }
}

/// Display token of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Flag,
    Covered,
    Mine,
    Empty,
    Count(u8),
}

impl Display for Token {
    /// Display a token.
    ///
    /// | Token      | Char |
    /// | ---------- | ---- |
    /// | `Flag`     | `P`  |
    /// | `Covered`  | `#`  |
    /// | `Mine`     | `*`  |
    /// | `Empty`    | `.`  |
    /// | `Count(n)` | `n`  |
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Flag => f.pad("P"),
            Token::Covered => f.pad("#"),
            Token::Mine => f.pad("*"),
            Token::Empty => f.pad("."),
            Token::Count(n) => f.pad(&n.to_string()),
        }
    }
}

/// Result of uncovering a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Uncover {
    /// Safe cell, play goes on.
    Continue,
    /// Mine detonated; the whole board has been revealed.
    HitMine,
    /// Target is flagged, nothing changed.
    Flagged,
}

/// Result of toggling a flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    Flagged,
    Unflagged,
}

/// Rectangular minefield.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    mines: usize,
    cells: Vec<Cell>,
}

// Construction
impl Board {
    /// Create a board with `mines` mines placed uniformly at random.
    ///
    /// Each mine is placed by drawing random cells until an unmined one turns
    /// up, so no cell ever holds two mines.
    pub fn create<R>(rows: isize, cols: isize, mines: isize, rng: &mut R) -> Result<Board>
    where
        R: Rng + ?Sized,
    {
        let mut board = Board::blank(rows, cols, mines)?;

        let mut draws = 0usize;
        for _ in 0..board.mines {
            loop {
                draws += 1;
                let row = rng.gen_range(0..board.rows);
                let col = rng.gen_range(0..board.cols);
                let cell = &mut board.cells[row * board.cols + col];
                if !cell.mined {
                    cell.mined = true;
                    break;
                }
            }
        }
        if draws > 2 * board.cells.len() {
            warn!(draws, mines = board.mines, "dense board needed many draws to place mines");
        }

        board.count_adjacent();
        debug!(rows = board.rows, cols = board.cols, mines = board.mines, "created board");
        Ok(board)
    }

    /// Create a board with mines at exactly the given positions.
    pub fn with_mines(rows: isize, cols: isize, mines: &[Position]) -> Result<Board> {
        let count = isize::try_from(mines.len()).unwrap_or(isize::MAX);
        let mut board = Board::blank(rows, cols, count)?;

        for &pos in mines {
            let idx = board.offset(pos)?;
            if board.cells[idx].mined {
                return Err(GameError::InvalidDimensions { rows, cols, mines: count });
            }
            board.cells[idx].mined = true;
        }

        board.count_adjacent();
        Ok(board)
    }

    /// Allocate an all-covered board without mines after validating its shape.
    fn blank(rows: isize, cols: isize, mines: isize) -> Result<Board> {
        let invalid = || GameError::InvalidDimensions { rows, cols, mines };

        let (r, c, m) = match (
            usize::try_from(rows),
            usize::try_from(cols),
            usize::try_from(mines),
        ) {
            (Ok(r), Ok(c), Ok(m)) if r > 0 && c > 0 => (r, c, m),
            _ => return Err(invalid()),
        };
        let area = r.checked_mul(c).ok_or_else(invalid)?;
        if m >= area {
            return Err(invalid());
        }

        let cells = (0..area).map(|i| Cell::new(i / c, i % c)).collect();
        Ok(Board {
            rows: r,
            cols: c,
            mines: m,
            cells,
        })
    }

    /// Increment the count of every neighbour of every mine.
    fn count_adjacent(&mut self) {
        for idx in 0..self.cells.len() {
            if self.cells[idx].mined {
                for n in self.neighbors(idx) {
                    self.cells[n].adjacent += 1;
                }
            }
        }
    }
}

// Accessors
impl Board {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    /// Borrow the cell at a position, if it is on the board.
    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.offset(pos).ok().map(|idx| &self.cells[idx])
    }

    /// Iterate over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Number of cells still covered.
    pub fn covered_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.covered).count()
    }

    /// Number of flagged cells.
    pub fn flagged_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.flagged).count()
    }

    /// Flat index of an in-bounds position.
    fn offset(&self, pos: Position) -> Result<usize> {
        let Position(row, col) = pos;
        match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < self.rows && c < self.cols => Ok(r * self.cols + c),
            _ => Err(GameError::OutOfBounds { row, col }),
        }
    }

    /// Flat indices of the in-bounds neighbours of `idx`.
    fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> {
        let (rows, cols) = (self.rows as isize, self.cols as isize);
        let (row, col) = ((idx / self.cols) as isize, (idx % self.cols) as isize);
        NEIGHBORS.iter().filter_map(move |&(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            ((0..rows).contains(&r) && (0..cols).contains(&c)).then(|| (r * cols + c) as usize)
        })
    }
}

impl Index<Position> for Board {
    type Output = Cell;

    /// # Panics
    ///
    /// Will panic if `pos` is out of bounds.
    fn index(&self, pos: Position) -> &Self::Output {
        match self.cell(pos) {
            Some(cell) => cell,
            None => panic!(
                "position {:?} is outside the {}x{} board",
                pos, self.rows, self.cols
            ),
        }
    }
}

// Game logic
impl Board {
    /// Uncover a cell.
    ///
    /// Uncovering a zero spreads to every covered, unflagged neighbour until
    /// the revealed region is bordered by numbered cells. Hitting a mine
    /// uncovers the whole board.
    pub fn uncover(&mut self, pos: Position) -> Result<Uncover> {
        let idx = self.offset(pos)?;
        let target = &self.cells[idx];

        if target.flagged {
            return Ok(Uncover::Flagged);
        }
        if target.mined {
            for cell in self.cells.iter_mut() {
                cell.covered = false;
            }
            return Ok(Uncover::HitMine);
        }
        if !target.covered {
            return Ok(Uncover::Continue);
        }

        // Cells are marked uncovered as they are pushed, so each is visited once
        let mut pending = vec![idx];
        self.cells[idx].covered = false;
        let mut revealed = 1usize;
        while let Some(idx) = pending.pop() {
            if self.cells[idx].adjacent != 0 {
                continue;
            }
            for n in self.neighbors(idx) {
                let cell = &mut self.cells[n];
                if cell.covered && !cell.flagged {
                    cell.covered = false;
                    revealed += 1;
                    pending.push(n);
                }
            }
        }
        trace!(?pos, revealed, "uncovered region");

        Ok(Uncover::Continue)
    }

    /// Flag or unflag a covered cell.
    pub fn toggle_flag(&mut self, pos: Position) -> Result<Flag> {
        let idx = self.offset(pos)?;
        let cell = &mut self.cells[idx];

        if !cell.covered {
            let Position(row, col) = pos;
            return Err(GameError::AlreadyUncovered { row, col });
        }
        cell.flagged = !cell.flagged;
        Ok(if cell.flagged {
            Flag::Flagged
        } else {
            Flag::Unflagged
        })
    }

    /// Check if every mine is flagged and every safe cell is uncovered.
    pub fn is_won(&self) -> bool {
        self.cells.iter().all(|cell| {
            if cell.mined {
                cell.flagged
            } else {
                !cell.covered
            }
        })
    }

    /// Display tokens of every cell, one inner vector per row.
    pub fn render(&self) -> Vec<Vec<Token>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(Cell::token).collect())
            .collect()
    }
}

impl Display for Board {
    /// Display the grid with column numbers on top and row numbers on the left.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = (self.rows - 1).to_string().len();
        let width = (self.cols - 1).to_string().len() + 1;

        write!(f, "{}", " ".repeat(label))?;
        for col in 0..self.cols {
            write!(f, "{:>width$}", col)?;
        }
        writeln!(f)?;

        for (row, tokens) in self.render().iter().enumerate() {
            write!(f, "{:>label$}", row)?;
            for token in tokens {
                write!(f, "{:>width$}", token)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
