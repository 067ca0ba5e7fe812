//! # Minesweeper
//!
//! `minesweeper` is a library to handle the logic of the video game of the same name.
//!
//! A [`Minesweeper`] session owns at most one [`Board`] at a time and drives it
//! through already-parsed [`Command`]s. Turning text into commands and outcomes
//! into text is left to the caller.

use std::fmt::{self, Display};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

pub use board::{Board, Cell, Flag, Position, Token, Uncover};
pub use error::{GameError, Result};

mod board;
mod error;

/// Minesweeper game session.
pub struct Minesweeper<R = StdRng> {
    rng: R,
    board: Option<Board>,
    flagged: usize,
    status: Status,
}

impl Minesweeper {
    /// Create a session seeded from system entropy.
    pub fn new() -> Minesweeper {
        Minesweeper::with_rng(StdRng::from_entropy())
    }

    /// Create a session whose boards are reproducible from `seed`.
    pub fn with_seed(seed: u64) -> Minesweeper {
        Minesweeper::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Minesweeper {
    fn default() -> Self {
        Minesweeper::new()
    }
}

// Accessors
impl<R> Minesweeper<R> {
    /// Create a session drawing mine positions from `rng`.
    pub fn with_rng(rng: R) -> Minesweeper<R> {
        Minesweeper {
            rng,
            board: None,
            flagged: 0,
            status: Status::NoBoard,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Borrow the current board, if any.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Number of flags currently on the board.
    pub fn flags_placed(&self) -> usize {
        self.flagged
    }

    /// Number of mines on the current board.
    pub fn mines(&self) -> usize {
        self.board.as_ref().map_or(0, Board::mine_count)
    }

    /// Replace the current board.
    ///
    /// The flag count is taken from the flags already on `board`.
    pub fn start(&mut self, board: Board) {
        self.flagged = board.flagged_count();
        self.board = Some(board);
        self.status = Status::InProgress;
    }

    /// Borrow the board for viewing.
    pub fn show(&self) -> Result<&Board> {
        self.board.as_ref().ok_or(GameError::NoActiveBoard)
    }

    /// Borrow the board for a move, rejecting it unless a game is running.
    fn playable(&mut self) -> Result<&mut Board> {
        match self.status {
            Status::NoBoard => Err(GameError::NoActiveBoard),
            Status::Won | Status::Lost => Err(GameError::AlreadyTerminal),
            Status::InProgress => self.board.as_mut().ok_or(GameError::NoActiveBoard),
        }
    }

    /// Move to `Won` if the board is cleared.
    fn settle(&mut self) -> Outcome {
        match &self.board {
            Some(board) if board.is_won() => {
                info!(flags = self.flagged, "game won");
                self.status = Status::Won;
                Outcome::Won
            }
            _ => Outcome::Continue,
        }
    }
}

// Game logic
impl<R: Rng> Minesweeper<R> {
    /// Run a single command.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::New(config) => self.new_game(config),
            Command::Show => self.show().map(|_| Outcome::Continue),
            Command::Uncover(pos) => self.uncover(pos),
            Command::Flag(pos) => self.flag(pos),
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    /// Start a new game, discarding the current board.
    ///
    /// On error the session is left as it was.
    pub fn new_game(&mut self, config: Config) -> Result<Outcome> {
        let Config { rows, cols, mines } = config;
        let board = Board::create(rows, cols, mines, &mut self.rng)?;
        self.start(board);
        Ok(Outcome::Continue)
    }

    /// Uncover a cell.
    pub fn uncover(&mut self, pos: Position) -> Result<Outcome> {
        let board = self.playable()?;
        match board.uncover(pos)? {
            Uncover::HitMine => {
                info!(?pos, "mine detonated");
                self.status = Status::Lost;
                Ok(Outcome::Lost)
            }
            Uncover::Flagged => {
                let Position(row, col) = pos;
                Err(GameError::FlaggedCell { row, col })
            }
            Uncover::Continue => Ok(self.settle()),
        }
    }

    /// Flag or unflag a cell.
    ///
    /// Flagging the last mine can win the game.
    pub fn flag(&mut self, pos: Position) -> Result<Outcome> {
        let board = self.playable()?;
        match board.toggle_flag(pos)? {
            Flag::Flagged => self.flagged += 1,
            Flag::Unflagged => self.flagged -= 1,
        }
        Ok(self.settle())
    }
}

impl<R> Display for Minesweeper<R> {
    /// Display the board followed by mine and flag totals.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(board) = &self.board {
            write!(f, "{}", board)?;
        }
        writeln!(f, "Total Mines: {}", self.mines())?;
        write!(f, "Total flags used: {}", self.flagged)
    }
}

/// Dimensions and mine count of a new board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    rows: isize,
    cols: isize,
    mines: isize,
}

impl Config {
    /// Create a new Config.
    ///
    /// Values are validated when the board is built.
    pub fn new(rows: isize, cols: isize, mines: isize) -> Config {
        Config { rows, cols, mines }
    }
}

/// A command the session understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    New(Config),
    Show,
    Uncover(Position),
    Flag(Position),
    Quit,
}

/// Where the session stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    NoBoard,
    InProgress,
    Won,
    Lost,
}

/// What an accepted command led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Won,
    Lost,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Minesweeper {
        Minesweeper::with_seed(7)
    }

    /// 2x2 game with a single mine in the top-left corner.
    fn corner() -> Minesweeper {
        let mut game = setup();
        game.start(Board::with_mines(2, 2, &[Position(0, 0)]).unwrap());
        game
    }

    #[test]
    fn is_initially_empty() {
        let game = setup();

        assert_eq!(game.status(), Status::NoBoard);
        assert!(game.board().is_none());
        assert_eq!(game.flags_placed(), 0);
        assert_eq!(game.mines(), 0);
    }

    #[test]
    fn moves_need_a_board() {
        let mut game = setup();

        assert_eq!(game.uncover(Position(0, 0)), Err(GameError::NoActiveBoard));
        assert_eq!(game.flag(Position(0, 0)), Err(GameError::NoActiveBoard));
        assert_eq!(game.execute(Command::Show), Err(GameError::NoActiveBoard));
        assert_eq!(game.status(), Status::NoBoard);
    }

    #[test]
    fn new_game_works() {
        let mut game = setup();

        let outcome = game.execute(Command::New(Config::new(4, 5, 3)));
        assert_eq!(outcome, Ok(Outcome::Continue));
        assert_eq!(game.status(), Status::InProgress);
        assert_eq!(game.mines(), 3);
        let board = game.board().unwrap();
        assert_eq!((board.rows(), board.cols()), (4, 5));
    }

    #[test]
    fn invalid_new_game_keeps_session() {
        let mut game = corner();
        game.flag(Position(1, 1)).unwrap();

        assert_eq!(
            game.new_game(Config::new(2, 2, 4)),
            Err(GameError::InvalidDimensions { rows: 2, cols: 2, mines: 4 })
        );
        assert_eq!(game.status(), Status::InProgress);
        assert_eq!(game.flags_placed(), 1);
        assert_eq!(game.mines(), 1);
    }

    #[test]
    fn same_seed_same_board() {
        let mut a = Minesweeper::with_seed(42);
        let mut b = Minesweeper::with_seed(42);
        a.new_game(Config::new(9, 9, 10)).unwrap();
        b.new_game(Config::new(9, 9, 10)).unwrap();

        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn uncover_numbered_continues() {
        let mut game = corner();

        assert_eq!(game.uncover(Position(1, 1)), Ok(Outcome::Continue));
        assert_eq!(game.status(), Status::InProgress);
        let board = game.board().unwrap();
        assert!(board[Position(0, 1)].is_covered());
        assert!(board[Position(1, 0)].is_covered());
    }

    #[test]
    fn uncover_mine_loses() {
        let mut game = corner();

        assert_eq!(game.uncover(Position(0, 0)), Ok(Outcome::Lost));
        assert_eq!(game.status(), Status::Lost);
        assert_eq!(game.board().unwrap().covered_count(), 0);
    }

    #[test]
    fn uncover_empty_board_wins() {
        let mut game = setup();
        game.new_game(Config::new(3, 3, 0)).unwrap();

        assert_eq!(game.uncover(Position(1, 1)), Ok(Outcome::Won));
        assert_eq!(game.status(), Status::Won);
    }

    #[test]
    fn uncover_rejections_keep_state() {
        let mut game = corner();
        game.flag(Position(1, 1)).unwrap();

        assert_eq!(
            game.uncover(Position(1, 1)),
            Err(GameError::FlaggedCell { row: 1, col: 1 })
        );
        assert_eq!(
            game.uncover(Position(2, 0)),
            Err(GameError::OutOfBounds { row: 2, col: 0 })
        );
        assert_eq!(
            game.uncover(Position(0, -1)),
            Err(GameError::OutOfBounds { row: 0, col: -1 })
        );
        assert_eq!(game.status(), Status::InProgress);
        assert_eq!(game.board().unwrap().covered_count(), 4);
    }

    #[test]
    fn flag_counts() {
        let mut game = corner();

        assert_eq!(game.flag(Position(0, 1)), Ok(Outcome::Continue));
        assert_eq!(game.flag(Position(1, 0)), Ok(Outcome::Continue));
        assert_eq!(game.flags_placed(), 2);
        assert_eq!(game.flag(Position(0, 1)), Ok(Outcome::Continue));
        assert_eq!(game.flags_placed(), 1);
    }

    #[test]
    fn flag_rejects_uncovered() {
        let mut game = corner();
        game.uncover(Position(1, 1)).unwrap();

        assert_eq!(
            game.flag(Position(1, 1)),
            Err(GameError::AlreadyUncovered { row: 1, col: 1 })
        );
        assert_eq!(game.flags_placed(), 0);
    }

    #[test]
    fn flagging_last_mine_wins() {
        let mut game = corner();
        for pos in [Position(0, 1), Position(1, 0), Position(1, 1)] {
            assert_eq!(game.uncover(pos), Ok(Outcome::Continue));
        }

        assert_eq!(game.flag(Position(0, 0)), Ok(Outcome::Won));
        assert_eq!(game.status(), Status::Won);
    }

    #[test]
    fn start_counts_existing_flags() {
        let mut board = Board::with_mines(2, 2, &[Position(0, 0)]).unwrap();
        board.toggle_flag(Position(1, 1)).unwrap();

        let mut game = setup();
        game.start(board);
        assert_eq!(game.flags_placed(), 1);
        assert_eq!(game.flag(Position(1, 1)), Ok(Outcome::Continue));
        assert_eq!(game.flags_placed(), 0);
    }

    #[test]
    fn won_rejects_moves() {
        let mut game = setup();
        game.new_game(Config::new(3, 3, 0)).unwrap();
        assert_eq!(game.uncover(Position(1, 1)), Ok(Outcome::Won));

        assert_eq!(game.uncover(Position(0, 0)), Err(GameError::AlreadyTerminal));
        assert_eq!(game.flag(Position(0, 0)), Err(GameError::AlreadyTerminal));
        assert_eq!(game.status(), Status::Won);
    }

    #[test]
    fn terminal_rejects_moves() {
        let mut game = corner();
        game.uncover(Position(0, 0)).unwrap();

        assert_eq!(game.uncover(Position(1, 1)), Err(GameError::AlreadyTerminal));
        assert_eq!(game.flag(Position(1, 1)), Err(GameError::AlreadyTerminal));
        assert_eq!(game.execute(Command::Show), Ok(Outcome::Continue));

        // A new game restarts the cycle
        game.execute(Command::New(Config::new(3, 3, 1))).unwrap();
        assert_eq!(game.status(), Status::InProgress);
        assert_eq!(game.flags_placed(), 0);
    }

    #[test]
    fn quit_is_always_accepted() {
        let mut game = setup();
        assert_eq!(game.execute(Command::Quit), Ok(Outcome::Quit));

        let mut game = corner();
        game.uncover(Position(0, 0)).unwrap();
        assert_eq!(game.execute(Command::Quit), Ok(Outcome::Quit));
    }

    #[test]
    fn display_shows_totals() {
        let mut game = corner();
        game.flag(Position(0, 0)).unwrap();

        assert_eq!(
            game.to_string(),
            "  0 1\n0 P #\n1 # #\nTotal Mines: 1\nTotal flags used: 1"
        );
    }
}
