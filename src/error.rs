use thiserror::Error;

/// Reasons a command is rejected.
///
/// Every variant is recoverable: the session is left exactly as it was before
/// the command, and the player is expected to issue a corrected one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("cannot build a {rows}x{cols} board with {mines} mines")]
    InvalidDimensions { rows: isize, cols: isize, mines: isize },
    #[error("cell {row}, {col} is not on the board")]
    OutOfBounds { row: isize, col: isize },
    #[error("no board yet, start one with `new`")]
    NoActiveBoard,
    #[error("game is over, start a new one with `new`")]
    AlreadyTerminal,
    #[error("cell {row}, {col} is already uncovered")]
    AlreadyUncovered { row: isize, col: isize },
    #[error("cell {row}, {col} is flagged")]
    FlaggedCell { row: isize, col: isize },
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("invalid arguments for `{0}`")]
    InvalidArguments(&'static str),
}

pub type Result<T> = std::result::Result<T, GameError>;
