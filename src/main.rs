use std::io::{self, BufRead, Write};

use clap::{ArgAction, Parser};
use minesweeper::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Play Minesweeper from the command line.
#[derive(Parser, Debug)]
#[command(name = "minesweeper", version)]
struct Args {
    /// Seed for mine placement, random if omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Skip the welcome banner
    #[arg(short, long)]
    quiet: bool,
}

/// A line of player input.
#[derive(Debug, PartialEq)]
enum Line {
    Help,
    Play(Command),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();

    let mut game = match args.seed {
        Some(seed) => Minesweeper::with_seed(seed),
        None => Minesweeper::new(),
    };
    debug!(seed = ?args.seed, "session ready");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if !args.quiet {
        writeln!(out, "Welcome to Minesweeper!")?;
        writeln!(out)?;
        help(&mut out)?;
    }
    run(&mut game, io::stdin().lock(), &mut out, &mut io::stderr())
}

/// Read and run commands until `quit` or end of input.
///
/// Rejected commands are reported on `err`.
fn run<R, I, W, E>(
    game: &mut Minesweeper<R>,
    mut input: I,
    out: &mut W,
    err: &mut E,
) -> anyhow::Result<()>
where
    R: rand::Rng,
    I: BufRead,
    W: Write,
    E: Write,
{
    let mut buf = String::new();
    loop {
        // Print prompt
        write!(out, ">> ")?;
        out.flush()?;

        // Get user input
        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            writeln!(out)?;
            return Ok(());
        }

        // Process input
        let command = match parse(&buf) {
            Ok(Some(Line::Play(command))) => command,
            Ok(Some(Line::Help)) => {
                help(out)?;
                continue;
            }
            Ok(None) => continue,
            Err(e) => {
                writeln!(err, "error: {}", e)?;
                continue;
            }
        };

        // Run command
        match game.execute(command) {
            Ok(Outcome::Quit) => return Ok(()),
            Ok(outcome) => {
                writeln!(out, "{}", game)?;
                match outcome {
                    Outcome::Won => writeln!(out, "Congrats! You win!")?,
                    Outcome::Lost => writeln!(out, "You hit a mine! Game over!")?,
                    _ => (),
                }
            }
            Err(e) => writeln!(err, "error: {}", e)?,
        }
    }
}

/// Split a line into a command and its integer arguments.
///
/// Blank lines yield `None`.
fn parse(line: &str) -> Result<Option<Line>> {
    let words: Vec<_> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let (name, arity) = match verb {
        "n" | "new" => ("new", 3),
        "s" | "show" => ("show", 0),
        "u" | "uncover" => ("uncover", 2),
        "f" | "flag" => ("flag", 2),
        "q" | "quit" => ("quit", 0),
        "h" | "help" => return Ok(Some(Line::Help)),
        _ => return Err(GameError::UnknownCommand(verb.to_string())),
    };

    // Validate argument count and parse arguments
    let nums = args
        .iter()
        .map(|arg| arg.parse::<isize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| GameError::InvalidArguments(name))?;
    if nums.len() != arity {
        return Err(GameError::InvalidArguments(name));
    }

    let command = match (name, nums.as_slice()) {
        ("new", &[rows, cols, mines]) => Command::New(Config::new(rows, cols, mines)),
        ("uncover", &[row, col]) => Command::Uncover(Position(row, col)),
        ("flag", &[row, col]) => Command::Flag(Position(row, col)),
        ("quit", _) => Command::Quit,
        _ => Command::Show,
    };
    Ok(Some(Line::Play(command)))
}

fn help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "USAGE:")?;
    writeln!(out, "\tn, new r c m \tCreate a board with r rows, c columns and m mines")?;
    writeln!(out, "\ts, show      \tShow the current board")?;
    writeln!(out, "\tu, uncover r c\tUncover the cell at row r, column c")?;
    writeln!(out, "\tf, flag r c  \tFlag or unflag the cell at row r, column c")?;
    writeln!(out, "\tq, quit      \tEnd the game")?;
    writeln!(out, "\th, help      \tPrints help information")
}
