use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sapper::engine::{Grid, Limits};
use sapper::game::{Difficulty, Game, GameState};
use sapper::input::{self, Command};
use sapper::leaderboard::{Leaderboard, SCORES_FILE, TOP_DISPLAYED};
use sapper::tui;

#[derive(Parser, Debug)]
#[command(name = "sapper", about = "Terminal minesweeper", version)]
struct Args {
    /// Launch TUI mode
    #[arg(long, conflicts_with_all = ["grid", "moves"])]
    tui: bool,
    /// Preset difficulty; omit for a custom board or the interactive prompt
    #[arg(long, value_enum)]
    difficulty: Option<Preset>,
    /// Rows for a custom board
    #[arg(long)]
    rows: Option<usize>,
    /// Columns for a custom board
    #[arg(long)]
    cols: Option<usize>,
    /// Number of mines for a custom board
    #[arg(long)]
    mines: Option<usize>,
    /// Seed (0 = random)
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Load the minefield from a grid file (unscored)
    #[arg(long)]
    grid: Option<PathBuf>,
    /// Replay moves from a file instead of reading them from stdin
    #[arg(long)]
    moves: Option<PathBuf>,
    /// Disable colors in the TUI
    #[arg(long)]
    mono: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Easy,
    Normal,
    Hard,
}

impl From<Preset> for Difficulty {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Easy => Difficulty::Easy,
            Preset::Normal => Difficulty::Normal,
            Preset::Hard => Difficulty::Hard,
        }
    }
}

fn print_help() {
    println!("Moves:");
    println!("  r <col> <row>   - reveal, e.g. 'r 3 b' or 'r3b' (column 3, row b)");
    println!("  f <col> <row>   - flag or unflag, e.g. 'f 1 a'");
    println!("  exit            - quit");
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.tui {
        let (difficulty, rows, cols, mines) = board_from_flags(&args);
        return match tui::run_tui(difficulty, rows, cols, mines, args.seed, args.mono) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("TUI error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let game = match build_game(&args) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match run_line_mode(game, &args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

// A preset flag wins over the size flags; with neither, line mode falls back
// to asking.
fn board_from_flags(args: &Args) -> (Difficulty, usize, usize, usize) {
    match args.difficulty {
        Some(preset) => {
            let difficulty = Difficulty::from(preset);
            let (rows, cols, mines) = match difficulty.layout() {
                Some(layout) => layout,
                None => (9, 9, 10),
            };
            (difficulty, rows, cols, mines)
        }
        None => (
            Difficulty::Custom,
            args.rows.unwrap_or(9),
            args.cols.unwrap_or(9),
            args.mines.unwrap_or(10),
        ),
    }
}

fn build_game(args: &Args) -> Result<Game, Box<dyn Error>> {
    if let Some(path) = &args.grid {
        let grid = Grid::load(path)?;
        return Ok(Game::new(grid, Difficulty::Custom));
    }
    let no_board_flags = args.difficulty.is_none()
        && args.rows.is_none()
        && args.cols.is_none()
        && args.mines.is_none();
    let (difficulty, rows, cols, mines) = if no_board_flags {
        prompt_setup(Limits::default())?
    } else {
        board_from_flags(args)
    };
    Ok(Game::new(Grid::new(rows, cols, mines, args.seed)?, difficulty))
}

fn prompt_setup(limits: Limits) -> io::Result<(Difficulty, usize, usize, usize)> {
    let stdin = io::stdin();
    loop {
        let line = ask(&stdin, "Difficulty [e]asy, [n]ormal, [h]ard, [c]ustom: ")?;
        let difficulty = match line.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('e') => Difficulty::Easy,
            Some('n') => Difficulty::Normal,
            Some('h') => Difficulty::Hard,
            Some('c') => Difficulty::Custom,
            _ => {
                println!("Unknown difficulty.");
                continue;
            }
        };
        if let Some((rows, cols, mines)) = difficulty.layout() {
            return Ok((difficulty, rows, cols, mines));
        }
        // Custom: asked again from the top until the numbers make a legal grid.
        loop {
            let rows = match ask(&stdin, "Rows: ")?.trim().parse::<usize>() {
                Ok(n) if n > 0 && n <= limits.max_rows => n,
                _ => {
                    println!("Rows must be between 1 and {}.", limits.max_rows);
                    continue;
                }
            };
            let cols = match ask(&stdin, "Columns: ")?.trim().parse::<usize>() {
                Ok(n) if n > 0 && n <= limits.max_cols => n,
                _ => {
                    println!("Columns must be between 1 and {}.", limits.max_cols);
                    continue;
                }
            };
            let mines = match ask(&stdin, "Mines: ")?.trim().parse::<usize>() {
                Ok(n) if n > 0 && n < rows * cols => n,
                _ => {
                    println!("Mines must be between 1 and {}.", rows * cols - 1);
                    continue;
                }
            };
            return Ok((Difficulty::Custom, rows, cols, mines));
        }
    }
}

fn ask(stdin: &io::Stdin, prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line)
}

fn run_line_mode(mut game: Game, args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    let replay = args.moves.is_some();
    let mut source: Box<dyn BufRead> = match &args.moves {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let show_score = game.difficulty().score_multiplier() > 0;

    println!(
        "Sapper {}x{} with {} mines{}",
        game.grid().cols(),
        game.grid().rows(),
        game.grid().mines(),
        if game.grid().seed() != 0 { format!(" (seed {})", game.grid().seed()) } else { String::new() }
    );
    print_help();

    let mut line = String::new();
    loop {
        println!("\n{}", game.grid());
        if show_score {
            println!("Score: {}", game.score());
        }
        match game.state() {
            GameState::Lost => {
                println!("Boom! You hit a mine. Game over.\n");
                println!("Final board (mines shown):\n{}", game.grid().render(true));
                break;
            }
            GameState::Won => {
                println!("You cleared the minefield!\n");
                println!("Final board (mines shown):\n{}", game.grid().render(true));
                break;
            }
            GameState::Running => {}
        }

        print!("Move: ");
        io::stdout().flush()?;
        line.clear();
        if source.read_line(&mut line)? == 0 {
            // The move source ran dry with the game still going.
            println!("Out of moves, game over.");
            return Ok(ExitCode::SUCCESS);
        }
        if replay {
            println!("{}", line.trim_end());
        } else if line.trim().is_empty() {
            continue;
        }

        let command = match input::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                if replay {
                    eprintln!("bad move in file: {e}");
                    return Ok(ExitCode::FAILURE);
                }
                println!("{e}");
                continue;
            }
        };
        match command {
            Command::Quit => return Ok(ExitCode::SUCCESS),
            Command::Play(mv) => {
                if let Err(e) = game.play(mv) {
                    if replay {
                        eprintln!("bad move in file: {e}");
                        return Ok(ExitCode::FAILURE);
                    }
                    println!("{e}");
                }
            }
        }
    }

    endgame(&game)?;
    Ok(ExitCode::SUCCESS)
}

// Scored games feed the score file; a game that never scored skips straight
// to the closing prompt.
fn endgame(game: &Game) -> io::Result<()> {
    if game.score() > 0 {
        let stdin = io::stdin();
        let name = ask(&stdin, "Your name: ").unwrap_or_default();
        let name = name.trim();
        if name.is_empty() {
            println!("No name, score not recorded.");
        } else {
            let board = Leaderboard::new(SCORES_FILE);
            board.record(name, game.score())?;
            let top = board.top(TOP_DISPLAYED)?;
            println!("\nTOP SCORES");
            println!("----------------");
            for (i, entry) in top.iter().enumerate() {
                println!("{}. {} {:>20}", i + 1, entry.name, entry.score);
            }
        }
    }
    println!("\nPress Enter to finish...");
    let mut sink = String::new();
    let _ = io::stdin().read_line(&mut sink);
    Ok(())
}
