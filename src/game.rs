use thiserror::Error;

use crate::engine::{Grid, RevealOutcome};
use crate::input::{Action, Move};

/// Preset boards with their score multipliers. `Custom` games, including
/// grids loaded from a file, score nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Custom,
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    /// `(rows, cols, mines)` for the fixed presets; `Custom` has none.
    pub fn layout(self) -> Option<(usize, usize, usize)> {
        match self {
            Difficulty::Custom => None,
            Difficulty::Easy => Some((9, 9, 10)),
            Difficulty::Normal => Some((16, 16, 40)),
            Difficulty::Hard => Some((16, 30, 99)),
        }
    }

    /// Points per revealed tile.
    pub fn score_multiplier(self) -> u64 {
        match self {
            Difficulty::Custom => 0,
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Running,
    Won,
    Lost,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("row {0} is outside the grid")]
    Row(usize),
    #[error("column {0} is outside the grid")]
    Column(usize),
    #[error("the game is already over")]
    Finished,
}

/// One play session: a grid plus score and win/loss bookkeeping. The grid
/// itself stays oblivious to scoring; this layer owns it.
pub struct Game {
    grid: Grid,
    difficulty: Difficulty,
    score: u64,
    state: GameState,
}

impl Game {
    pub fn new(grid: Grid, difficulty: Difficulty) -> Self {
        Self { grid, difficulty, score: 0, state: GameState::Running }
    }

    /// Applies one 1-based player move, translated to the engine's 0-based
    /// `(col, row)` coordinates after range checks.
    ///
    /// Revealing adds `newly revealed x multiplier` to the score and then,
    /// win or not, settles the state; flags touch neither.
    pub fn play(&mut self, mv: Move) -> Result<(), MoveError> {
        if self.state != GameState::Running {
            return Err(MoveError::Finished);
        }
        if mv.row == 0 || mv.row > self.grid.rows() {
            return Err(MoveError::Row(mv.row));
        }
        if mv.col == 0 || mv.col > self.grid.cols() {
            return Err(MoveError::Column(mv.col));
        }
        let (x, y) = (mv.col - 1, mv.row - 1);

        match mv.action {
            Action::Flag => self.grid.toggle_flag(x, y),
            Action::Reveal => match self.grid.reveal(x, y) {
                RevealOutcome::Mine => self.state = GameState::Lost,
                outcome => {
                    self.score +=
                        outcome.newly_revealed() as u64 * self.difficulty.score_multiplier();
                    if self.grid.is_won() {
                        self.state = GameState::Won;
                    }
                }
            },
        }
        Ok(())
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn difficulty(&self) -> Difficulty { self.difficulty }
    pub fn score(&self) -> u64 { self.score }
    pub fn state(&self) -> GameState { self.state }
    pub fn is_over(&self) -> bool { self.state != GameState::Running }
}
