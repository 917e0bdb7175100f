//! Terminal minesweeper: a two-layer minefield engine with a scored game
//! session, a line-mode move grammar, a score file and a TUI front end.

pub mod engine;
pub mod game;
pub mod input;
pub mod leaderboard;
pub mod tui;
