use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Revealed,
    Flagged,
}

/// Lower layer of a tile: what uncovering it yields. `Count` carries the
/// number of mines among the up-to-8 neighbors; zero neighbors is `Empty`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Content {
    Empty,
    Count(u8),
    Mine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    visibility: Visibility,
    content: Content,
}

impl Default for Tile {
    fn default() -> Self {
        Self { visibility: Visibility::Hidden, content: Content::Empty }
    }
}

impl Tile {
    pub fn visibility(&self) -> Visibility { self.visibility }
    pub fn content(&self) -> Content { self.content }
    pub fn is_mine(&self) -> bool { self.content == Content::Mine }
    pub fn is_revealed(&self) -> bool { self.visibility == Visibility::Revealed }
    pub fn is_flagged(&self) -> bool { self.visibility == Visibility::Flagged }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The tile was flagged, already revealed or out of bounds; nothing changed.
    AlreadySettled,
    /// A mine went off; every mine on the grid is now revealed.
    Mine,
    Counted,
    /// A zero-adjacency flood fill uncovered this many tiles, origin included.
    Flooded(usize),
}

impl RevealOutcome {
    /// Tiles that moved from hidden to revealed by this call, mines excluded.
    pub fn newly_revealed(&self) -> usize {
        match self {
            RevealOutcome::AlreadySettled | RevealOutcome::Mine => 0,
            RevealOutcome::Counted => 1,
            RevealOutcome::Flooded(n) => *n,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for Limits {
    // Debug builds accept oversized boards for experiments; release builds
    // keep the board inside a typical terminal.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self { max_rows: 500, max_cols: 500 }
        } else {
            Self { max_rows: 20, max_cols: 30 }
        }
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid size {rows}x{cols} is outside 1x1..={max_rows}x{max_cols}")]
    Dimensions { rows: usize, cols: usize, max_rows: usize, max_cols: usize },
    #[error("mine count {mines} must be at least 1 and below {total}")]
    MineCount { mines: usize, total: usize },
    #[error("mine ({x}, {y}) lies outside the {cols}x{rows} grid")]
    MineOutOfBounds { x: usize, y: usize, cols: usize, rows: usize },
    #[error("grid file: expected a number, found {token:?}")]
    BadToken { token: String },
    #[error("grid file: unexpected end of input")]
    UnexpectedEnd,
    #[error("cannot read grid file: {0}")]
    Io(#[from] std::io::Error),
}

/// The minefield: row-major tiles indexed by `(col, row)`, 0-based.
pub struct Grid {
    cols: usize,
    rows: usize,
    mines: usize,
    tiles: Vec<Tile>,
    seed: u64,
}

impl Grid {
    /// Builds a grid with `mines` randomly placed mines. A `seed` of 0 draws
    /// a fresh one, for non-reproducible runs; the effective seed is kept
    /// and reported by [`Grid::seed`].
    pub fn new(rows: usize, cols: usize, mines: usize, seed: u64) -> Result<Self, GridError> {
        Self::with_limits(Limits::default(), rows, cols, mines, seed)
    }

    pub fn with_limits(
        limits: Limits,
        rows: usize,
        cols: usize,
        mines: usize,
        seed: u64,
    ) -> Result<Self, GridError> {
        check_dimensions(limits, rows, cols)?;
        let total = rows * cols;
        if mines == 0 || mines >= total {
            return Err(GridError::MineCount { mines, total });
        }

        let seed = if seed == 0 { rand::thread_rng().gen() } else { seed };
        let mut grid = Self::blank(rows, cols, seed);
        grid.place_mines(mines, &mut StdRng::seed_from_u64(seed));
        grid.derive_adjacency();
        Ok(grid)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GridError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses a whitespace-separated grid description: row count, column
    /// count, then one `x y` pair per mine (0-based, column first). Counts
    /// are derived once every mine is placed; no grid escapes on error.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        Self::parse_with_limits(Limits::default(), text)
    }

    pub fn parse_with_limits(limits: Limits, text: &str) -> Result<Self, GridError> {
        let mut tokens = text.split_whitespace();
        let rows = parse_token(tokens.next())?;
        let cols = parse_token(tokens.next())?;
        check_dimensions(limits, rows, cols)?;

        let mut grid = Self::blank(rows, cols, 0);
        while let Some(token) = tokens.next() {
            let x = parse_token(Some(token))?;
            let y = parse_token(tokens.next())?;
            if x >= cols || y >= rows {
                return Err(GridError::MineOutOfBounds { x, y, cols, rows });
            }
            let i = grid.index(x, y);
            // Duplicate coordinates collapse onto one tile.
            if grid.tiles[i].content != Content::Mine {
                grid.tiles[i].content = Content::Mine;
                grid.mines += 1;
            }
        }
        grid.derive_adjacency();
        Ok(grid)
    }

    fn blank(rows: usize, cols: usize, seed: u64) -> Self {
        Self { cols, rows, mines: 0, tiles: vec![Tile::default(); rows * cols], seed }
    }

    // Uniform draw without replacement over the linear index space; removing
    // each chosen candidate makes a double selection impossible.
    fn place_mines(&mut self, mines: usize, rng: &mut impl Rng) {
        let mut candidates: Vec<usize> = (0..self.tiles.len()).collect();
        for _ in 0..mines {
            let pick = rng.gen_range(0..candidates.len());
            let pos = candidates.swap_remove(pick);
            self.tiles[pos].content = Content::Mine;
        }
        self.mines = mines;
    }

    // Recomputes every non-mine tile's content from its up-to-8 neighbors.
    // Idempotent; runs at construction, after a load and after the
    // first-click relocation.
    fn derive_adjacency(&mut self) {
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.index(x, y);
                if self.tiles[i].content == Content::Mine {
                    continue;
                }
                let mut count = 0u8;
                for (nx, ny) in neighbors(self.cols, self.rows, x, y, &NEIGHBORS_8) {
                    if self.tiles[self.index(nx, ny)].content == Content::Mine {
                        count += 1;
                    }
                }
                self.tiles[i].content =
                    if count == 0 { Content::Empty } else { Content::Count(count) };
            }
        }
    }

    /// Uncovers the tile at `(x, y)` and classifies what happened.
    ///
    /// The very first reveal of a game is never lethal: a mine under it is
    /// moved to the first free position in row-major order and the counts
    /// are derived again before the tile is evaluated.
    pub fn reveal(&mut self, x: usize, y: usize) -> RevealOutcome {
        if x >= self.cols || y >= self.rows {
            return RevealOutcome::AlreadySettled;
        }
        let i = self.index(x, y);
        if self.tiles[i].visibility != Visibility::Hidden {
            return RevealOutcome::AlreadySettled;
        }

        if self.tiles[i].content == Content::Mine && !self.any_revealed() {
            self.relocate_mine(i);
        }

        let content = self.tiles[i].content;
        match content {
            Content::Mine => {
                self.detonate();
                RevealOutcome::Mine
            }
            Content::Count(_) => {
                self.tiles[i].visibility = Visibility::Revealed;
                RevealOutcome::Counted
            }
            Content::Empty => RevealOutcome::Flooded(self.flood_reveal(x, y)),
        }
    }

    pub fn toggle_flag(&mut self, x: usize, y: usize) {
        if x >= self.cols || y >= self.rows {
            return;
        }
        let i = self.index(x, y);
        self.tiles[i].visibility = match self.tiles[i].visibility {
            Visibility::Hidden => Visibility::Flagged,
            Visibility::Flagged => Visibility::Hidden,
            Visibility::Revealed => return,
        };
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x < self.cols && y < self.rows {
            Some(&self.tiles[self.index(x, y)])
        } else {
            None
        }
    }

    /// True once every non-mine tile has been revealed. Flags on mines are
    /// irrelevant to winning.
    pub fn is_won(&self) -> bool {
        self.tiles
            .iter()
            .all(|t| t.visibility == Visibility::Revealed || t.content == Content::Mine)
    }

    fn any_revealed(&self) -> bool {
        self.tiles.iter().any(|t| t.visibility == Visibility::Revealed)
    }

    // Moves the mine under a first click to the first non-mine position in
    // row-major order. Construction guarantees a free tile; only a loaded
    // grid with every tile mined has none, and then the mine just vanishes.
    fn relocate_mine(&mut self, origin: usize) {
        match self.tiles.iter().position(|t| t.content != Content::Mine) {
            Some(free) => self.tiles[free].content = Content::Mine,
            None => self.mines -= 1,
        }
        self.tiles[origin].content = Content::Empty;
        self.derive_adjacency();
    }

    // Detonation shows the whole minefield, flagged mines included.
    fn detonate(&mut self) {
        for tile in &mut self.tiles {
            if tile.content == Content::Mine {
                tile.visibility = Visibility::Revealed;
            }
        }
    }

    // Work-list traversal bounded by the grid size; no recursion. Expansion
    // runs over the four orthogonal neighbors. Flagged tiles are skipped and
    // stay flagged; a mine never borders an empty tile, so the fill cannot
    // reach one.
    fn flood_reveal(&mut self, x: usize, y: usize) -> usize {
        let mut opened = 0;
        let mut work = vec![(x, y)];
        while let Some((cx, cy)) = work.pop() {
            let i = self.index(cx, cy);
            if self.tiles[i].visibility != Visibility::Hidden {
                continue;
            }
            self.tiles[i].visibility = Visibility::Revealed;
            opened += 1;
            if self.tiles[i].content != Content::Empty {
                continue;
            }
            for (nx, ny) in neighbors(self.cols, self.rows, cx, cy, &ORTHOGONALS) {
                if self.tiles[self.index(nx, ny)].visibility == Visibility::Hidden {
                    work.push((nx, ny));
                }
            }
        }
        opened
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    /// Plain-text board for line mode. Columns are numbered from 1 and rows
    /// are lettered from `a`, matching the move grammar.
    pub fn render(&self, reveal_mines: bool) -> String {
        let mut s = String::new();
        s.push_str("    ");
        for x in 0..self.cols {
            let _ = write!(s, "{:>2} ", x + 1);
        }
        s.push('\n');
        s.push_str("   ");
        s.push_str(&"-".repeat(self.cols * 3 + 1));
        s.push('\n');

        for y in 0..self.rows {
            let label = if y < 26 { (b'a' + y as u8) as char } else { '?' };
            let _ = write!(s, " {} | ", label);
            for x in 0..self.cols {
                let tile = &self.tiles[self.index(x, y)];
                let _ = write!(s, "{}  ", glyph(tile, reveal_mines));
            }
            s.push('\n');
        }
        s
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

// Public getters for encapsulation
impl Grid {
    pub fn cols(&self) -> usize { self.cols }
    pub fn rows(&self) -> usize { self.rows }
    pub fn mines(&self) -> usize { self.mines }
    pub fn seed(&self) -> u64 { self.seed }
}

const NEIGHBORS_8: [(isize, isize); 8] =
    [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];
const ORTHOGONALS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

// Offsets landing outside the grid are simply absent: positions are checked
// in signed space and only then converted back to indices, so a step off the
// left or top edge can never wrap around.
fn neighbors(
    cols: usize,
    rows: usize,
    x: usize,
    y: usize,
    deltas: &'static [(isize, isize)],
) -> impl Iterator<Item = (usize, usize)> {
    let (w, h) = (cols as isize, rows as isize);
    let (x, y) = (x as isize, y as isize);
    deltas.iter().filter_map(move |&(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        if nx >= 0 && ny >= 0 && nx < w && ny < h {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    })
}

fn check_dimensions(limits: Limits, rows: usize, cols: usize) -> Result<(), GridError> {
    if rows == 0 || cols == 0 || rows > limits.max_rows || cols > limits.max_cols {
        return Err(GridError::Dimensions {
            rows,
            cols,
            max_rows: limits.max_rows,
            max_cols: limits.max_cols,
        });
    }
    Ok(())
}

fn parse_token(token: Option<&str>) -> Result<usize, GridError> {
    let token = token.ok_or(GridError::UnexpectedEnd)?;
    token
        .parse()
        .map_err(|_| GridError::BadToken { token: token.to_string() })
}

fn glyph(tile: &Tile, reveal_mines: bool) -> char {
    if reveal_mines && tile.content == Content::Mine {
        return 'M';
    }
    match tile.visibility {
        Visibility::Hidden => '#',
        Visibility::Flagged => 'F',
        Visibility::Revealed => match tile.content {
            Content::Empty => ' ',
            Content::Count(n) => char::from_digit(n as u32, 10).unwrap_or('?'),
            Content::Mine => 'M',
        },
    }
}
