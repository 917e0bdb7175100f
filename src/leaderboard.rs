use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// File the scores land in, created next to wherever the game runs.
pub const SCORES_FILE: &str = ".sapper_scores";

/// How many entries the endgame screen shows.
pub const TOP_DISPLAYED: usize = 5;

// Reading stops after this many records, oldest first.
const RECORD_LIMIT: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub score: u64,
}

/// Append-only score file: one `name score` record per line.
pub struct Leaderboard {
    path: PathBuf,
}

impl Leaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn record(&self, name: &str, score: u64) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{} {}", name.trim(), score)
    }

    /// The best `n` scores, highest first. A missing file is an empty board;
    /// malformed records are skipped.
    pub fn top(&self, n: usize) -> io::Result<Vec<Entry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut entries: Vec<Entry> =
            text.lines().take(RECORD_LIMIT).filter_map(parse_record).collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(n);
        Ok(entries)
    }
}

// A record is everything up to the last whitespace (the name, inner spaces
// allowed) followed by the score.
fn parse_record(line: &str) -> Option<Entry> {
    let (name, score) = line.trim().rsplit_once(char::is_whitespace)?;
    let score = score.parse().ok()?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Entry { name: name.to_string(), score })
}
