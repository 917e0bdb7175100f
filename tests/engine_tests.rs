use std::{env, fs, process};

use sapper::engine::{Content, Grid, GridError, Limits, RevealOutcome, Tile};

fn neighbors(w: usize, h: usize, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    let x = x as isize; let y = y as isize; let w = w as isize; let h = h as isize;
    let mut out = Vec::new();
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 { continue; }
            let nx = x + dx; let ny = y + dy;
            if nx >= 0 && ny >= 0 && nx < w && ny < h { out.push((nx as usize, ny as usize)); }
        }
    }
    out.into_iter()
}

fn snapshot(grid: &Grid) -> Vec<Tile> {
    (0..grid.rows())
        .flat_map(|y| (0..grid.cols()).map(move |x| (x, y)))
        .map(|(x, y)| *grid.tile(x, y).unwrap())
        .collect()
}

fn count_mines(grid: &Grid) -> usize {
    snapshot(grid).iter().filter(|t| t.is_mine()).count()
}

fn mine_positions(grid: &Grid) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for y in 0..grid.rows() {
        for x in 0..grid.cols() {
            if grid.tile(x, y).unwrap().is_mine() { out.push((x, y)); }
        }
    }
    out
}

#[test]
fn construction_places_the_exact_mine_count() {
    let g = Grid::new(9, 9, 10, 12345).expect("grid");
    assert_eq!(g.mines(), 10);
    assert_eq!(count_mines(&g), 10);

    let g = Grid::new(16, 30, 99, 7).expect("grid");
    assert_eq!(count_mines(&g), 99);
}

#[test]
fn same_seed_gives_the_same_minefield() {
    let a = Grid::new(9, 9, 10, 42).expect("grid");
    let b = Grid::new(9, 9, 10, 42).expect("grid");
    assert_eq!(mine_positions(&a), mine_positions(&b));
}

#[test]
fn adjacency_matches_neighbor_mines() {
    let mut g = Grid::new(8, 8, 10, 999).expect("grid");
    let _ = g.reveal(0, 0);
    let _ = g.reveal(4, 4);
    g.toggle_flag(7, 7);
    let (w, h) = (g.cols(), g.rows());
    let mut mine_count = 0;
    for y in 0..h {
        for x in 0..w {
            let t = g.tile(x, y).unwrap();
            if t.is_mine() { mine_count += 1; continue; }
            let mut adj = 0u8;
            for (nx, ny) in neighbors(w, h, x, y) {
                if g.tile(nx, ny).unwrap().is_mine() { adj += 1; }
            }
            let expected = if adj == 0 { Content::Empty } else { Content::Count(adj) };
            assert_eq!(t.content(), expected, "adjacency mismatch at ({},{})", x, y);
        }
    }
    assert_eq!(mine_count, g.mines());
}

#[test]
fn first_reveal_is_never_a_mine() {
    // 15 mines in 16 tiles: the first click lands on a mine for almost every
    // seed, so the relocation path is exercised hard.
    for seed in 1..=25u64 {
        let mut g = Grid::new(4, 4, 15, seed).expect("grid");
        let outcome = g.reveal(2, 1);
        assert_ne!(outcome, RevealOutcome::Mine, "seed {}", seed);
        let t = g.tile(2, 1).unwrap();
        assert!(t.is_revealed());
        assert!(!t.is_mine());
        assert_eq!(count_mines(&g), 15, "seed {}", seed);
    }
}

#[test]
fn relocation_target_is_the_first_free_slot() {
    let mut g = Grid::parse("2 3 0 0").expect("grid");
    assert_eq!(g.reveal(0, 0), RevealOutcome::Counted);
    assert!(g.tile(1, 0).unwrap().is_mine());
    assert!(!g.tile(0, 0).unwrap().is_mine());
    assert_eq!(g.tile(0, 0).unwrap().content(), Content::Count(1));
    assert!(g.tile(0, 0).unwrap().is_revealed());
    assert_eq!(count_mines(&g), 1);
}

#[test]
fn reveal_is_idempotent_once_settled() {
    let mut g = Grid::parse("3 3 2 2").expect("grid");
    assert_eq!(g.reveal(0, 0), RevealOutcome::Flooded(8));
    let before = snapshot(&g);
    assert_eq!(g.reveal(0, 0), RevealOutcome::AlreadySettled);
    assert_eq!(snapshot(&g), before);

    // Flags shield even a mine from being revealed.
    g.toggle_flag(2, 2);
    assert_eq!(g.reveal(2, 2), RevealOutcome::AlreadySettled);
    assert!(g.tile(2, 2).unwrap().is_flagged());
}

#[test]
fn flood_fill_opens_the_whole_zero_region() {
    let mut g = Grid::parse("3 3 2 2").expect("grid");
    assert_eq!(g.reveal(0, 0), RevealOutcome::Flooded(8));
    for y in 0..3 {
        for x in 0..3 {
            let t = g.tile(x, y).unwrap();
            if (x, y) == (2, 2) {
                assert!(!t.is_revealed(), "the mine must stay hidden");
            } else {
                assert!(t.is_revealed(), "({},{}) left hidden", x, y);
            }
        }
    }
    assert_eq!(g.tile(1, 1).unwrap().content(), Content::Count(1));
    assert!(g.is_won());
}

#[test]
fn flood_fill_skips_flagged_tiles_and_leaves_them_flagged() {
    let mut g = Grid::parse("3 3 2 2").expect("grid");
    g.toggle_flag(1, 0);
    // The flag cuts the only 4-connected path along the top row, so the
    // right-hand tiles stay hidden.
    assert_eq!(g.reveal(0, 0), RevealOutcome::Flooded(5));
    assert!(g.tile(1, 0).unwrap().is_flagged());
    assert!(!g.tile(2, 0).unwrap().is_revealed());
    assert!(!g.tile(2, 1).unwrap().is_revealed());
    assert!(!g.is_won());

    g.toggle_flag(1, 0);
    assert_eq!(g.reveal(1, 0), RevealOutcome::Flooded(3));
    assert!(g.is_won());
}

#[test]
fn win_requires_every_non_mine_tile() {
    let mut g = Grid::parse("1 2 0 0").expect("grid");
    assert!(!g.is_won());
    assert_eq!(g.reveal(1, 0), RevealOutcome::Counted);
    assert!(g.is_won(), "the mine itself may stay hidden");

    // Same ending through the constructor: with one mine on 1x2 the first
    // reveal always wins, relocated or not.
    let mut g = Grid::new(1, 2, 1, 7).expect("grid");
    assert_eq!(g.reveal(0, 0), RevealOutcome::Counted);
    assert!(g.is_won());
}

#[test]
fn detonation_reveals_every_mine_and_nothing_else() {
    let mut g = Grid::parse("2 2 0 0 1 1").expect("grid");
    // First click sits on a mine: it moves to (1,0), the first free slot.
    assert_eq!(g.reveal(0, 0), RevealOutcome::Counted);
    assert_eq!(g.tile(0, 0).unwrap().content(), Content::Count(2));
    assert!(g.tile(1, 0).unwrap().is_mine());
    assert!(g.tile(1, 1).unwrap().is_mine());

    g.toggle_flag(1, 0);
    assert_eq!(g.reveal(1, 1), RevealOutcome::Mine);
    assert!(g.tile(1, 1).unwrap().is_revealed());
    assert!(g.tile(1, 0).unwrap().is_revealed(), "flagged mines show too");
    assert!(!g.tile(0, 1).unwrap().is_revealed());
    assert!(!g.is_won());
}

#[test]
fn flags_toggle_and_never_touch_revealed_tiles() {
    let mut g = Grid::parse("3 3 2 2").expect("grid");
    g.toggle_flag(0, 0);
    assert!(g.tile(0, 0).unwrap().is_flagged());
    g.toggle_flag(0, 0);
    assert!(!g.tile(0, 0).unwrap().is_flagged());

    assert_eq!(g.reveal(1, 1), RevealOutcome::Counted);
    g.toggle_flag(1, 1);
    assert!(g.tile(1, 1).unwrap().is_revealed());
}

#[test]
fn out_of_bounds_coordinates_are_ignored() {
    let mut g = Grid::new(9, 9, 10, 3).expect("grid");
    assert!(g.tile(9, 0).is_none());
    assert!(g.tile(0, 9).is_none());
    let before = snapshot(&g);
    assert_eq!(g.reveal(100, 0), RevealOutcome::AlreadySettled);
    g.toggle_flag(0, 100);
    assert_eq!(snapshot(&g), before);
}

#[test]
fn construction_rejects_bad_parameters() {
    assert!(matches!(Grid::new(0, 5, 1, 1), Err(GridError::Dimensions { .. })));
    assert!(matches!(Grid::new(5, 0, 1, 1), Err(GridError::Dimensions { .. })));
    assert!(matches!(Grid::new(5, 5, 0, 1), Err(GridError::MineCount { .. })));
    assert!(matches!(Grid::new(5, 5, 25, 1), Err(GridError::MineCount { .. })));

    let limits = Limits { max_rows: 20, max_cols: 30 };
    assert!(matches!(
        Grid::with_limits(limits, 21, 10, 5, 1),
        Err(GridError::Dimensions { .. })
    ));
    assert!(matches!(
        Grid::with_limits(limits, 10, 31, 5, 1),
        Err(GridError::Dimensions { .. })
    ));
}

#[test]
fn loader_accepts_a_plain_token_stream() {
    let g = Grid::parse("3\n3\n2 2\n").expect("grid");
    assert_eq!((g.rows(), g.cols(), g.mines()), (3, 3, 1));
    assert!(g.tile(2, 2).unwrap().is_mine());
    assert_eq!(g.tile(1, 1).unwrap().content(), Content::Count(1));
    assert_eq!(g.tile(0, 0).unwrap().content(), Content::Empty);
}

#[test]
fn loader_collapses_duplicate_mines() {
    let g = Grid::parse("2 2 0 0 0 0").expect("grid");
    assert_eq!(g.mines(), 1);
    assert_eq!(count_mines(&g), 1);
    assert_eq!(g.tile(1, 1).unwrap().content(), Content::Count(1));
}

#[test]
fn loader_reads_a_grid_file() {
    let path = env::temp_dir().join(format!("sapper_grid_{}.txt", process::id()));
    fs::write(&path, "2 3 0 0 2 1").expect("write grid file");
    let loaded = Grid::load(&path);
    let _ = fs::remove_file(&path);

    let g = loaded.expect("grid");
    assert_eq!((g.rows(), g.cols(), g.mines()), (2, 3, 2));
    assert!(g.tile(0, 0).unwrap().is_mine());
    assert!(g.tile(2, 1).unwrap().is_mine());
    assert_eq!(g.tile(1, 0).unwrap().content(), Content::Count(2));

    let missing = env::temp_dir().join(format!("sapper_grid_missing_{}", process::id()));
    assert!(matches!(Grid::load(&missing), Err(GridError::Io(_))));
}

#[test]
fn loader_rejects_malformed_input() {
    assert!(matches!(Grid::parse("x"), Err(GridError::BadToken { .. })));
    assert!(matches!(Grid::parse("3"), Err(GridError::UnexpectedEnd)));
    assert!(matches!(Grid::parse("3 3 1"), Err(GridError::UnexpectedEnd)));
    assert!(matches!(Grid::parse("3 3 1 zz"), Err(GridError::BadToken { .. })));
    assert!(matches!(Grid::parse("3 3 3 0"), Err(GridError::MineOutOfBounds { .. })));
    assert!(matches!(Grid::parse("3 3 0 3"), Err(GridError::MineOutOfBounds { .. })));

    let limits = Limits { max_rows: 20, max_cols: 30 };
    assert!(matches!(
        Grid::parse_with_limits(limits, "21 5"),
        Err(GridError::Dimensions { .. })
    ));
    assert!(matches!(
        Grid::parse_with_limits(limits, "0 5"),
        Err(GridError::Dimensions { .. })
    ));
}

#[test]
fn render_uses_the_line_mode_glyphs() {
    let mut g = Grid::parse("2 2 1 1").expect("grid");
    let covered = g.render(false);
    assert!(covered.contains(" a | "));
    assert!(covered.contains(" b | "));
    assert!(covered.contains('#'));
    assert!(!covered.contains('M'));

    g.toggle_flag(1, 0);
    let _ = g.reveal(0, 0);
    let s = g.render(false);
    assert!(s.contains('1'));
    assert!(s.contains('F'));

    let shown = g.render(true);
    assert!(shown.contains('M'));
}
