use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

use crate::engine::{Content, Grid, Visibility};
use crate::game::{Difficulty, Game, GameState};
use crate::input::{Action, Move};

pub fn run_tui(
    difficulty: Difficulty,
    rows: usize,
    cols: usize,
    mines: usize,
    seed: u64,
    mono: bool,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let _guard = TermGuard;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let new_game = || -> io::Result<Game> {
        let grid = Grid::new(rows, cols, mines, seed)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(Game::new(grid, difficulty))
    };

    let mut game = new_game()?;
    let mut cursor = (0usize, 0usize);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(250);
    let autodemo = std::env::var("SAPPER_TUI_AUTODEMO").is_ok();
    let mut demo_step = 0usize;

    let mut last_inner_board = Rect::default();
    let res = loop {
        terminal.draw(|f| { last_inner_board = ui(f, &game, cursor, mono); })?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                        KeyCode::Char('h') | KeyCode::Left => {
                            if cursor.0 > 0 { cursor.0 -= 1; }
                        }
                        KeyCode::Char('l') | KeyCode::Right => {
                            if cursor.0 + 1 < game.grid().cols() { cursor.0 += 1; }
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            if cursor.1 > 0 { cursor.1 -= 1; }
                        }
                        KeyCode::Char('j') | KeyCode::Down => {
                            if cursor.1 + 1 < game.grid().rows() { cursor.1 += 1; }
                        }
                        KeyCode::Char('f') => play_at(&mut game, Action::Flag, cursor),
                        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => {
                            play_at(&mut game, Action::Reveal, cursor);
                        }
                        KeyCode::Char('n') => game = new_game()?,
                        KeyCode::Char('R') if shift => game = new_game()?,
                        _ => {}
                    }
                }
                Event::Mouse(m) => {
                    // Map mouse to cell coordinates within the inner board area
                    if let MouseEventKind::Down(btn) = m.kind {
                        if let Some((cx, cy)) = pos_to_cell(m.column, m.row, last_inner_board, game.grid().cols() as u16, game.grid().rows() as u16) {
                            match btn {
                                MouseButton::Left => play_at(&mut game, Action::Reveal, (cx as usize, cy as usize)),
                                MouseButton::Right => play_at(&mut game, Action::Flag, (cx as usize, cy as usize)),
                                MouseButton::Middle => { /* reserved for future chording */ }
                            }
                        }
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if autodemo {
                // simple scripted steps then exit
                match demo_step {
                    0 => { play_at(&mut game, Action::Reveal, (0, 0)); cursor = (1.min(cols - 1), 1.min(rows - 1)); }
                    1 => play_at(&mut game, Action::Reveal, cursor),
                    2 => play_at(&mut game, Action::Flag, ((cols / 2).min(cols - 1), (rows / 2).min(rows - 1))),
                    3 => { /* pause frame */ }
                    _ => break Ok(()),
                }
                demo_step += 1;
            }
        }
    };

    // teardown via guard; just ensure cursor visible
    terminal.show_cursor()?;
    res
}

// Finished games swallow further moves; the restart keys stay live.
fn play_at(game: &mut Game, action: Action, (x, y): (usize, usize)) {
    let _ = game.play(Move { col: x + 1, row: y + 1, action });
}

fn ui(f: &mut ratatui::Frame, game: &Game, cursor: (usize, usize), mono: bool) -> Rect {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(f.size());

    // Header
    let status = match game.state() {
        GameState::Lost => "Boom! You hit a mine — q to quit, n to restart",
        GameState::Won => "You won! q to quit, n to restart",
        GameState::Running => "Mouse: left=reveal, right=flag • Arrows/HJKL move • Enter/Space reveal • f flag • n new • q quit",
    };
    let header = Paragraph::new(status)
        .style(text_style(Color::Cyan, mono))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Sapper"));
    f.render_widget(header, root[0]);

    // Board area
    let area = centered_grid_area(root[1], game.grid().cols() as u16, game.grid().rows() as u16);
    // Draw the board and compute the inner area used by cells (inside borders)
    let inner = inner_area(area);
    draw_board(f, game, area, cursor, mono);

    let footer = Paragraph::new(format!(
        "Size: {}x{}  Mines: {}  Score: {}",
        game.grid().cols(),
        game.grid().rows(),
        game.grid().mines(),
        game.score()
    ))
    .style(text_style(Color::DarkGray, mono))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, root[2]);
    inner
}

fn centered_grid_area(parent: Rect, cols: u16, rows: u16) -> Rect {
    let cell_w = 2; // one char + one space
    let cell_h = 1;
    let grid_w = cols * cell_w;
    let grid_h = rows * cell_h;
    let x = parent.x.saturating_add((parent.width.saturating_sub(grid_w)) / 2);
    let y = parent.y.saturating_add((parent.height.saturating_sub(grid_h)) / 2);
    Rect { x, y, width: grid_w.min(parent.width), height: grid_h.min(parent.height) }
}

fn draw_board(f: &mut ratatui::Frame, game: &Game, area: Rect, cursor: (usize, usize), mono: bool) {
    let grid = game.grid();
    let lost = game.state() == GameState::Lost;

    // Build lines of text representing each row.
    let mut lines: Vec<Line> = Vec::with_capacity(grid.rows());
    for y in 0..grid.rows() {
        let mut spans: Vec<Span> = Vec::with_capacity(grid.cols() * 2);
        for x in 0..grid.cols() {
            let tile = grid.tile(x, y).unwrap();

            let mut ch = if lost && tile.is_mine() {
                '*'
            } else {
                match tile.visibility() {
                    Visibility::Revealed => match tile.content() {
                        Content::Mine => '*',
                        Content::Empty => ' ',
                        Content::Count(n) => char::from_digit(n as u32, 10).unwrap_or('?'),
                    },
                    Visibility::Flagged => 'F',
                    Visibility::Hidden => '·',
                }
            };

            // Color by state
            let mut style = if mono {
                Style::default()
            } else if lost && tile.is_mine() {
                Style::default().fg(Color::Red)
            } else if tile.is_flagged() {
                Style::default().fg(Color::Yellow)
            } else if tile.is_revealed() {
                number_style(tile.content())
            } else {
                Style::default().fg(Color::DarkGray)
            };

            // Highlight selected cell
            if cursor.0 == x && cursor.1 == y {
                style = style.add_modifier(Modifier::REVERSED);
                if ch == ' ' { ch = '·'; }
            }

            spans.push(Span::styled(format!("{} ", ch), style));
        }
        lines.push(Line::from(spans));
    }

    let board_block = Block::default().borders(Borders::ALL).title("Minefield");
    let para = Paragraph::new(lines).block(board_block);
    f.render_widget(para, area);
}

fn number_style(content: Content) -> Style {
    let n = match content {
        Content::Empty => 0,
        Content::Count(n) => n,
        Content::Mine => return Style::default().fg(Color::Red),
    };
    match n {
        0 => Style::default().fg(Color::Gray),
        1 => Style::default().fg(Color::Blue),
        2 => Style::default().fg(Color::Green),
        3 => Style::default().fg(Color::Red),
        4 => Style::default().fg(Color::Magenta),
        5 => Style::default().fg(Color::Yellow),
        6 => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

fn text_style(color: Color, mono: bool) -> Style {
    if mono { Style::default() } else { Style::default().fg(color) }
}

fn inner_area(area: Rect) -> Rect {
    // Match Block::inner() for Borders::ALL: shrink by 1 on each side
    Rect { x: area.x.saturating_add(1), y: area.y.saturating_add(1), width: area.width.saturating_sub(2), height: area.height.saturating_sub(2) }
}

fn pos_to_cell(mx: u16, my: u16, inner: Rect, cols: u16, rows: u16) -> Option<(u16, u16)> {
    if mx < inner.x || my < inner.y { return None; }
    let rel_x = mx - inner.x;
    let rel_y = my - inner.y;
    let cell_w = 2u16; // must match centered_grid_area and rendering width
    let cx = rel_x / cell_w;
    let cy = rel_y / 1u16;
    if cx < cols && cy < rows { Some((cx, cy)) } else { None }
}

struct TermGuard;
impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        use crossterm::ExecutableCommand;
        let mut stdout = std::io::stdout();
        let _ = stdout.execute(DisableMouseCapture);
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}
