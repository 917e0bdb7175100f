use thiserror::Error;

/// What a move does to its target tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Reveal,
    Flag,
}

/// One parsed player move, 1-based as typed: column number, row letter
/// position (`a` = 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub col: usize,
    pub row: usize,
    pub action: Action,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Play(Move),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty move")]
    Empty,
    #[error("unknown move type {0:?}, expected 'r' or 'f'")]
    UnknownAction(char),
    #[error("missing column number")]
    MissingColumn,
    #[error("column number {0:?} is not usable")]
    InvalidColumn(String),
    #[error("missing row letter")]
    MissingRow,
}

/// Parses one input line into a command.
///
/// The grammar is forgiving: case and whitespace are ignored, so `R 12 c`,
/// `r12c` and `r 12 C` all reveal column 12, row `c`. A line containing
/// `exit` anywhere quits.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let norm: String = line
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if norm.contains("exit") {
        return Ok(Command::Quit);
    }

    let mut chars = norm.chars();
    let action = match chars.next() {
        None => return Err(ParseError::Empty),
        Some('r') => Action::Reveal,
        Some('f') => Action::Flag,
        Some(other) => return Err(ParseError::UnknownAction(other)),
    };

    let rest = chars.as_str();
    let digit_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digit_len == 0 {
        return Err(ParseError::MissingColumn);
    }
    let (digits, tail) = rest.split_at(digit_len);
    let col: usize = digits
        .parse()
        .map_err(|_| ParseError::InvalidColumn(digits.to_string()))?;

    let row_letter = tail
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .ok_or(ParseError::MissingRow)?;
    let row = (row_letter as u8 - b'a' + 1) as usize;

    Ok(Command::Play(Move { col, row, action }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(col: usize, row: usize, action: Action) -> Command {
        Command::Play(Move { col, row, action })
    }

    #[test]
    fn parses_compact_and_spaced_forms() {
        assert_eq!(parse("r12c"), Ok(play(12, 3, Action::Reveal)));
        assert_eq!(parse("  f 3 a "), Ok(play(3, 1, Action::Flag)));
        assert_eq!(parse("R 7 B"), Ok(play(7, 2, Action::Reveal)));
    }

    #[test]
    fn skips_punctuation_before_the_row_letter() {
        assert_eq!(parse("r12-c"), Ok(play(12, 3, Action::Reveal)));
    }

    #[test]
    fn exit_quits_even_when_spaced_out() {
        assert_eq!(parse("exit"), Ok(Command::Quit));
        assert_eq!(parse("EX IT"), Ok(Command::Quit));
        assert_eq!(parse("please exit now"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_malformed_moves() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("x1a"), Err(ParseError::UnknownAction('x')));
        assert_eq!(parse("r"), Err(ParseError::MissingColumn));
        assert_eq!(parse("ra"), Err(ParseError::MissingColumn));
        assert_eq!(parse("r12"), Err(ParseError::MissingRow));
    }

    #[test]
    fn rejects_oversized_column_numbers() {
        assert!(matches!(
            parse("r99999999999999999999a"),
            Err(ParseError::InvalidColumn(_))
        ));
    }
}
