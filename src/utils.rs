use crate::engine::{Board, Color, Pattern, Position, SequenceTiles, BOARD_SIZE};
use crate::error::ParseError;

/// Parses one fixture character into a color and pattern.
///
/// Uppercase letters are Flat tiles, lowercase letters the Star variant of the same color:
/// - 'E' / 'e': `Color::Beige`
/// - 'K' / 'k': `Color::Pink`
/// - 'P' / 'p': `Color::Purple`
/// - 'G' / 'g': `Color::LightGreen`
/// - 'B' / 'b': `Color::Blue`
/// - 'O' / 'o': `Color::Orange`
pub fn parse_tile_char(c: char) -> Option<(Color, Pattern)> {
    if let Some(color) = Color::from_char(c) {
        return Some((color, Pattern::Flat));
    }
    if c.is_ascii_lowercase() {
        return Color::from_char(c.to_ascii_uppercase()).map(|color| (color, Pattern::Star));
    }
    None
}

/// Parses an array of string slices into a `Board`.
///
/// Each string slice in the input array represents a row on the board, starting from row 0.
/// If fewer than `BOARD_SIZE` rows are provided, the remaining rows are left empty.
/// Similarly, if a row string is shorter than `BOARD_SIZE` characters, the rest of that
/// row is left empty. `.` marks an empty slot; see [`parse_tile_char`] for the tile letters.
///
/// Tiles get ids in row-major order, starting at 0.
///
/// # Returns
/// * `Ok(Board)` if parsing is successful.
/// * `Err(ParseError)` if there are too many rows, a row is too long, or a character
///   is not recognized.
///
/// # Examples
/// ```
/// use match3_engine::utils::board_from_str_array;
/// use match3_engine::engine::{Color, Pattern};
///
/// let board = board_from_str_array(&["EKg", "B.P"]).unwrap();
/// let star = board.get_tile(0, 2).unwrap();
/// assert_eq!(star.color, Color::LightGreen);
/// assert_eq!(star.pattern, Pattern::Star);
/// assert_eq!(board.get_tile(1, 1), None);
/// assert_eq!(board.get_tile(2, 0), None); // Row 2 is entirely empty
///
/// assert!(board_from_str_array(&["RXB"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, ParseError> {
    if s.len() > BOARD_SIZE {
        return Err(ParseError::TooManyRows {
            expected: BOARD_SIZE,
            found: s.len(),
        });
    }

    let mut board = Board::new_empty();

    for (r, row_str) in s.iter().enumerate() {
        let found = row_str.chars().count();
        if found > BOARD_SIZE {
            return Err(ParseError::RowTooLong {
                row: r,
                expected: BOARD_SIZE,
                found,
            });
        }

        for (c, char_tile) in row_str.chars().enumerate() {
            if char_tile == '.' {
                continue;
            }
            let (color, pattern) = parse_tile_char(char_tile).ok_or(ParseError::UnrecognizedChar {
                ch: char_tile,
                row: r,
                col: c,
            })?;
            board.place(Position::new(r, c), color, pattern);
        }
    }
    Ok(board)
}

/// Parses a scripted tile sequence, e.g. `"GOg"`, for deterministic refills.
///
/// Whitespace is ignored. `.` is not allowed here.
pub fn tile_sequence_from_str(s: &str) -> Result<SequenceTiles, ParseError> {
    let mut tiles = Vec::new();
    for (i, ch) in s.chars().filter(|ch| !ch.is_whitespace()).enumerate() {
        let tile = parse_tile_char(ch).ok_or(ParseError::UnrecognizedChar { ch, row: 0, col: i })?;
        tiles.push(tile);
    }
    SequenceTiles::new(tiles).ok_or(ParseError::EmptySequence)
}
