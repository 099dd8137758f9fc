//! Swap probing: which single adjacent swap would produce a match.
//!
//! Every probe swaps two tiles on the live board, runs detection and swaps them
//! back before returning, so callers never observe an intermediate state.
use crate::engine::{Board, Position, Tile, BOARD_SIZE};

/// Finds the first swap, in scan order, that creates at least one match.
///
/// Tiles are visited row by row, left to right. For each tile the swap with its
/// right neighbor is tried first, then the swap with the neighbor below.
///
/// # Arguments
/// * `board`: The board to probe. It is temporarily mutated and always restored.
/// * `min_match_len`: Run length that counts as a match.
///
/// # Returns
/// The two tiles as they were before probing, or `None` if no single swap
/// anywhere on the board produces a match.
pub fn find_hint(board: &mut Board, min_match_len: usize) -> Option<(Tile, Tile)> {
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let here = Position::new(row, col);
            for there in [Position::new(row, col + 1), Position::new(row + 1, col)] {
                if let Some(pair) = probe_swap(board, here, there, min_match_len) {
                    return Some(pair);
                }
            }
        }
    }
    None
}

/// Lists every match-producing swap, in the same order [`find_hint`] tries them.
pub fn all_hints(board: &mut Board, min_match_len: usize) -> Vec<(Tile, Tile)> {
    let mut hints = Vec::new();
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let here = Position::new(row, col);
            for there in [Position::new(row, col + 1), Position::new(row + 1, col)] {
                hints.extend(probe_swap(board, here, there, min_match_len));
            }
        }
    }
    hints
}

/// False when the board is stuck: no single swap produces a match.
pub fn has_valid_swap(board: &mut Board, min_match_len: usize) -> bool {
    find_hint(board, min_match_len).is_some()
}

fn probe_swap(board: &mut Board, a: Position, b: Position, min_match_len: usize) -> Option<(Tile, Tile)> {
    let first = board.tile_at(a)?;
    let second = board.tile_at(b)?;

    board.swap(a, b);
    let matched = !board.detect_matches(min_match_len).is_empty();
    board.swap(a, b);

    matched.then_some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_str_array;

    const STUCK: [&str; BOARD_SIZE] = [
        "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK",
        "KPEKPEKP",
    ];

    /// Only swapping (0,2) with (1,2) lines up the three G tiles.
    const SINGLE_HINT: [&str; BOARD_SIZE] = [
        "GGPEKPEK", "KPGKPEKP", "PEKPEKPE", "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK",
        "KPEKPEKP",
    ];

    #[test]
    fn test_find_hint_returns_the_single_valid_swap() {
        let mut board = board_from_str_array(&SINGLE_HINT).unwrap();
        assert!(board.detect_matches(3).is_empty());
        let before = board.clone();

        let (first, second) = find_hint(&mut board, 3).expect("hint expected");

        assert_eq!(first.position(), Position::new(0, 2));
        assert_eq!(second.position(), Position::new(1, 2));
        assert_eq!(first.id, before.get_tile(0, 2).unwrap().id);
        assert_eq!(second.id, before.get_tile(1, 2).unwrap().id);
        assert_eq!(board, before, "probing must leave the board unchanged");
    }

    #[test]
    fn test_find_hint_on_stuck_board() {
        // No single swap on the diagonal layout lines up three equal colors.
        let mut board = board_from_str_array(&STUCK).unwrap();
        let before = board.clone();
        assert_eq!(find_hint(&mut board, 3), None);
        assert!(!has_valid_swap(&mut board, 3));
        assert_eq!(board, before);
    }

    #[test]
    fn test_all_hints_single_fixture() {
        // Listing every swap still finds only the one that lines up row 0.
        let mut board = board_from_str_array(&SINGLE_HINT).unwrap();
        let hints = all_hints(&mut board, 3);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].0.position(), Position::new(0, 2));
        assert_eq!(hints[0].1.position(), Position::new(1, 2));
    }

    #[test]
    fn test_find_hint_prefers_scan_order() {
        // Two valid swaps: (0,2)<->(1,2) for the top row and (5,2)<->(5,3) for row 5.
        let mut board = board_from_str_array(&[
            "GGPEKPEK", //
            "KPGKPEKP", //
            "PEKPEKPE", //
            "EKPEKPEK", //
            "KPEKPEKP", //
            "OOEOKPPE", //
            "EKPEKPEK", //
            "KPEKPEKP", //
        ])
        .unwrap();
        assert!(board.detect_matches(3).is_empty());
        let hints = all_hints(&mut board, 3);
        assert!(hints.len() >= 2);

        let (first, _) = find_hint(&mut board, 3).unwrap();
        assert_eq!(first.position(), Position::new(0, 2));
        assert_eq!(hints[0].0.position(), first.position());
    }

    #[test]
    fn test_find_hint_skips_empty_slots() {
        let mut board = board_from_str_array(&["GG.G"]).unwrap();
        // The only way to line up the Gs would be moving into the empty slot.
        assert_eq!(find_hint(&mut board, 3), None);
    }

    #[test]
    fn test_find_hint_vertical_swap() {
        let mut board = board_from_str_array(&["GKGE", "KGPK"]).unwrap();
        let (first, second) = find_hint(&mut board, 3).unwrap();
        // Row 0 gains G at col 1 after swapping (0,1) with (1,1).
        assert_eq!(first.position(), Position::new(0, 1));
        assert_eq!(second.position(), Position::new(1, 1));
    }
}
