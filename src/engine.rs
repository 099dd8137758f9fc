//! Core board engine for the match-3 puzzle.
//!
//! This module defines the game's fundamental components:
//! - `Color`, `Pattern` and `Tile`: what sits in one grid cell.
//! - `TileSource`: where new tiles come from (`RandomTiles`, `SequenceTiles`).
//! - `Board`: the 8x8 grid and every structural operation on it: generation,
//!   swapping, match detection, removal, gravity collapse and refill.
//!
//! Everything here is synchronous and deterministic given a `TileSource`.
//! Sequencing these operations into a full player move lives in `resolver`.
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use tracing::trace;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Defines the size of the game board (width and height).
/// The board is always square.
pub const BOARD_SIZE: usize = 8;

/// The six tile colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Beige,
    Pink,
    Purple,
    LightGreen,
    Blue,
    Orange,
}

/// Every color, in the order the random generator indexes them.
pub const ALL_COLORS: [Color; 6] = [
    Color::Beige,
    Color::Pink,
    Color::Purple,
    Color::LightGreen,
    Color::Blue,
    Color::Orange,
];

impl Color {
    /// Converts the color to its fixture character.
    ///
    /// # Examples
    ///
    /// ```
    /// use match3_engine::engine::Color;
    /// assert_eq!(Color::Beige.to_char(), 'E');
    /// assert_eq!(Color::LightGreen.to_char(), 'G');
    /// ```
    pub fn to_char(self) -> char {
        match self {
            Color::Beige => 'E',
            Color::Pink => 'K',
            Color::Purple => 'P',
            Color::LightGreen => 'G',
            Color::Blue => 'B',
            Color::Orange => 'O',
        }
    }

    /// Inverse of [`Color::to_char`]. Only uppercase letters are accepted.
    pub fn from_char(c: char) -> Option<Color> {
        ALL_COLORS.into_iter().find(|color| color.to_char() == c)
    }

    /// Returns the ANSI background color code for terminal output.
    fn to_ansi_color_code(self) -> &'static str {
        match self {
            Color::Beige => "47",
            Color::Pink => "105",
            Color::Purple => "45",
            Color::LightGreen => "102",
            Color::Blue => "44",
            Color::Orange => "43",
        }
    }
}

/// Surface pattern of a tile. A Star inside a matched run clears its whole line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Flat,
    Star,
}

/// A (row, column) coordinate on the board. Row 0 is the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    pub fn manhattan_distance(&self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// True when `other` is directly above, below, left or right of `self`.
    pub fn is_adjacent(&self, other: Position) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One tile on the board.
///
/// Tiles are plain values. The board is the only owner of the live copy and keeps
/// `row`/`col` equal to the slot the tile sits in. `id` is unique per board and
/// survives swaps and falls, so callers can follow a tile across a cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: u64,
    pub color: Color,
    pub pattern: Pattern,
    pub row: usize,
    pub col: usize,
}

impl Tile {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }

    pub fn is_star(&self) -> bool {
        self.pattern == Pattern::Star
    }

    /// Fixture character: the color letter, lowercased for Star tiles.
    pub fn to_char(&self) -> char {
        let c = self.color.to_char();
        if self.is_star() {
            c.to_ascii_lowercase()
        } else {
            c
        }
    }

    fn moved_to(mut self, pos: Position) -> Tile {
        self.row = pos.row;
        self.col = pos.col;
        self
    }
}

/// Supplies the color and pattern of every newly generated tile.
pub trait TileSource {
    fn next_tile(&mut self) -> (Color, Pattern);
}

/// Random tile generator: a uniform color, then an independent 1-in-N Star roll.
#[derive(Clone, Debug)]
pub struct RandomTiles {
    rng: SmallRng,
    star_one_in: u32,
}

impl RandomTiles {
    /// Creates a reproducible generator. The same seed always yields the same tiles.
    pub fn new_with_seed(seed: u64, star_one_in: u32) -> Self {
        RandomTiles {
            rng: SmallRng::seed_from_u64(seed),
            star_one_in,
        }
    }

    /// Creates a generator seeded from the operating system.
    pub fn from_entropy(star_one_in: u32) -> Self {
        RandomTiles {
            rng: SmallRng::from_entropy(),
            star_one_in,
        }
    }

    /// Uses `config.seed` when present, entropy otherwise.
    pub fn from_config(config: &EngineConfig) -> Self {
        match config.seed {
            Some(seed) => Self::new_with_seed(seed, config.star_one_in),
            None => Self::from_entropy(config.star_one_in),
        }
    }
}

impl TileSource for RandomTiles {
    fn next_tile(&mut self) -> (Color, Pattern) {
        let color = ALL_COLORS[self.rng.gen_range(0..ALL_COLORS.len())];
        // The star roll overrides the Flat default and is independent of the color.
        let pattern = if self.star_one_in > 0 && self.rng.gen_range(1..=self.star_one_in) == 1 {
            Pattern::Star
        } else {
            Pattern::Flat
        };
        (color, pattern)
    }
}

/// Replays a fixed list of tiles, starting over when it runs out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceTiles {
    tiles: Vec<(Color, Pattern)>,
    cursor: usize,
}

impl SequenceTiles {
    /// Returns `None` for an empty list.
    pub fn new(tiles: Vec<(Color, Pattern)>) -> Option<Self> {
        if tiles.is_empty() {
            None
        } else {
            Some(SequenceTiles { tiles, cursor: 0 })
        }
    }
}

impl TileSource for SequenceTiles {
    fn next_tile(&mut self) -> (Color, Pattern) {
        let tile = self.tiles[self.cursor];
        self.cursor = (self.cursor + 1) % self.tiles.len();
        tile
    }
}

/// Direction of the line a match was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One match group found by [`Board::detect_matches`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub axis: Axis,
    /// Row index for horizontal matches, column index for vertical ones.
    pub line: usize,
    /// The matched tiles. For a plain run they are listed from the run's far end
    /// backwards; for a line clear, in line order.
    pub tiles: Vec<Tile>,
    /// Set when a Star in the run expanded the match to the whole line.
    pub line_clear: bool,
}

impl Match {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.tiles.iter().map(Tile::position).collect()
    }
}

/// A tile that fell during [`Board::collapse`]. `tile` already carries its new coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileDrop {
    pub tile: Tile,
    pub from: Position,
    pub to: Position,
}

/// A tile created by [`Board::refill`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSpawn {
    pub tile: Tile,
    pub to: Position,
}

/// Represents the game board as a 2D grid of optional tiles.
///
/// `grid[row][col]` is `None` only transiently, between match removal and refill.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    grid: [[Option<Tile>; BOARD_SIZE]; BOARD_SIZE],
    next_id: u64,
}

impl Board {
    /// Creates a new board with every slot empty.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::engine::Board;
    /// let board = Board::new_empty();
    /// assert_eq!(board.get_tile(0, 0), None);
    /// assert_eq!(board.empty_count(), 64);
    /// ```
    pub fn new_empty() -> Self {
        Board {
            grid: [[None; BOARD_SIZE]; BOARD_SIZE],
            next_id: 0,
        }
    }

    /// Fills every cell with a tile drawn from `source`, row by row.
    ///
    /// The result may already contain matches; see [`Board::initialize_play_board`].
    pub fn generate(source: &mut impl TileSource) -> Self {
        let mut board = Board::new_empty();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                board.generate_tile(Position::new(row, col), source);
            }
        }
        board
    }

    /// Generates boards until one has no matches, so play never starts mid-match.
    ///
    /// There is no retry cap; with six colors a matchless 8x8 fill turns up
    /// within a handful of attempts.
    ///
    /// # Arguments
    /// * `source`: Tile generator; consumed across all attempts.
    /// * `min_match_len`: Run length that counts as a match.
    pub fn initialize_play_board(source: &mut impl TileSource, min_match_len: usize) -> Self {
        let mut attempts = 1u32;
        loop {
            let board = Board::generate(source);
            if board.detect_matches(min_match_len).is_empty() {
                trace!(attempts, "generated matchless play board");
                return board;
            }
            trace!(attempts, "generated board has matches, retrying");
            attempts += 1;
        }
    }

    /// Creates a matchless play board from a seed using the default generation rules.
    pub fn new_random_with_seed(seed: u64) -> Self {
        let config = EngineConfig::default();
        let mut source = RandomTiles::new_with_seed(seed, config.star_one_in);
        Board::initialize_play_board(&mut source, config.min_match_len)
    }

    /// Places a fresh tile at `pos`, assigning it the next id. Overwrites whatever was there.
    ///
    /// # Panics
    /// Panics if `pos` is outside the board.
    pub fn place(&mut self, pos: Position, color: Color, pattern: Pattern) -> Tile {
        let tile = Tile {
            id: self.next_id,
            color,
            pattern,
            row: pos.row,
            col: pos.col,
        };
        self.next_id += 1;
        self.grid[pos.row][pos.col] = Some(tile);
        tile
    }

    /// Draws one tile from `source` and places it at `pos`.
    pub fn generate_tile(&mut self, pos: Position, source: &mut impl TileSource) -> Tile {
        let (color, pattern) = source.next_tile();
        self.place(pos, color, pattern)
    }

    /// Returns the tile at row `r`, column `c`, if any.
    ///
    /// # Panics
    /// Panics if `r` or `c` are outside the board dimensions.
    pub fn get_tile(&self, r: usize, c: usize) -> Option<Tile> {
        self.grid[r][c]
    }

    /// Like [`Board::get_tile`], but returns `None` for out-of-bounds positions.
    pub fn tile_at(&self, pos: Position) -> Option<Tile> {
        if pos.in_bounds() {
            self.grid[pos.row][pos.col]
        } else {
            None
        }
    }

    /// Returns an immutable reference to the underlying grid.
    pub fn get_grid(&self) -> &[[Option<Tile>; BOARD_SIZE]; BOARD_SIZE] {
        &self.grid
    }

    /// Exchanges the contents of two slots and updates the tiles' coordinates.
    ///
    /// This is a purely structural operation: it does not look for matches and
    /// does not require adjacency. Applying the same swap twice restores the board.
    ///
    /// # Panics
    /// Panics if either position is outside the board.
    pub fn swap(&mut self, a: Position, b: Position) {
        let first = self.grid[a.row][a.col].map(|tile| tile.moved_to(b));
        let second = self.grid[b.row][b.col].map(|tile| tile.moved_to(a));
        self.grid[a.row][a.col] = second;
        self.grid[b.row][b.col] = first;
    }

    /// Finds every horizontal and vertical match on the board.
    ///
    /// Each row is scanned left to right, then each column top to bottom, counting
    /// runs of equal color. When a run of at least `min_match_len` ends, it becomes a
    /// match group. If any tile of that run is a Star, the group is the whole row
    /// (or column) instead.
    ///
    /// Horizontal and vertical groups may share tiles; they are not merged.
    ///
    /// # Returns
    /// The match groups, rows first, then columns. Empty when the board is stable.
    pub fn detect_matches(&self, min_match_len: usize) -> Vec<Match> {
        let mut matches = Vec::new();
        for row in 0..BOARD_SIZE {
            self.scan_line(Axis::Horizontal, row, min_match_len, &mut matches);
        }
        for col in 0..BOARD_SIZE {
            self.scan_line(Axis::Vertical, col, min_match_len, &mut matches);
        }
        matches
    }

    fn cell(&self, axis: Axis, line: usize, index: usize) -> Option<Tile> {
        match axis {
            Axis::Horizontal => self.grid[line][index],
            Axis::Vertical => self.grid[index][line],
        }
    }

    fn scan_line(&self, axis: Axis, line: usize, min_match_len: usize, matches: &mut Vec<Match>) {
        let mut run_color = self.cell(axis, line, 0).map(|tile| tile.color);
        let mut run_len = 1;

        for index in 1..BOARD_SIZE {
            let color = self.cell(axis, line, index).map(|tile| tile.color);
            if color.is_some() && color == run_color {
                run_len += 1;
                continue;
            }

            if run_color.is_some() && run_len >= min_match_len {
                matches.push(self.materialize(axis, line, index, run_len));
            }
            run_color = color;
            run_len = 1;

            // A run starting here cannot reach the minimum length any more.
            if BOARD_SIZE - index < min_match_len {
                break;
            }
        }

        if run_color.is_some() && run_len >= min_match_len {
            matches.push(self.materialize(axis, line, BOARD_SIZE, run_len));
        }
    }

    /// Builds the match for the run ending just before `end`, walking it backwards.
    fn materialize(&self, axis: Axis, line: usize, end: usize, run_len: usize) -> Match {
        let mut tiles = Vec::with_capacity(run_len);
        for index in (end - run_len..end).rev() {
            let Some(tile) = self.cell(axis, line, index) else {
                continue;
            };
            if tile.is_star() {
                let whole_line = (0..BOARD_SIZE)
                    .filter_map(|i| self.cell(axis, line, i))
                    .collect();
                return Match {
                    axis,
                    line,
                    tiles: whole_line,
                    line_clear: true,
                };
            }
            tiles.push(tile);
        }
        Match {
            axis,
            line,
            tiles,
            line_clear: false,
        }
    }

    /// Removes every tile referenced by `matches` from the board and clears the list.
    ///
    /// A tile referenced by two groups is removed once; the second removal is a no-op.
    ///
    /// # Returns
    /// The number of match groups removed (one per group, not per tile).
    pub fn remove_matches(&mut self, matches: &mut Vec<Match>) -> usize {
        let groups = matches.len();
        for group in matches.iter() {
            for tile in &group.tiles {
                let slot = &mut self.grid[tile.row][tile.col];
                if slot.map_or(false, |current| current.id == tile.id) {
                    *slot = None;
                }
            }
        }
        matches.clear();
        groups
    }

    /// Applies gravity column by column.
    ///
    /// Each column is scanned from the bottom up. A tile with empty space below it
    /// drops straight to the lowest empty slot, and the scan resumes just above where
    /// it landed. The board is fully consistent on return; the descriptors only tell
    /// an animation layer what happened.
    ///
    /// # Returns
    /// One `TileDrop` per tile that moved, in the order they were moved.
    pub fn collapse(&mut self) -> Vec<TileDrop> {
        let mut drops = Vec::new();
        for col in 0..BOARD_SIZE {
            let mut lowest_empty: Option<usize> = None;
            let mut row = BOARD_SIZE;
            while row > 0 {
                row -= 1;
                match (self.grid[row][col], lowest_empty) {
                    (Some(tile), Some(target)) => {
                        let to = Position::new(target, col);
                        let tile = tile.moved_to(to);
                        self.grid[target][col] = Some(tile);
                        self.grid[row][col] = None;
                        trace!(id = tile.id, from = row, to = target, col, "tile fell");
                        drops.push(TileDrop {
                            tile,
                            from: Position::new(row, col),
                            to,
                        });
                        row = target;
                        lowest_empty = None;
                    }
                    (None, None) => lowest_empty = Some(row),
                    _ => {}
                }
            }
        }
        drops
    }

    /// Fills every empty slot with a new tile from `source`.
    ///
    /// Columns are visited left to right, each from top to bottom. New tiles are not
    /// checked against each other; any match they form is found by the next detection.
    pub fn refill(&mut self, source: &mut impl TileSource) -> Vec<TileSpawn> {
        let mut spawns = Vec::new();
        for col in 0..BOARD_SIZE {
            for row in 0..BOARD_SIZE {
                if self.grid[row][col].is_none() {
                    let to = Position::new(row, col);
                    let tile = self.generate_tile(to, source);
                    spawns.push(TileSpawn { tile, to });
                }
            }
        }
        spawns
    }

    pub fn empty_count(&self) -> usize {
        self.grid.iter().flatten().filter(|slot| slot.is_none()).count()
    }

    /// First empty slot in row-major order.
    pub fn first_empty(&self) -> Option<Position> {
        (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
            .find(|pos| self.grid[pos.row][pos.col].is_none())
    }

    /// Fails with `EmptySlot` if any slot is empty.
    pub fn verify_full(&self) -> Result<(), EngineError> {
        match self.first_empty() {
            Some(pos) => Err(EngineError::EmptySlot {
                row: pos.row,
                col: pos.col,
            }),
            None => Ok(()),
        }
    }

    /// Checks that every tile's recorded coordinates match the slot holding it.
    pub fn verify_consistency(&self) -> Result<(), EngineError> {
        for (row, cells) in self.grid.iter().enumerate() {
            for (col, slot) in cells.iter().enumerate() {
                if let Some(tile) = slot {
                    if tile.row != row || tile.col != col {
                        return Err(EngineError::CoordinateMismatch {
                            id: tile.id,
                            row,
                            col,
                            tile_row: tile.row,
                            tile_col: tile.col,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Renders the board back into fixture rows (see `utils::board_from_str_array`).
    pub fn to_rows(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|slot| slot.map_or('.', |tile| tile.to_char()))
                    .collect()
            })
            .collect()
    }

    /// Generates a string representation of the board, marking `highlight` cells.
    ///
    /// The output includes row and column numbers and uses ANSI escape codes for the
    /// tile colors. Star tiles show `**`; highlighted cells show `..`.
    pub fn to_string_with_highlight(&self, highlight: &[Position]) -> String {
        let mut output = String::new();

        output.push_str("  ");
        for c_idx in 0..BOARD_SIZE {
            output.push_str(&format!("{:<2}", c_idx));
        }
        output.push('\n');

        for r_idx in 0..BOARD_SIZE {
            output.push_str(&format!("{:<2}", r_idx));

            for c_idx in 0..BOARD_SIZE {
                let slot = self.grid[r_idx][c_idx];
                let color_code = slot.map_or("40", |tile| tile.color.to_ansi_color_code());
                let content = if highlight.contains(&Position::new(r_idx, c_idx)) {
                    ".."
                } else if slot.map_or(false, |tile| tile.is_star()) {
                    "**"
                } else {
                    "  "
                };
                output.push_str(&format!("\x1b[1;{}m{}\x1b[m", color_code, content));
            }
            if r_idx < BOARD_SIZE - 1 {
                output.push('\n');
            }
        }

        output
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(&[]))
    }
}
