use std::fmt;
use std::path::PathBuf;

use crate::engine::Position;

/// Why a swap request was turned down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapRejection {
    /// One of the positions lies outside the board.
    OutOfBounds,
    /// The positions are not 4-directionally adjacent (Manhattan distance != 1).
    NotAdjacent,
    /// One of the slots holds no tile.
    EmptySlot,
}

impl fmt::Display for SwapRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SwapRejection::OutOfBounds => "position out of bounds",
            SwapRejection::NotAdjacent => "tiles are not adjacent",
            SwapRejection::EmptySlot => "slot is empty",
        };
        f.write_str(text)
    }
}

/// Errors raised by the board engine and the match resolver.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid swap {a} <-> {b}: {reason}")]
    InvalidSwap {
        a: Position,
        b: Position,
        reason: SwapRejection,
    },

    #[error("a resolution is already in progress")]
    Busy,

    #[error("slot ({row}, {col}) is empty after refill")]
    EmptySlot { row: usize, col: usize },

    #[error("tile {id} sits in slot ({row}, {col}) but records ({tile_row}, {tile_col})")]
    CoordinateMismatch {
        id: u64,
        row: usize,
        col: usize,
        tile_row: usize,
        tile_col: usize,
    },

    #[error("cascade did not settle within {limit} steps")]
    CascadeLimit { limit: u32 },

    #[error("score overflowed while resolving a move")]
    ScoreOverflow,
}

/// Errors produced while parsing text fixtures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid number of rows: expected at most {expected}, found {found}")]
    TooManyRows { expected: usize, found: usize },

    #[error("row {row} is too long: expected at most {expected} characters, found {found}")]
    RowTooLong {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized character '{ch}' at row {row} col {col}")]
    UnrecognizedChar { ch: char, row: usize, col: usize },

    #[error("tile sequence is empty")]
    EmptySequence,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
