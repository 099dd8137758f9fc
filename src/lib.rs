//! # Match-3 Engine Library
//!
//! This library provides the core logic of a tile-matching puzzle: an 8x8 board
//! of colored tiles, swap-driven match detection, cascade resolution (removal,
//! gravity, refill), per-tile scoring and a hint finder.
//!
//! It is used by three binaries:
//! - `human_player`: Interactive play on the command line.
//! - `auto_player`: Plays a seeded (or file-loaded) board by always taking the hint.
//! - `seed_evaluator`: Runs the hint player across many seeds and reports averages.
//!
//! ## Modules
//! - `engine`: Tiles, tile sources and the `Board` with every structural operation
//!   (generation, swap, detection, removal, collapse, refill).
//! - `resolver`: The `Resolver` state machine that turns one swap into a settled board
//!   and reports score and animation descriptors.
//! - `hints`: Swap probing to find a move that produces a match.
//! - `autoplay`: Automated play built on hints.
//! - `config`: `EngineConfig`, loadable from TOML.
//! - `error`: Error types.
//! - `utils`: Text fixtures for boards and scripted tile sequences.

pub mod autoplay;
pub mod config;
pub mod engine;
pub mod error;
pub mod hints;
pub mod resolver;
pub mod utils;

pub use config::EngineConfig;
pub use engine::{Board, Color, Pattern, Position, Tile, BOARD_SIZE};
pub use error::{ConfigError, EngineError, ParseError};
pub use resolver::{CascadeStep, Phase, ResolveReport, Resolver};
