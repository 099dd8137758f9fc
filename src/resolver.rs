//! Match resolution: drives one player move from the swap to a settled board.
//!
//! The resolver owns the board exclusively and moves through
//! `Idle -> Swapping -> Detecting -> (Resolved | Removing -> Collapsing -> Refilling -> Detecting)`.
//! Each cascade step completes its structural work before returning, so the board is
//! authoritative at all times; the descriptors in each [`CascadeStep`] are for an
//! animation layer to replay at its own pace.
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::engine::{
    Board, Match, Pattern, Position, RandomTiles, Tile, TileDrop, TileSource, TileSpawn, BOARD_SIZE,
};
use crate::error::{ConfigError, EngineError, SwapRejection};
use crate::hints;

/// Where the resolver is in the current player move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Swapping,
    Detecting,
    Removing,
    Collapsing,
    Refilling,
    Resolved,
}

/// Everything one detect/remove/collapse/refill cycle did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CascadeStep {
    /// The match groups found by this step's detection pass.
    pub matches: Vec<Match>,
    pub score_delta: u32,
    /// One per match group.
    pub time_bonus: u32,
    pub drops: Vec<TileDrop>,
    pub spawns: Vec<TileSpawn>,
}

impl CascadeStep {
    pub fn match_group_count(&self) -> usize {
        self.matches.len()
    }
}

/// Totals for one fully resolved player move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub total_score_delta: u32,
    pub time_bonus_count: u32,
    pub match_group_count: usize,
    /// Cascade steps in the order they happened.
    pub steps: Vec<CascadeStep>,
}

impl ResolveReport {
    /// Number of cascade steps; 0 when the move produced no match.
    pub fn cascade_depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn fall_descriptors(&self) -> Vec<TileDrop> {
        self.steps.iter().flat_map(|step| step.drops.iter().copied()).collect()
    }

    pub fn refill_descriptors(&self) -> Vec<TileSpawn> {
        self.steps.iter().flat_map(|step| step.spawns.iter().copied()).collect()
    }

    fn absorb(&mut self, step: CascadeStep) -> Result<(), EngineError> {
        self.total_score_delta = self
            .total_score_delta
            .checked_add(step.score_delta)
            .ok_or(EngineError::ScoreOverflow)?;
        self.time_bonus_count += step.time_bonus;
        self.match_group_count += step.match_group_count();
        self.steps.push(step);
        Ok(())
    }
}

/// Owns a board and resolves player moves on it.
///
/// # Examples
/// ```
/// use match3_engine::config::EngineConfig;
/// use match3_engine::resolver::Resolver;
///
/// let config = EngineConfig { seed: Some(7), ..EngineConfig::default() };
/// let mut resolver = Resolver::new(config).unwrap();
/// if let Some((a, b)) = resolver.find_hint() {
///     let report = resolver.play_move(a.position(), b.position()).unwrap();
///     assert!(report.match_group_count >= 1);
/// }
/// assert_eq!(resolver.board().empty_count(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct Resolver<S: TileSource = RandomTiles> {
    board: Board,
    source: S,
    config: EngineConfig,
    phase: Phase,
    cascade: u32,
}

impl Resolver<RandomTiles> {
    /// Creates a resolver with a fresh matchless play board, seeded from `config.seed`
    /// when present.
    /// Fails if `config` does not pass [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut source = RandomTiles::from_config(&config);
        let board = Board::initialize_play_board(&mut source, config.min_match_len);
        Resolver::with_board(board, source, config)
    }
}

impl<S: TileSource> Resolver<S> {
    /// Wraps an existing board. The board may contain matches; the next `resolve`
    /// clears them. Fails if `config` does not validate.
    pub fn with_board(board: Board, source: S, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Resolver {
            board,
            source,
            config,
            phase: Phase::Idle,
            cascade: 0,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True between an accepted swap and the end of its cascade.
    pub fn is_resolving(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Resolved)
    }

    /// A copy of the grid for renderers.
    pub fn grid_snapshot(&self) -> [[Option<Tile>; BOARD_SIZE]; BOARD_SIZE] {
        *self.board.get_grid()
    }

    /// First match-producing swap in scan order; see [`hints::find_hint`].
    pub fn find_hint(&mut self) -> Option<(Tile, Tile)> {
        hints::find_hint(&mut self.board, self.config.min_match_len)
    }

    /// Validates and commits a player swap without resolving it.
    ///
    /// Both positions must be on the board, hold a tile, and be 4-directionally
    /// adjacent. On rejection the board is untouched. The swap is kept even if it
    /// produces no match.
    pub fn request_swap(&mut self, a: Position, b: Position) -> Result<(), EngineError> {
        if self.is_resolving() {
            warn!(%a, %b, phase = ?self.phase, "swap requested while resolving");
            return Err(EngineError::Busy);
        }
        if !a.in_bounds() || !b.in_bounds() {
            return Err(reject(a, b, SwapRejection::OutOfBounds));
        }
        if !a.is_adjacent(b) {
            return Err(reject(a, b, SwapRejection::NotAdjacent));
        }
        if self.board.tile_at(a).is_none() || self.board.tile_at(b).is_none() {
            return Err(reject(a, b, SwapRejection::EmptySlot));
        }

        self.phase = Phase::Swapping;
        self.cascade = 0;
        self.board.swap(a, b);
        debug!(%a, %b, "swap committed");
        Ok(())
    }

    /// Runs one detect/remove/collapse/refill cycle.
    ///
    /// # Returns
    /// * `Ok(Some(step))` if matches were found and the board was rebuilt.
    /// * `Ok(None)` once detection finds nothing; the move is then `Resolved`.
    /// * `Err(_)` if the cascade cap is hit, the step's score overflows, or refill
    ///   left the board inconsistent. An overflowing step leaves the board untouched.
    pub fn step(&mut self) -> Result<Option<CascadeStep>, EngineError> {
        self.phase = Phase::Detecting;
        let matches = self.board.detect_matches(self.config.min_match_len);
        if matches.is_empty() {
            self.phase = Phase::Resolved;
            self.cascade = 0;
            return Ok(None);
        }

        if self.cascade >= self.config.max_cascades {
            let limit = self.config.max_cascades;
            error!(limit, "cascade did not settle");
            self.phase = Phase::Resolved;
            self.cascade = 0;
            return Err(EngineError::CascadeLimit { limit });
        }
        self.cascade += 1;

        let (score_delta, time_bonus) = match self.score_matches(&matches) {
            Some(totals) => totals,
            None => {
                error!("step score does not fit in u32");
                self.phase = Phase::Resolved;
                self.cascade = 0;
                return Err(EngineError::ScoreOverflow);
            }
        };

        self.phase = Phase::Removing;
        let mut removal = matches.clone();
        let groups = self.board.remove_matches(&mut removal);

        self.phase = Phase::Collapsing;
        let drops = self.board.collapse();

        self.phase = Phase::Refilling;
        let spawns = self.board.refill(&mut self.source);

        if let Err(err) = self
            .board
            .verify_full()
            .and_then(|()| self.board.verify_consistency())
        {
            error!(%err, "board invariant violated after refill");
            self.phase = Phase::Resolved;
            self.cascade = 0;
            return Err(err);
        }

        self.phase = Phase::Detecting;
        debug!(
            step = self.cascade,
            groups,
            score_delta,
            drops = drops.len(),
            spawns = spawns.len(),
            "cascade step applied"
        );
        Ok(Some(CascadeStep {
            matches,
            score_delta,
            time_bonus,
            drops,
            spawns,
        }))
    }

    /// Runs cascade steps until the board is stable.
    pub fn resolve(&mut self) -> Result<ResolveReport, EngineError> {
        let mut report = ResolveReport::default();
        while let Some(step) = self.step()? {
            if let Err(err) = report.absorb(step) {
                error!(%err, "move score does not fit in u32");
                self.phase = Phase::Resolved;
                self.cascade = 0;
                return Err(err);
            }
        }
        if !report.is_empty() {
            info!(
                score = report.total_score_delta,
                groups = report.match_group_count,
                cascades = report.cascade_depth(),
                "move resolved"
            );
        }
        Ok(report)
    }

    /// `request_swap` followed by `resolve`.
    pub fn play_move(&mut self, a: Position, b: Position) -> Result<ResolveReport, EngineError> {
        self.request_swap(a, b)?;
        self.resolve()
    }

    /// Per-tile scoring: each tile earns its own pattern's value, and each group
    /// earns one time bonus. `None` if the score overflows.
    fn score_matches(&self, matches: &[Match]) -> Option<(u32, u32)> {
        let mut score = 0u32;
        let mut time_bonus = 0;
        for group in matches {
            for tile in &group.tiles {
                score = score.checked_add(match tile.pattern {
                    Pattern::Star => self.config.star_score,
                    Pattern::Flat => self.config.base_score,
                })?;
            }
            time_bonus += 1;
        }
        Some((score, time_bonus))
    }
}

fn reject(a: Position, b: Position, reason: SwapRejection) -> EngineError {
    warn!(%a, %b, %reason, "swap rejected");
    EngineError::InvalidSwap { a, b, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SequenceTiles;
    use crate::utils::{board_from_str_array, tile_sequence_from_str};

    fn resolver_for(rows: &[&str], refill: &str) -> Resolver<SequenceTiles> {
        let board = board_from_str_array(rows).unwrap();
        let source = tile_sequence_from_str(refill).unwrap();
        Resolver::with_board(board, source, EngineConfig::default()).unwrap()
    }

    /// Single G run at row 2, cols 3-5. Refilling the top of those columns with
    /// G, O, G leaves no new match.
    const ROW2_RUN: [&str; BOARD_SIZE] = [
        "EKPEKPEK", "KPEKPEKP", "PEKGGGPE", "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK",
        "KPEKPEKP",
    ];

    /// Star at (4,2) inside a G run; row 4 is cleared in full.
    const ROW4_STAR: [&str; BOARD_SIZE] = [
        "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK", "GGgKPEKP", "PEKPEKPE", "EKPEKPEK",
        "KPEKPEKP",
    ];

    /// G run at row 2 cols 0-2; refilling with O, O, O triggers a second match in row 0.
    const CASCADE: [&str; BOARD_SIZE] = [
        "EKPEKPEK", "KPEKPEKP", "GGGPEKPE", "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK",
        "KPEKPEKP",
    ];

    /// No matches; swapping (0,2) with (1,2) completes a G run in row 0.
    const SINGLE_HINT: [&str; BOARD_SIZE] = [
        "GGPEKPEK", "KPGKPEKP", "PEKPEKPE", "EKPEKPEK", "KPEKPEKP", "PEKPEKPE", "EKPEKPEK",
        "KPEKPEKP",
    ];

    #[test]
    fn test_resolve_single_run_end_to_end() {
        // Clearing row 2 cols 3-5 drops rows 0-1 of those columns by one slot.
        let mut resolver = resolver_for(&ROW2_RUN, "GOG");
        let original: Vec<u64> = (3..=5)
            .map(|col| resolver.board().get_tile(2, col).unwrap().id)
            .collect();

        let report = resolver.resolve().unwrap();

        let base = resolver.config().base_score;
        assert_eq!(report.match_group_count, 1);
        assert_eq!(report.total_score_delta, 3 * base);
        assert_eq!(report.time_bonus_count, 1);
        assert_eq!(report.cascade_depth(), 1);
        for col in 3..=5 {
            let tile = resolver.board().get_tile(2, col).unwrap();
            assert!(!original.contains(&tile.id), "col {} still holds a matched tile", col);
        }
        assert_eq!(resolver.board().to_rows()[0], "EKPGOGEK");
        assert!(resolver.board().detect_matches(3).is_empty());
        assert_eq!(resolver.phase(), Phase::Resolved);
        assert!(!resolver.is_resolving());
    }

    #[test]
    fn test_resolve_descriptors() {
        let mut resolver = resolver_for(&ROW2_RUN, "GOG");
        let report = resolver.resolve().unwrap();

        // Rows 0 and 1 of cols 3-5 each fall one slot.
        let falls = report.fall_descriptors();
        assert_eq!(falls.len(), 6);
        assert!(falls.iter().all(|drop| drop.to.row == drop.from.row + 1));

        let spawns = report.refill_descriptors();
        let targets: Vec<Position> = spawns.iter().map(|spawn| spawn.to).collect();
        assert_eq!(
            targets,
            vec![Position::new(0, 3), Position::new(0, 4), Position::new(0, 5)]
        );
    }

    #[test]
    fn test_resolve_star_row_scores_per_tile() {
        // One Star and seven Flat tiles leave row 4; refill alternates G and O.
        let mut resolver = resolver_for(&ROW4_STAR, "GO");
        let report = resolver.resolve().unwrap();

        let config = resolver.config().clone();
        assert_eq!(report.match_group_count, 1);
        assert_eq!(report.steps[0].matches[0].len(), BOARD_SIZE);
        assert!(report.steps[0].matches[0].line_clear);
        assert_eq!(
            report.total_score_delta,
            config.star_score + 7 * config.base_score
        );
        assert_eq!(report.refill_descriptors().len(), BOARD_SIZE);
        assert_eq!(resolver.board().to_rows()[0], "GOGOGOGO");
        assert!(resolver.board().detect_matches(3).is_empty());
    }

    #[test]
    fn test_resolve_cascade() {
        // Step 1 clears the G run in row 2 and drops O, O, O into row 0.
        // Step 2 clears that O run and refills it with G, O, G.
        let mut resolver = resolver_for(&CASCADE, "OOOGOG");
        let report = resolver.resolve().unwrap();

        assert_eq!(report.cascade_depth(), 2);
        assert_eq!(report.match_group_count, 2);
        assert_eq!(report.time_bonus_count, 2);
        assert_eq!(report.total_score_delta, 6 * resolver.config().base_score);
        assert_eq!(resolver.board().to_rows()[0], "GOGEKPEK");
        assert_eq!(resolver.board().empty_count(), 0);
    }

    /// The second cascade step exceeds a cap of one.
    #[test]
    fn test_cascade_limit() {
        let board = board_from_str_array(&CASCADE).unwrap();
        let config = EngineConfig {
            max_cascades: 1,
            ..EngineConfig::default()
        };
        let mut resolver =
            Resolver::with_board(board, tile_sequence_from_str("OOOGOG").unwrap(), config)
                .unwrap();

        assert_eq!(
            resolver.resolve(),
            Err(EngineError::CascadeLimit { limit: 1 })
        );
        assert!(!resolver.is_resolving());
    }

    #[test]
    fn test_resolve_on_stable_board_is_empty() {
        let mut resolver = resolver_for(&SINGLE_HINT, "G");
        let before = resolver.board().clone();
        let report = resolver.resolve().unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_score_delta, 0);
        assert_eq!(resolver.board(), &before);
    }

    #[test]
    fn test_play_move_with_hint() {
        // The hinted swap completes a G run along row 0, so no tile falls.
        let mut resolver = resolver_for(&SINGLE_HINT, "OBO");
        let (a, b) = resolver.find_hint().unwrap();

        let report = resolver.play_move(a.position(), b.position()).unwrap();

        assert_eq!(report.match_group_count, 1);
        assert_eq!(report.total_score_delta, 15);
        assert!(report.fall_descriptors().is_empty());
        assert_eq!(resolver.board().to_rows()[0], "OBOEKPEK");
        assert_eq!(resolver.board().to_rows()[1], "KPPKPEKP");
    }

    #[test]
    fn test_request_swap_rejects_non_adjacent() {
        let mut resolver = resolver_for(&SINGLE_HINT, "G");
        let before = resolver.board().clone();
        let a = Position::new(0, 0);
        let b = Position::new(1, 1);

        assert_eq!(
            resolver.request_swap(a, b),
            Err(EngineError::InvalidSwap {
                a,
                b,
                reason: SwapRejection::NotAdjacent
            })
        );
        assert_eq!(resolver.board(), &before);
        assert_eq!(resolver.phase(), Phase::Idle);
    }

    #[test]
    fn test_request_swap_rejects_out_of_bounds() {
        let mut resolver = resolver_for(&SINGLE_HINT, "G");
        let result = resolver.request_swap(Position::new(7, 7), Position::new(7, 8));
        assert!(matches!(
            result,
            Err(EngineError::InvalidSwap {
                reason: SwapRejection::OutOfBounds,
                ..
            })
        ));
    }

    #[test]
    fn test_request_swap_rejects_same_tile() {
        let mut resolver = resolver_for(&SINGLE_HINT, "G");
        let p = Position::new(3, 3);
        assert!(resolver.request_swap(p, p).is_err());
    }

    #[test]
    fn test_request_swap_rejects_empty_slot() {
        let mut resolver = resolver_for(&["GK."], "G");
        let result = resolver.request_swap(Position::new(0, 1), Position::new(0, 2));
        assert!(matches!(
            result,
            Err(EngineError::InvalidSwap {
                reason: SwapRejection::EmptySlot,
                ..
            })
        ));
    }

    #[test]
    fn test_unmatched_swap_is_kept() {
        let mut resolver = resolver_for(&SINGLE_HINT, "G");
        let a = Position::new(3, 3);
        let b = Position::new(3, 4);
        let moved = resolver.board().tile_at(a).unwrap();

        let report = resolver.play_move(a, b).unwrap();

        assert!(report.is_empty());
        assert_eq!(resolver.board().tile_at(b).unwrap().id, moved.id);
    }

    #[test]
    fn test_step_by_step_phases() {
        let mut resolver = resolver_for(&ROW2_RUN, "GOG");
        assert_eq!(resolver.phase(), Phase::Idle);

        let step = resolver.step().unwrap().expect("first step has matches");
        assert_eq!(step.match_group_count(), 1);
        assert_eq!(resolver.phase(), Phase::Detecting);
        assert!(resolver.is_resolving());
        assert_eq!(
            resolver.request_swap(Position::new(0, 0), Position::new(0, 1)),
            Err(EngineError::Busy)
        );

        assert!(resolver.step().unwrap().is_none());
        assert_eq!(resolver.phase(), Phase::Resolved);
        assert!(resolver
            .request_swap(Position::new(0, 0), Position::new(0, 1))
            .is_ok());
        assert_eq!(resolver.phase(), Phase::Swapping);
    }

    #[test]
    fn test_grid_snapshot_matches_board() {
        let resolver = resolver_for(&SINGLE_HINT, "G");
        let snapshot = resolver.grid_snapshot();
        assert_eq!(&snapshot, resolver.board().get_grid());
    }

    #[test]
    fn test_new_is_seeded_and_matchless() {
        let config = EngineConfig {
            seed: Some(2024),
            ..EngineConfig::default()
        };
        let first = Resolver::new(config.clone()).unwrap();
        let second = Resolver::new(config).unwrap();
        assert_eq!(first.board(), second.board());
        assert!(first.board().detect_matches(3).is_empty());
    }

    #[test]
    fn test_random_play_keeps_board_full() {
        let config = EngineConfig {
            seed: Some(11),
            ..EngineConfig::default()
        };
        let mut resolver = Resolver::new(config).unwrap();
        for _ in 0..10 {
            let Some((a, b)) = resolver.find_hint() else {
                break;
            };
            let report = resolver.play_move(a.position(), b.position()).unwrap();
            assert!(report.match_group_count >= 1);
            assert_eq!(resolver.board().empty_count(), 0);
            assert!(resolver.board().verify_consistency().is_ok());
            assert!(resolver.board().detect_matches(3).is_empty());
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig {
            min_match_len: 1,
            seed: Some(1),
            ..EngineConfig::default()
        };
        assert!(matches!(
            Resolver::new(config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_with_board_rejects_invalid_config() {
        let board = board_from_str_array(&SINGLE_HINT).unwrap();
        let config = EngineConfig {
            min_match_len: 0,
            ..EngineConfig::default()
        };
        let result = Resolver::with_board(board, tile_sequence_from_str("G").unwrap(), config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_score_overflow_is_an_error() {
        // A maximal Star score plus the seven Flat tiles of row 4 overflows u32.
        let board = board_from_str_array(&ROW4_STAR).unwrap();
        let config = EngineConfig {
            star_score: u32::MAX,
            ..EngineConfig::default()
        };
        let mut resolver =
            Resolver::with_board(board, tile_sequence_from_str("GO").unwrap(), config).unwrap();
        let before = resolver.board().clone();

        assert_eq!(resolver.resolve(), Err(EngineError::ScoreOverflow));
        assert_eq!(resolver.board(), &before);
        assert!(!resolver.is_resolving());
    }
}
