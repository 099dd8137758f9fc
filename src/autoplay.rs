use crate::engine::TileSource;
use crate::error::EngineError;
use crate::resolver::Resolver;

/// Outcome of an automated play session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoplaySummary {
    /// Number of swaps played.
    pub moves: u32,
    /// Saturates at `u32::MAX` over long sessions.
    pub total_score: u32,
    pub time_bonus: u32,
    pub match_groups: usize,
    /// Most cascade steps triggered by a single move.
    pub longest_cascade: usize,
    /// Set when the session ended because no swap on the board produces a match.
    pub stalled: bool,
}

/// Plays the first hint available, over and over, until `max_moves` swaps have been
/// made or the board is stuck.
///
/// This mirrors a player who always presses the hint key and takes it.
pub fn play_with_hints<S: TileSource>(
    resolver: &mut Resolver<S>,
    max_moves: u32,
) -> Result<AutoplaySummary, EngineError> {
    let mut summary = AutoplaySummary::default();

    while summary.moves < max_moves {
        let Some((first, second)) = resolver.find_hint() else {
            summary.stalled = true;
            break;
        };

        let report = resolver.play_move(first.position(), second.position())?;

        summary.moves += 1;
        summary.total_score = summary.total_score.saturating_add(report.total_score_delta);
        summary.time_bonus = summary.time_bonus.saturating_add(report.time_bonus_count);
        summary.match_groups += report.match_group_count;
        summary.longest_cascade = summary.longest_cascade.max(report.cascade_depth());
    }

    Ok(summary)
}
