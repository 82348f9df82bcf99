//! Final standings helpers used when a match is settled on the ledger.

use std::collections::BTreeMap;

use crate::domain::state::PlayerId;

/// Every player tied for the top score, in `players` order. Empty when there
/// are no players. `scores` is aligned with `players`; missing entries count as 0.
pub fn compute_winners(players: &[PlayerId], scores: &[u32]) -> Vec<PlayerId> {
    let score_of = |i: usize| scores.get(i).copied().unwrap_or(0);
    let Some(top) = (0..players.len()).map(score_of).max() else {
        return Vec::new();
    };
    players
        .iter()
        .enumerate()
        .filter(|(i, _)| score_of(*i) == top)
        .map(|(_, p)| p.clone())
        .collect()
}

/// Scores laid out in `canonical` order; players absent from `by_player` get 0.
pub fn align_scores(canonical: &[PlayerId], by_player: &BTreeMap<PlayerId, u32>) -> Vec<u32> {
    canonical
        .iter()
        .map(|p| by_player.get(p).copied().unwrap_or(0))
        .collect()
}
