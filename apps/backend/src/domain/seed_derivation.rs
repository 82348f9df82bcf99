//! Seed derivation for a match and its per-purpose random sub-streams.
//!
//! The match seed is fixed once from `(contract, game_id)` and never re-rolled.
//! Independent decisions (auto-submit for one player, auto-judge for a round)
//! each get their own generator keyed by a composite string, so the draw order of
//! one decision can never shift another.

use crate::domain::rng::DetRng;
use crate::domain::state::PlayerId;

/// Match seed: `0x` + BLAKE3 hex of `"{contract_lowercase}:{game_id}"`.
///
/// # Examples
///
/// ```
/// use cah_backend::domain::seed_derivation::derive_match_seed;
///
/// let a = derive_match_seed("0xABCdef0000000000000000000000000000000001", 7);
/// let b = derive_match_seed("0xabcdef0000000000000000000000000000000001", 7);
/// assert_eq!(a, b);
/// assert!(a.starts_with("0x"));
/// assert_eq!(a.len(), 66);
/// ```
pub fn derive_match_seed(contract_address: &str, game_id: u64) -> String {
    let input = format!("{}:{}", contract_address.trim().to_ascii_lowercase(), game_id);
    format!("0x{}", blake3::hash(input.as_bytes()).to_hex())
}

/// Generator for the auto-submit pick of `player` in `round`.
pub fn auto_submit_rng(seed: &str, round: u32, player: &PlayerId) -> DetRng {
    DetRng::from_key(&format!("{seed}:{round}:{player}:auto"))
}

/// Generator for the auto-judge pick of `round`.
pub fn auto_judge_rng(seed: &str, round: u32) -> DetRng {
    DetRng::from_key(&format!("{seed}:{round}:auto-judge"))
}

/// Idempotency id for a leaderboard score push.
///
/// Same inputs always give the same id, so a retried push can be recognised
/// downstream as a duplicate.
pub fn score_push_request_id(
    chain_id: u64,
    contract_address: &str,
    game_id: u64,
    players: &[PlayerId],
    scores: &[u32],
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"cah-score-push:v1");
    hasher.update(&chain_id.to_be_bytes());
    hasher.update(contract_address.trim().to_ascii_lowercase().as_bytes());
    hasher.update(&game_id.to_be_bytes());
    hasher.update(&(players.len() as u64).to_be_bytes());
    for (i, player) in players.iter().enumerate() {
        hasher.update(player.as_str().as_bytes());
        hasher.update(&scores.get(i).copied().unwrap_or(0).to_be_bytes());
    }
    format!("0x{}", hasher.finalize().to_hex())
}
