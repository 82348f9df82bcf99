//! Fixed game constants, timer configuration and rotation helpers.

use serde::{Deserialize, Serialize};

use crate::domain::state::{CardId, PlayerId};

/// Cards held by every player between rounds.
pub const HAND_SIZE: usize = 7;
/// Rounds per match unless configured otherwise.
pub const ROUNDS_TOTAL: u32 = 10;
/// Layout version of the persisted match record.
pub const SCHEMA_VERSION: u32 = 3;
/// Store retention, refreshed on every access.
pub const MATCH_TTL_SECS: u64 = 24 * 60 * 60;

/// Phase durations and match length. Built once at startup and handed to the
/// round machine; transition logic never reads the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    pub prestart_secs: u64,
    pub submit_secs: u64,
    pub judge_secs: u64,
    pub summary_secs: u64,
    pub rounds_total: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            prestart_secs: 10,
            submit_secs: 45,
            judge_secs: 30,
            summary_secs: 6,
            rounds_total: ROUNDS_TOTAL,
        }
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

impl TimerConfig {
    pub fn prestart_ms(&self) -> i64 {
        secs_to_ms(self.prestart_secs)
    }

    pub fn submit_ms(&self) -> i64 {
        secs_to_ms(self.submit_secs)
    }

    pub fn judge_ms(&self) -> i64 {
        secs_to_ms(self.judge_secs)
    }

    pub fn summary_ms(&self) -> i64 {
        secs_to_ms(self.summary_secs)
    }
}

/// Judge for a 1-based round: `players[(round - 1) % len]`.
pub fn judge_for_round(players: &[PlayerId], round: u32) -> Option<&PlayerId> {
    if players.is_empty() {
        return None;
    }
    players.get(round.saturating_sub(1) as usize % players.len())
}

/// Prompt for a 1-based round: `order[(round - 1) % len]`.
pub fn prompt_for_round(prompt_order: &[CardId], round: u32) -> Option<CardId> {
    if prompt_order.is_empty() {
        return None;
    }
    prompt_order
        .get(round.saturating_sub(1) as usize % prompt_order.len())
        .copied()
}

/// Draws a match can consume: initial hands plus one replacement per
/// non-judge player per round.
pub fn answers_needed(player_count: usize, rounds_total: u32) -> usize {
    player_count * HAND_SIZE + rounds_total as usize * player_count.saturating_sub(1)
}
