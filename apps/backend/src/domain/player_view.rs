//! Requester-facing projection of a match.
//!
//! Hands are private: the projection never includes them, and [`hand_for`]
//! returns only the requester's own. Submissions are returned as the full
//! player → answer map; presenting them anonymously to the judge is left to
//! the client.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::state::{CardId, LastRound, Match, Phase, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub v: u32,
    pub seed: String,
    pub players: Vec<PlayerId>,
    pub round: u32,
    pub rounds_total: u32,
    pub judge: Option<PlayerId>,
    pub prompt_id: Option<CardId>,
    #[serde(flatten)]
    pub phase: Phase,
    pub submissions: BTreeMap<PlayerId, CardId>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub last: Option<LastRound>,
}

impl From<&Match> for PublicState {
    fn from(m: &Match) -> Self {
        Self {
            v: m.v,
            seed: m.seed.clone(),
            players: m.players.clone(),
            round: m.round,
            rounds_total: m.rounds_total,
            judge: m.judge.clone(),
            prompt_id: m.prompt_id,
            phase: m.phase,
            submissions: m.submissions.clone(),
            scores: m.scores.clone(),
            last: m.last.clone(),
        }
    }
}

/// The requester's own hand, if they hold one.
pub fn hand_for(m: &Match, me: Option<&PlayerId>) -> Option<Vec<CardId>> {
    me.and_then(|p| m.hands.get(p)).cloned()
}
