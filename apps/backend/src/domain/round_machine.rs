//! Round state machine.
//!
//! ```text
//! prestart --(now >= prestartUntil)--> submit
//! submit   --(all non-judges submitted | now >= submitDeadline)--> judge
//! judge    --(judge pick | now >= judgeDeadline)--> summary
//! summary  --(now >= summaryUntil)--> submit (next round) | ended
//! ```
//!
//! Every transition is a pure function of the record and `now`, so any request
//! may drive it and racing requests recompute the same outcome. `tick` applies at
//! most one transition per call.

use tracing::debug;

use crate::domain::dealing::{
    after_round_draw_up, build_answer_deck, build_prompt_order, deal_initial_hands,
};
use crate::domain::rng::DetRng;
use crate::domain::rules::{
    answers_needed, judge_for_round, prompt_for_round, TimerConfig, SCHEMA_VERSION,
};
use crate::domain::seed_derivation::{auto_judge_rng, auto_submit_rng};
use crate::domain::state::{CardId, LastRound, Match, Phase, PlayerId};
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, ValidationKind};

/// Everything needed to create a playable match.
#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub seed: String,
    pub players: Vec<PlayerId>,
    pub prompt_ids: Vec<CardId>,
    pub answer_ids: Vec<CardId>,
}

/// A validated player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Submit { answer_id: CardId },
    JudgePick { winner: PlayerId },
    /// Only drives `tick`.
    Nudge,
}

impl PlayerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Submit { .. } => "submit",
            PlayerAction::JudgePick { .. } => "judge_pick",
            PlayerAction::Nudge => "nudge",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoundMachine {
    timers: TimerConfig,
}

fn phase_mismatch(m: &Match) -> DomainError {
    DomainError::validation(
        ValidationKind::PhaseMismatch,
        format!("phase={}", m.phase.name()),
    )
}

impl RoundMachine {
    pub fn new(timers: TimerConfig) -> Self {
        Self { timers }
    }

    pub fn timers(&self) -> &TimerConfig {
        &self.timers
    }

    /// Build, shuffle and deal a fresh match in `prestart`.
    ///
    /// Refuses to build anything when either catalog list is empty.
    pub fn new_match(&self, setup: MatchSetup, now: i64) -> Result<Match, DomainError> {
        if setup.prompt_ids.is_empty() {
            return Err(DomainError::infra(
                InfraErrorKind::EmptyCatalog,
                "no active prompts",
            ));
        }
        if setup.answer_ids.is_empty() {
            return Err(DomainError::infra(
                InfraErrorKind::EmptyCatalog,
                "no active answers",
            ));
        }

        let mut rng = DetRng::from_hex(&setup.seed);
        let prompt_order = build_prompt_order(&setup.prompt_ids, &mut rng);
        let needed = answers_needed(setup.players.len(), self.timers.rounds_total);
        let answers_deck = build_answer_deck(&setup.answer_ids, needed, &mut rng);

        let mut m = self.empty_record(setup.seed, setup.players, now);
        m.prompt_id = prompt_for_round(&prompt_order, 1);
        m.prompt_order = prompt_order;
        m.answers_deck = answers_deck;
        deal_initial_hands(&mut m);
        Ok(m)
    }

    /// Placeholder record with no prompts or deck; replaced once the match can
    /// be initialized properly.
    pub fn shell(&self, seed: String, players: Vec<PlayerId>, now: i64) -> Match {
        self.empty_record(seed, players, now)
    }

    fn empty_record(&self, seed: String, players: Vec<PlayerId>, now: i64) -> Match {
        let scores = players.iter().map(|p| (p.clone(), 0)).collect();
        Match {
            v: SCHEMA_VERSION,
            seed,
            judge: judge_for_round(&players, 1).cloned(),
            players,
            round: 1,
            rounds_total: self.timers.rounds_total,
            prompt_order: Vec::new(),
            prompt_id: None,
            phase: Phase::Prestart {
                prestart_until: now + self.timers.prestart_ms(),
            },
            answers_deck: Vec::new(),
            draw_ptr: 0,
            hands: Default::default(),
            seen_answers: Default::default(),
            submissions: Default::default(),
            scores,
            last: None,
            started_at: now,
        }
    }

    /// Apply at most one due transition. Returns whether the record changed.
    pub fn tick(&self, m: &mut Match, now: i64) -> bool {
        let before = m.phase;
        let changed = match before {
            Phase::Prestart { prestart_until } if now >= prestart_until => {
                m.submissions.clear();
                m.phase = Phase::Submit {
                    submit_deadline: now + self.timers.submit_ms(),
                };
                true
            }
            Phase::Submit { submit_deadline } => {
                let missing = m.missing_submitters();
                if missing.is_empty() {
                    self.enter_judge(m, now);
                    true
                } else if now >= submit_deadline {
                    self.auto_submit(m, &missing);
                    self.enter_judge(m, now);
                    true
                } else {
                    false
                }
            }
            Phase::Judge { judge_deadline } if now >= judge_deadline => {
                let winner = self.auto_judge_pick(m);
                self.apply_round_win(m, winner, now);
                true
            }
            Phase::Summary { summary_until } if now >= summary_until => {
                self.begin_next_or_end(m, now);
                true
            }
            _ => false,
        };

        if changed {
            debug!(
                round = m.round,
                from = before.name(),
                to = m.phase.name(),
                "round phase advanced"
            );
        }
        changed
    }

    fn enter_judge(&self, m: &mut Match, now: i64) {
        m.phase = Phase::Judge {
            judge_deadline: now + self.timers.judge_ms(),
        };
    }

    /// Each straggler plays a card picked from their own hand by a sub-stream
    /// keyed on round and player. Empty hands are skipped.
    fn auto_submit(&self, m: &mut Match, missing: &[PlayerId]) {
        for player in missing {
            let hand = m.hand(player);
            if hand.is_empty() {
                continue;
            }
            let idx = auto_submit_rng(&m.seed, m.round, player).pick(hand.len());
            let card = hand[idx];
            debug!(round = m.round, player = %player, card, "auto-submitted");
            m.submissions.insert(player.clone(), card);
        }
    }

    /// Deterministic winner among submitters, `None` when nobody submitted.
    fn auto_judge_pick(&self, m: &Match) -> Option<PlayerId> {
        if m.submissions.is_empty() {
            return None;
        }
        let entries: Vec<&PlayerId> = m.submissions.keys().collect();
        let idx = auto_judge_rng(&m.seed, m.round).pick(entries.len());
        entries.get(idx).map(|p| (*p).clone())
    }

    /// Score the round, snapshot `last`, draw up and move to `summary`.
    ///
    /// The only place scores change and cards are replenished.
    pub fn apply_round_win(&self, m: &mut Match, winner: Option<PlayerId>, now: i64) {
        let winning_answer_id = winner
            .as_ref()
            .and_then(|w| m.submissions.get(w).copied());
        if let Some(w) = &winner {
            *m.scores.entry(w.clone()).or_insert(0) += 1;
        }
        m.last = Some(LastRound {
            round: m.round,
            winner,
            winning_answer_id,
            completed_at: now,
        });
        after_round_draw_up(m);
        m.phase = Phase::Summary {
            summary_until: now + self.timers.summary_ms(),
        };
    }

    /// End the match after the last round, otherwise rotate into the next one.
    pub fn begin_next_or_end(&self, m: &mut Match, now: i64) {
        if m.round >= m.rounds_total {
            m.phase = Phase::Ended;
            return;
        }
        m.round += 1;
        m.judge = judge_for_round(&m.players, m.round).cloned();
        m.prompt_id = prompt_for_round(&m.prompt_order, m.round);
        m.submissions.clear();
        m.phase = Phase::Submit {
            submit_deadline: now + self.timers.submit_ms(),
        };
    }

    /// Record `player`'s answer. Moves straight to `judge` once nobody is missing.
    pub fn submit(
        &self,
        m: &mut Match,
        player: &PlayerId,
        answer_id: CardId,
        now: i64,
    ) -> Result<(), DomainError> {
        if !m.is_member(player) {
            return Err(DomainError::validation(
                ValidationKind::NotAMember,
                "not a player in this match",
            ));
        }
        if !matches!(m.phase, Phase::Submit { .. }) {
            return Err(phase_mismatch(m));
        }
        if m.is_judge(player) {
            return Err(DomainError::validation(
                ValidationKind::JudgeCannotSubmit,
                "judge cannot submit",
            ));
        }
        if m.submissions.contains_key(player) {
            return Err(DomainError::conflict(
                ConflictKind::AlreadySubmitted,
                "already submitted",
            ));
        }
        if !m.hand(player).contains(&answer_id) {
            return Err(DomainError::validation(
                ValidationKind::CardNotInHand,
                "answer not in hand",
            ));
        }

        m.submissions.insert(player.clone(), answer_id);
        if m.missing_submitters().is_empty() {
            self.enter_judge(m, now);
        }
        Ok(())
    }

    /// Judge chooses the round winner among submitters.
    pub fn judge_pick(
        &self,
        m: &mut Match,
        player: &PlayerId,
        winner: &PlayerId,
        now: i64,
    ) -> Result<(), DomainError> {
        if !matches!(m.phase, Phase::Judge { .. }) {
            return Err(phase_mismatch(m));
        }
        if !m.is_judge(player) {
            return Err(DomainError::validation(
                ValidationKind::NotJudge,
                "only the judge can pick",
            ));
        }
        if !m.is_member(winner) {
            return Err(DomainError::validation(
                ValidationKind::UnknownPlayer,
                "bad winner",
            ));
        }
        if !m.submissions.contains_key(winner) {
            return Err(DomainError::validation(
                ValidationKind::NoSubmission,
                "winner has no submission",
            ));
        }

        self.apply_round_win(m, Some(winner.clone()), now);
        Ok(())
    }

    /// Dispatch a player action. Rejections leave `m` untouched.
    pub fn apply(
        &self,
        m: &mut Match,
        actor: &PlayerId,
        action: &PlayerAction,
        now: i64,
    ) -> Result<(), DomainError> {
        match action {
            PlayerAction::Submit { answer_id } => self.submit(m, actor, *answer_id, now),
            PlayerAction::JudgePick { winner } => self.judge_pick(m, actor, winner, now),
            PlayerAction::Nudge => Ok(()),
        }
    }
}
