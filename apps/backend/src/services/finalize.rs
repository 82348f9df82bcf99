//! Settle a finished match on the ledger: canonical order, winners, delegate
//! preflight, finalize transaction, then the leaderboard score push.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chain::{
    Delegation, FinalizeRequest, GameStatus, Ledger, RosterSource, ScorePushRequest,
};
use crate::domain::rules::ROUNDS_TOTAL;
use crate::domain::scoring::{align_scores, compute_winners};
use crate::domain::seed_derivation::score_push_request_id;
use crate::domain::state::PlayerId;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind};
use crate::extractors::GameId;
use crate::infra::clock::Clock;
use crate::state::app_state::AppState;
use crate::store::{MatchKey, MatchStore};

/// Scores may arrive aligned with `players` or keyed by player.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoresInput {
    List(Vec<u32>),
    ByPlayer(BTreeMap<PlayerId, u32>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeInput {
    pub game_id: GameId,
    #[serde(default)]
    pub players: Option<Vec<PlayerId>>,
    #[serde(default)]
    pub scores: Option<ScoresInput>,
    #[serde(default)]
    pub round_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeOutcome {
    pub ok: bool,
    pub finalized: bool,
    pub pushed: bool,
    pub winners: Vec<PlayerId>,
    pub players: Vec<PlayerId>,
    pub scores: Vec<u32>,
    pub request_id: String,
    pub tx_hashes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Key submitted scores by player. A list must line up with `players`.
fn scores_by_player(
    players: Option<&[PlayerId]>,
    scores: ScoresInput,
) -> Result<BTreeMap<PlayerId, u32>, DomainError> {
    match scores {
        ScoresInput::ByPlayer(map) => Ok(map),
        ScoresInput::List(list) => {
            let players = players.ok_or_else(|| {
                DomainError::validation(
                    ValidationKind::BadPayload,
                    "scores given as a list require players",
                )
            })?;
            if players.len() != list.len() {
                return Err(DomainError::validation(
                    ValidationKind::BadPayload,
                    format!("{} players but {} scores", players.len(), list.len()),
                ));
            }
            Ok(players.iter().cloned().zip(list).collect())
        }
    }
}

pub struct FinalizeOrchestrator {
    ledger: Arc<dyn Ledger>,
    roster: Arc<dyn RosterSource>,
    store: Option<Arc<dyn MatchStore>>,
    contract: String,
}

impl FinalizeOrchestrator {
    pub fn from_state(state: &AppState) -> Result<Self, AppError> {
        Ok(Self {
            ledger: state.require_ledger()?,
            roster: state.require_roster()?,
            store: state.store().cloned(),
            contract: state.require_game_address()?.to_string(),
        })
    }

    /// Final scores and round count from the stored match, which must be over.
    async fn stored_scores(
        &self,
        game_id: u64,
    ) -> Result<(BTreeMap<PlayerId, u32>, u32), AppError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| AppError::config("match store is not configured"))?;
        let key = MatchKey::new(&self.contract, game_id);
        let m = store.get(&key).await?.ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Match, format!("no match for game {game_id}"))
        })?;
        if !m.phase.is_ended() {
            return Err(DomainError::conflict(
                ConflictKind::MatchNotEnded,
                format!("match is in phase={}", m.phase.name()),
            )
            .into());
        }
        Ok((m.scores, m.rounds_total))
    }

    /// Players whose delegation does not authorize the relayer. Lookup errors
    /// count as no delegation.
    async fn missing_delegates(
        &self,
        game_id: u64,
        players: &[PlayerId],
        relayer: &PlayerId,
        now_secs: u64,
    ) -> Vec<PlayerId> {
        let lookups = players.iter().map(|p| async move {
            let delegation = match self.ledger.delegation(game_id, p).await {
                Ok(d) => d,
                Err(err) => {
                    warn!(game_id, player = %p, error = %err, "delegate lookup failed");
                    Delegation::none()
                }
            };
            (p, delegation)
        });
        futures_util::future::join_all(lookups)
            .await
            .into_iter()
            .filter(|(_, d)| !d.authorizes(relayer, now_secs))
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub async fn finalize(
        &self,
        input: FinalizeInput,
        clock: &dyn Clock,
    ) -> Result<FinalizeOutcome, AppError> {
        let game_id = input.game_id.get();
        let (by_player, stored_rounds) = match input.scores {
            Some(scores) => (scores_by_player(input.players.as_deref(), scores)?, None),
            None => {
                let (scores, rounds) = self.stored_scores(game_id).await?;
                (scores, Some(rounds))
            }
        };
        let round_count = input.round_count.or(stored_rounds).unwrap_or(ROUNDS_TOTAL);

        // The ledger roster fixes the order; a submitted list only keys scores.
        let players = self.roster.get_players(game_id).await?;
        if players.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::BadPayload,
                format!("game {game_id} has no players on-chain"),
            )
            .into());
        }
        let scores = align_scores(&players, &by_player);
        let winners = compute_winners(&players, &scores);

        let relayer = self.ledger.relayer().await?;
        let missing = self
            .missing_delegates(game_id, &players, &relayer.address, clock.now_secs())
            .await;
        if !missing.is_empty() {
            let list: Vec<&str> = missing.iter().map(PlayerId::as_str).collect();
            return Err(DomainError::validation(
                ValidationKind::MissingDelegates,
                format!(
                    "players must delegate to relayer {}: {}",
                    relayer.address,
                    list.join(", ")
                ),
            )
            .into());
        }

        let nonce = self.ledger.finalize_nonce(game_id).await.unwrap_or_else(|err| {
            warn!(game_id, error = %err, "finalize nonce unavailable, using 0");
            0
        });

        let mut tx_hashes = Vec::new();
        let request = FinalizeRequest {
            game_id,
            players: players.clone(),
            scores: scores.clone(),
            winners: winners.clone(),
            round_count,
            nonce,
            deadline: 0,
        };
        let finalized = match self.ledger.finalize(&request).await {
            Ok(receipt) => {
                info!(game_id, tx = %receipt.tx_hash, winners = winners.len(), "game finalized");
                tx_hashes.push(receipt.tx_hash);
                true
            }
            Err(err) => {
                let status = self.roster.get_status(game_id).await.unwrap_or(GameStatus::None);
                if status != GameStatus::Finished {
                    warn!(game_id, error = %err, "finalize failed");
                    return Err(err.into());
                }
                info!(game_id, "finalize rejected but game already finished, continuing");
                false
            }
        };

        match self.ledger.has_submitter_role(&relayer.address).await {
            Ok(Some(false)) => {
                return Err(DomainError::infra(
                    InfraErrorKind::LedgerFailure,
                    format!("relayer {} lacks the score submitter role", relayer.address),
                )
                .into());
            }
            Ok(_) => {}
            Err(err) => warn!(game_id, error = %err, "submitter role check failed, skipping"),
        }

        let request_id =
            score_push_request_id(relayer.chain_id, &self.contract, game_id, &players, &scores);
        let push = ScorePushRequest {
            game_id,
            players: players.clone(),
            scores: scores.clone(),
            request_id: request_id.clone(),
        };
        let (pushed, warning) = match self.ledger.push_scores(&push).await {
            Ok(receipt) => {
                info!(game_id, tx = %receipt.tx_hash, "scores pushed");
                tx_hashes.push(receipt.tx_hash);
                (true, None)
            }
            Err(err) => {
                warn!(game_id, error = %err, "score push failed");
                (false, Some(format!("score push failed: {err}")))
            }
        };

        Ok(FinalizeOutcome {
            ok: true,
            finalized,
            pushed,
            winners,
            players,
            scores,
            request_id,
            tx_hashes,
            warning,
        })
    }
}
