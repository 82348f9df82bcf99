//! Observe/act entry points: load the match, reconcile with the roster, drive
//! the round machine, persist, and shape the response.
//!
//! Each call is stateless. The store record is read once, mutated in memory and
//! written back whole; racing requests are settled by last-write-wins.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{load_active_ids, CardCatalog, CardKind};
use crate::chain::{GameStatus, RosterSource};
use crate::domain::player_view::{hand_for, PublicState};
use crate::domain::round_machine::{MatchSetup, PlayerAction, RoundMachine};
use crate::domain::rules::TimerConfig;
use crate::domain::seed_derivation::derive_match_seed;
use crate::domain::state::{CardId, Match, PlayerId};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};
use crate::infra::clock::Clock;
use crate::state::app_state::AppState;
use crate::store::{MatchKey, MatchStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveResponse {
    pub ok: bool,
    pub status: GameStatus,
    pub players: Vec<PlayerId>,
    pub state: Option<PublicState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<CardId>>,
    /// Requester identity as understood by the server.
    pub address: Option<PlayerId>,
    pub server_time: i64,
    pub timer_config: TimerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActResponse {
    pub ok: bool,
    pub state: Match,
}

/// Bring `m.players` in line with the roster and zero-fill missing scores.
///
/// An empty roster read is ignored. The current round keeps its judge; rotation
/// picks up the new order from the next round on. Scores are never removed.
pub fn reconcile_roster(m: &mut Match, roster: &[PlayerId]) -> bool {
    let mut changed = false;
    if !roster.is_empty() && m.players != roster {
        debug!(before = m.players.len(), after = roster.len(), "roster drift, resyncing players");
        m.players = roster.to_vec();
        changed = true;
    }
    for p in &m.players {
        if !m.scores.contains_key(p) {
            m.scores.insert(p.clone(), 0);
            changed = true;
        }
    }
    changed
}

pub struct MatchCoordinator {
    store: Arc<dyn MatchStore>,
    roster: Arc<dyn RosterSource>,
    catalog: Option<Arc<dyn CardCatalog>>,
    machine: RoundMachine,
    contract: String,
    ttl_secs: u64,
}

impl MatchCoordinator {
    pub fn from_state(state: &AppState) -> Result<Self, AppError> {
        Ok(Self {
            store: state.require_store()?,
            roster: state.require_roster()?,
            catalog: state.require_catalog().ok(),
            machine: *state.machine(),
            contract: state.require_game_address()?.to_string(),
            ttl_secs: state.settings().match_ttl_secs,
        })
    }

    fn key(&self, game_id: u64) -> MatchKey {
        MatchKey::new(&self.contract, game_id)
    }

    async fn read_roster(&self, game_id: u64) -> Result<(GameStatus, Vec<PlayerId>), AppError> {
        let (status, players) = tokio::try_join!(
            self.roster.get_status(game_id),
            self.roster.get_players(game_id)
        )?;
        Ok((status, players))
    }

    /// Load the catalog and build a dealt match. Nothing is persisted here.
    async fn initialize(
        &self,
        game_id: u64,
        players: &[PlayerId],
        now: i64,
    ) -> Result<Match, AppError> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| AppError::config("card catalog is not configured"))?;
        let (prompt_ids, answer_ids) = tokio::try_join!(
            load_active_ids(catalog.as_ref(), CardKind::Prompt),
            load_active_ids(catalog.as_ref(), CardKind::Answer)
        )?;

        let setup = MatchSetup {
            seed: derive_match_seed(&self.contract, game_id),
            players: players.to_vec(),
            prompt_ids,
            answer_ids,
        };
        let m = self.machine.new_match(setup, now)?;
        info!(
            game_id,
            players = m.players.len(),
            prompts = m.prompt_order.len(),
            deck = m.answers_deck.len(),
            "match initialized"
        );
        Ok(m)
    }

    /// Read-mostly poll: initialize on first sight of a started game, otherwise
    /// reconcile and tick once.
    pub async fn observe(
        &self,
        game_id: u64,
        me: Option<&PlayerId>,
        clock: &dyn Clock,
    ) -> Result<ObserveResponse, AppError> {
        let (status, players) = self.read_roster(game_id).await?;
        let key = self.key(game_id);
        let mut record = self.store.get(&key).await?;
        let now = clock.now_ms();
        let mut dirty = false;

        let needs_init = record.as_ref().map_or(true, Match::is_shell);
        if needs_init && status.is_started() && !players.is_empty() {
            record = Some(self.initialize(game_id, &players, now).await?);
            dirty = true;
        }

        if let Some(m) = record.as_mut() {
            dirty |= reconcile_roster(m, &players);
            let before = m.phase.name();
            if self.machine.tick(m, now) {
                debug!(game_id, round = m.round, from = before, to = m.phase.name(), "observe advanced match");
                dirty = true;
            }

            if dirty {
                self.store.set(&key, m, self.ttl_secs).await?;
            } else {
                self.store.refresh_ttl(&key, self.ttl_secs).await?;
            }
        }

        Ok(ObserveResponse {
            ok: true,
            status,
            players,
            hand: record.as_ref().and_then(|m| hand_for(m, me)),
            state: record.as_ref().map(PublicState::from),
            address: me.cloned(),
            server_time: now,
            timer_config: *self.machine.timers(),
        })
    }

    /// Apply one player action between two ticks and persist the result.
    pub async fn act(
        &self,
        game_id: u64,
        from: &PlayerId,
        action: &PlayerAction,
        clock: &dyn Clock,
    ) -> Result<ActResponse, AppError> {
        let (status, players) = self.read_roster(game_id).await?;
        if status != GameStatus::Started {
            return Err(DomainError::conflict(ConflictKind::GameNotActive, "game not active").into());
        }
        if !players.contains(from) {
            return Err(
                DomainError::validation(ValidationKind::NotAMember, "not a player").into(),
            );
        }

        let key = self.key(game_id);
        let now = clock.now_ms();
        let mut m = match self.store.get(&key).await? {
            Some(mut m) => {
                reconcile_roster(&mut m, &players);
                m
            }
            None => {
                warn!(game_id, "act before observe initialized the match, creating shell");
                self.machine
                    .shell(derive_match_seed(&self.contract, game_id), players, now)
            }
        };

        self.machine.tick(&mut m, now);
        if let Err(err) = self.machine.apply(&mut m, from, action, now) {
            info!(game_id, player = %from, action = action.name(), error = %err, "action rejected");
            return Err(err.into());
        }
        self.machine.tick(&mut m, now);

        self.store.set(&key, &m, self.ttl_secs).await?;
        debug!(game_id, player = %from, action = action.name(), phase = m.phase.name(), "action applied");
        Ok(ActResponse { ok: true, state: m })
    }
}
