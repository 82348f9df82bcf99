use std::sync::Arc;

use crate::catalog::CardCatalog;
use crate::chain::{Ledger, RosterSource};
use crate::domain::round_machine::RoundMachine;
use crate::domain::rules::{TimerConfig, MATCH_TTL_SECS};
use crate::error::AppError;
use crate::infra::clock::{Clock, SystemClock};
use crate::store::MatchStore;

/// Deployment-specific values the handlers need.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Lowercase game contract address; namespaces store keys and seeds.
    pub game_address: Option<String>,
    pub match_ttl_secs: u64,
    pub api_key: Option<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            game_address: None,
            match_ttl_secs: MATCH_TTL_SECS,
            api_key: None,
        }
    }
}

/// Shared application state. Collaborators are optional so partially wired
/// states can be built for tests; handlers go through `require_*`.
#[derive(Clone)]
pub struct AppState {
    store: Option<Arc<dyn MatchStore>>,
    roster: Option<Arc<dyn RosterSource>>,
    catalog: Option<Arc<dyn CardCatalog>>,
    ledger: Option<Arc<dyn Ledger>>,
    clock: Arc<dyn Clock>,
    machine: RoundMachine,
    settings: GameSettings,
}

impl AppState {
    pub(crate) fn new(
        store: Option<Arc<dyn MatchStore>>,
        roster: Option<Arc<dyn RosterSource>>,
        catalog: Option<Arc<dyn CardCatalog>>,
        ledger: Option<Arc<dyn Ledger>>,
        clock: Option<Arc<dyn Clock>>,
        timers: TimerConfig,
        settings: GameSettings,
    ) -> Self {
        Self {
            store,
            roster,
            catalog,
            ledger,
            clock: clock.unwrap_or_else(|| Arc::new(SystemClock)),
            machine: RoundMachine::new(timers),
            settings,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn MatchStore>> {
        self.store.as_ref()
    }

    pub fn require_store(&self) -> Result<Arc<dyn MatchStore>, AppError> {
        self.store
            .clone()
            .ok_or_else(|| AppError::config("match store is not configured"))
    }

    pub fn require_roster(&self) -> Result<Arc<dyn RosterSource>, AppError> {
        self.roster
            .clone()
            .ok_or_else(|| AppError::config("roster source is not configured"))
    }

    pub fn require_catalog(&self) -> Result<Arc<dyn CardCatalog>, AppError> {
        self.catalog
            .clone()
            .ok_or_else(|| AppError::config("card catalog is not configured"))
    }

    pub fn require_ledger(&self) -> Result<Arc<dyn Ledger>, AppError> {
        self.ledger
            .clone()
            .ok_or_else(|| AppError::config("ledger is not configured"))
    }

    pub fn require_game_address(&self) -> Result<&str, AppError> {
        self.settings
            .game_address
            .as_deref()
            .ok_or_else(|| AppError::config("GAME_ADDRESS is not configured"))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn machine(&self) -> &RoundMachine {
        &self.machine
    }

    pub fn timers(&self) -> &TimerConfig {
        self.machine.timers()
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
}
