use std::sync::Arc;

use tracing::info;

use crate::catalog::CardCatalog;
use crate::chain::{ChainGateway, Ledger, RosterSource};
use crate::config::Config;
use crate::domain::rules::TimerConfig;
use crate::error::AppError;
use crate::infra::clock::Clock;
use crate::state::app_state::{AppState, GameSettings};
use crate::store::{InMemoryMatchStore, MatchStore, RedisMatchStore};

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    store: Option<Arc<dyn MatchStore>>,
    redis_url: Option<String>,
    roster: Option<Arc<dyn RosterSource>>,
    catalog: Option<Arc<dyn CardCatalog>>,
    ledger: Option<Arc<dyn Ledger>>,
    clock: Option<Arc<dyn Clock>>,
    timers: TimerConfig,
    settings: GameSettings,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            redis_url: None,
            roster: None,
            catalog: None,
            ledger: None,
            clock: None,
            timers: TimerConfig::default(),
            settings: GameSettings::default(),
        }
    }

    /// Copy deployment settings from `config`. Collaborators are wired separately.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.settings = GameSettings {
            game_address: Some(config.game_address.clone()),
            match_ttl_secs: config.match_ttl_secs,
            api_key: config.api_key.clone(),
        };
        self
    }

    pub fn with_game_address(mut self, address: &str) -> Self {
        self.settings.game_address = Some(address.trim().to_ascii_lowercase());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.api_key = Some(key.into());
        self
    }

    pub fn with_timers(mut self, timers: TimerConfig) -> Self {
        self.timers = timers;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn MatchStore>) -> Self {
        self.store = Some(store);
        self.redis_url = None;
        self
    }

    pub fn with_memory_store(self) -> Self {
        self.with_store(Arc::new(InMemoryMatchStore::new()))
    }

    /// Connect to Redis during `build`.
    pub fn with_redis(mut self, redis_url: impl Into<String>) -> Self {
        self.redis_url = Some(redis_url.into());
        self.store = None;
        self
    }

    /// Use one gateway as roster source, card catalog and ledger.
    pub fn with_gateway(self, gateway: ChainGateway) -> Self {
        let gateway = Arc::new(gateway);
        self.with_roster(gateway.clone())
            .with_catalog(gateway.clone())
            .with_ledger(gateway)
    }

    pub fn with_roster(mut self, roster: Arc<dyn RosterSource>) -> Self {
        self.roster = Some(roster);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CardCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let store = match self.redis_url {
            Some(url) => {
                let store = RedisMatchStore::connect(&url).await?;
                info!("match store: redis");
                Some(Arc::new(store) as Arc<dyn MatchStore>)
            }
            None => self.store,
        };

        Ok(AppState::new(
            store,
            self.roster,
            self.catalog,
            self.ledger,
            self.clock,
            self.timers,
            self.settings,
        ))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
