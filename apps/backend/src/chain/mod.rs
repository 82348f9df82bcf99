//! External collaborators anchored on the chain: the roster/status source and
//! the ledger used to settle finished matches.
//!
//! Both are consumed through narrow traits so handlers can run against the HTTP
//! gateway in production and in-process fakes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::state::PlayerId;
use crate::errors::domain::DomainError;

pub mod gateway;

pub use gateway::ChainGateway;

/// Lobby lifecycle as reported by the game contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GameStatus {
    None = 0,
    Lobby = 1,
    Started = 2,
    Finished = 3,
    Cancelled = 4,
}

impl GameStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_started(self) -> bool {
        self == GameStatus::Started
    }
}

impl TryFrom<u8> for GameStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameStatus::None),
            1 => Ok(GameStatus::Lobby),
            2 => Ok(GameStatus::Started),
            3 => Ok(GameStatus::Finished),
            4 => Ok(GameStatus::Cancelled),
            other => Err(format!("unknown game status {other}")),
        }
    }
}

impl From<GameStatus> for u8 {
    fn from(value: GameStatus) -> Self {
        value.code()
    }
}

/// Authoritative lobby status and player order. Read fresh on every request.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn get_status(&self, game_id: u64) -> Result<GameStatus, DomainError>;
    async fn get_players(&self, game_id: u64) -> Result<Vec<PlayerId>, DomainError>;
}

/// Identity of the account that submits ledger transactions on behalf of players.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerInfo {
    pub address: PlayerId,
    pub chain_id: u64,
}

/// A player's delegation for one game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Delegation {
    pub delegate: Option<PlayerId>,
    /// Unix seconds; `0` means no expiry.
    #[serde(default)]
    pub expiry: u64,
}

impl Delegation {
    pub fn none() -> Self {
        Self {
            delegate: None,
            expiry: 0,
        }
    }

    pub fn authorizes(&self, relayer: &PlayerId, now_secs: u64) -> bool {
        self.delegate.as_ref() == Some(relayer) && (self.expiry == 0 || self.expiry >= now_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub game_id: u64,
    pub players: Vec<PlayerId>,
    pub scores: Vec<u32>,
    pub winners: Vec<PlayerId>,
    pub round_count: u32,
    pub nonce: u64,
    /// Unix seconds; `0` means no deadline.
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePushRequest {
    pub game_id: u64,
    pub players: Vec<PlayerId>,
    pub scores: Vec<u32>,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// Ledger surface used by the finalize flow. Each submission is fire-and-confirm:
/// `Ok` means the transaction was mined.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn relayer(&self) -> Result<RelayerInfo, DomainError>;
    async fn delegation(&self, game_id: u64, player: &PlayerId) -> Result<Delegation, DomainError>;
    async fn finalize_nonce(&self, game_id: u64) -> Result<u64, DomainError>;
    async fn finalize(&self, request: &FinalizeRequest) -> Result<TxReceipt, DomainError>;
    /// `None` when the contract does not expose a role check.
    async fn has_submitter_role(&self, relayer: &PlayerId) -> Result<Option<bool>, DomainError>;
    async fn push_scores(&self, request: &ScorePushRequest) -> Result<TxReceipt, DomainError>;
}
