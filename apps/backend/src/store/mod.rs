//! Match state store.
//!
//! One serialized [`Match`] per `(contract, game_id)`, always read and written
//! whole. There is no compare-and-swap: concurrent writers race and the last
//! write wins. The round machine tolerates this because every deadline-driven
//! transition is recomputed identically from time and state on the next read.

use std::fmt;

use async_trait::async_trait;

use crate::domain::rules::SCHEMA_VERSION;
use crate::domain::state::Match;
use crate::errors::domain::{DomainError, InfraErrorKind};

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryMatchStore;
pub use redis_store::RedisMatchStore;

/// Store key for one match: `cah:{contract}:{game_id}:state`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn new(contract_address: &str, game_id: u64) -> Self {
        Self(format!(
            "cah:{}:{}:state",
            contract_address.trim().to_ascii_lowercase(),
            game_id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn get(&self, key: &MatchKey) -> Result<Option<Match>, DomainError>;

    /// Replace the whole record and reset its expiry.
    async fn set(&self, key: &MatchKey, record: &Match, ttl_secs: u64) -> Result<(), DomainError>;

    /// Extend the expiry of an existing record; a missing key is not an error.
    async fn refresh_ttl(&self, key: &MatchKey, ttl_secs: u64) -> Result<(), DomainError>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> Result<(), DomainError>;
}

pub(crate) fn encode_record(record: &Match) -> Result<String, DomainError> {
    serde_json::to_string(record).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::Other("encode".into()),
            format!("failed to encode match record: {e}"),
        )
    })
}

/// Parse a stored record, refusing layouts other than the current schema.
pub(crate) fn decode_record(raw: &str) -> Result<Match, DomainError> {
    let version = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("v").and_then(serde_json::Value::as_u64));
    if version != Some(u64::from(SCHEMA_VERSION)) {
        return Err(DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!(
                "unsupported match record version {version:?}, expected {SCHEMA_VERSION}"
            ),
        ));
    }
    serde_json::from_str(raw).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("malformed match record: {e}"),
        )
    })
}
