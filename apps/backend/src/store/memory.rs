//! Process-local store for single-instance runs and tests.
//!
//! Records are kept serialized so reads go through the same decode path as
//! Redis. Expired entries are dropped when read, and swept from the whole map
//! on every write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{decode_record, encode_record, MatchKey, MatchStore};
use crate::domain::state::Match;
use crate::errors::domain::DomainError;

#[derive(Debug)]
struct Entry {
    raw: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMatchStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, including keys nobody reads anymore.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }

    /// Store raw text under `key`, bypassing encoding. Lets tests plant
    /// corrupted or outdated records.
    pub fn put_raw(&self, key: &MatchKey, raw: impl Into<String>, ttl_secs: u64) {
        self.entries.insert(
            key.as_str().to_string(),
            Entry {
                raw: raw.into(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn get(&self, key: &MatchKey) -> Result<Option<Match>, DomainError> {
        let raw = {
            let Some(entry) = self.entries.get(key.as_str()) else {
                return Ok(None);
            };
            if entry.expires_at <= Instant::now() {
                None
            } else {
                Some(entry.raw.clone())
            }
        };
        match raw {
            Some(raw) => decode_record(&raw).map(Some),
            None => {
                self.entries.remove(key.as_str());
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &MatchKey, record: &Match, ttl_secs: u64) -> Result<(), DomainError> {
        let raw = encode_record(record)?;
        self.sweep_expired();
        self.put_raw(key, raw, ttl_secs);
        Ok(())
    }

    async fn refresh_ttl(&self, key: &MatchKey, ttl_secs: u64) -> Result<(), DomainError> {
        if let Some(mut entry) = self.entries.get_mut(key.as_str()) {
            entry.expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
