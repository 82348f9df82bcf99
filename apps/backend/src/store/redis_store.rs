//! Redis-backed match store: JSON values, `SET … EX` writes and `EXPIRE` refreshes.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::warn;

use super::{decode_record, encode_record, MatchKey, MatchStore};
use crate::domain::state::Match;
use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::errors::ErrorCode;

#[derive(Clone)]
pub struct RedisMatchStore {
    conn: ConnectionManager,
}

fn unavailable(op: &'static str, err: redis::RedisError) -> DomainError {
    warn!(op, error = %err, "match store call failed");
    DomainError::infra(
        InfraErrorKind::StoreUnavailable,
        format!("match store unavailable during {op}"),
    )
}

impl RedisMatchStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;

        let conn = ConnectionManager::new(client).await.map_err(|err| {
            AppError::unavailable(
                ErrorCode::StoreUnavailable,
                format!("Unable to initialize Redis connection manager: {err}"),
            )
        })?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl MatchStore for RedisMatchStore {
    async fn get(&self, key: &MatchKey) -> Result<Option<Match>, DomainError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(key.as_str())
            .await
            .map_err(|e| unavailable("get", e))?;
        raw.as_deref().map(decode_record).transpose()
    }

    async fn set(&self, key: &MatchKey, record: &Match, ttl_secs: u64) -> Result<(), DomainError> {
        let raw = encode_record(record)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key.as_str(), raw, ttl_secs)
            .await
            .map_err(|e| unavailable("set", e))
    }

    async fn refresh_ttl(&self, key: &MatchKey, ttl_secs: u64) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        conn.expire::<_, ()>(key.as_str(), ttl)
            .await
            .map_err(|e| unavailable("expire", e))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| unavailable("ping", e))
    }
}
