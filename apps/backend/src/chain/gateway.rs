//! HTTP client for the chain gateway.
//!
//! The gateway wraps the game, card and leaderboard contracts behind a small
//! JSON API and holds the relayer key, so transaction signing never happens in
//! this process. Read failures surface as upstream-unavailable; rejected
//! transactions surface as ledger failures carrying the gateway's reason.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    Delegation, FinalizeRequest, GameStatus, Ledger, RelayerInfo, RosterSource, ScorePushRequest,
    TxReceipt,
};
use crate::catalog::{CardCatalog, CardKind, CardPage};
use crate::domain::state::PlayerId;
use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind};

#[derive(Error, Debug)]
enum GatewayError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {status}: {body}")]
    FailedWithBody { status: StatusCode, body: String },
}

impl GatewayError {
    fn into_read_error(self, what: &str) -> DomainError {
        warn!(what, error = %self, "chain gateway read failed");
        DomainError::infra(
            InfraErrorKind::UpstreamUnavailable,
            format!("chain gateway unavailable ({what})"),
        )
    }

    fn into_tx_error(self, what: &str) -> DomainError {
        warn!(what, error = %self, "chain gateway transaction failed");
        let reason = match self {
            GatewayError::FailedWithBody { body, .. } => serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.reason.or(b.error))
                .unwrap_or(body),
            other => other.to_string(),
        };
        DomainError::infra(InfraErrorKind::LedgerFailure, format!("{what} failed: {reason}"))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    reason: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusBody {
    status: GameStatus,
}

#[derive(Deserialize)]
struct PlayersBody {
    players: Vec<PlayerId>,
}

#[derive(Deserialize)]
struct CountBody {
    count: u64,
}

#[derive(Deserialize)]
struct NonceBody {
    nonce: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleBody {
    has_role: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    start_id: u64,
    max_items: u32,
    only_active: bool,
}

#[derive(Clone)]
pub struct ChainGateway {
    http_client: Client,
    base_url: String,
    game_address: String,
}

impl ChainGateway {
    pub fn new(base_url: &str, game_address: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("failed to build chain gateway client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            game_address: game_address.to_ascii_lowercase(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn game_url(&self, game_id: u64, rest: &str) -> String {
        self.url(&format!("games/{}/{game_id}/{rest}", self.game_address))
    }

    async fn read<T: DeserializeOwned>(
        &self,
        url: String,
        query: Option<&PageQuery>,
    ) -> Result<T, GatewayError> {
        let mut request = self.http_client.get(&url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self.http_client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::FailedWithBody { status, body });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RosterSource for ChainGateway {
    async fn get_status(&self, game_id: u64) -> Result<GameStatus, DomainError> {
        match self.read::<StatusBody>(self.game_url(game_id, "status"), None).await {
            Ok(body) => Ok(body.status),
            Err(GatewayError::FailedWithBody { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(GameStatus::None)
            }
            Err(e) => Err(e.into_read_error("getGameStatus")),
        }
    }

    async fn get_players(&self, game_id: u64) -> Result<Vec<PlayerId>, DomainError> {
        match self.read::<PlayersBody>(self.game_url(game_id, "players"), None).await {
            Ok(body) => Ok(body.players),
            Err(GatewayError::FailedWithBody { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(Vec::new())
            }
            Err(e) => Err(e.into_read_error("getPlayers")),
        }
    }
}

#[async_trait]
impl CardCatalog for ChainGateway {
    async fn count(&self, kind: CardKind) -> Result<u64, DomainError> {
        self.read::<CountBody>(self.url(&format!("cards/{}/count", kind.as_str())), None)
            .await
            .map(|b| b.count)
            .map_err(|e| e.into_read_error("cardCount"))
    }

    async fn page(
        &self,
        kind: CardKind,
        start_id: u64,
        max_items: u32,
        only_active: bool,
    ) -> Result<CardPage, DomainError> {
        let query = PageQuery {
            start_id,
            max_items,
            only_active,
        };
        self.read::<CardPage>(
            self.url(&format!("cards/{}/page", kind.as_str())),
            Some(&query),
        )
        .await
        .map_err(|e| e.into_read_error("cardPage"))
    }
}

#[async_trait]
impl Ledger for ChainGateway {
    async fn relayer(&self) -> Result<RelayerInfo, DomainError> {
        self.read::<RelayerInfo>(self.url("relayer"), None)
            .await
            .map_err(|e| e.into_read_error("relayer"))
    }

    async fn delegation(&self, game_id: u64, player: &PlayerId) -> Result<Delegation, DomainError> {
        self.read::<Delegation>(self.game_url(game_id, &format!("delegates/{player}")), None)
            .await
            .map_err(|e| e.into_read_error("delegate"))
    }

    async fn finalize_nonce(&self, game_id: u64) -> Result<u64, DomainError> {
        self.read::<NonceBody>(self.game_url(game_id, "finalize-nonce"), None)
            .await
            .map(|b| b.nonce)
            .map_err(|e| e.into_read_error("finalizeNonce"))
    }

    async fn finalize(&self, request: &FinalizeRequest) -> Result<TxReceipt, DomainError> {
        let receipt: TxReceipt = self
            .post(self.game_url(request.game_id, "finalize"), request)
            .await
            .map_err(|e| e.into_tx_error("finalizeByDelegate"))?;
        debug!(game_id = request.game_id, tx = %receipt.tx_hash, "finalize mined");
        Ok(receipt)
    }

    async fn has_submitter_role(&self, relayer: &PlayerId) -> Result<Option<bool>, DomainError> {
        match self
            .read::<RoleBody>(self.url(&format!("roles/submitter/{relayer}")), None)
            .await
        {
            Ok(body) => Ok(body.has_role),
            Err(GatewayError::FailedWithBody { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(None)
            }
            Err(e) => Err(e.into_read_error("hasRole")),
        }
    }

    async fn push_scores(&self, request: &ScorePushRequest) -> Result<TxReceipt, DomainError> {
        let receipt: TxReceipt = self
            .post(self.game_url(request.game_id, "push-scores"), request)
            .await
            .map_err(|e| e.into_tx_error("externalPushScores"))?;
        debug!(game_id = request.game_id, tx = %receipt.tx_hash, "score push mined");
        Ok(receipt)
    }
}
