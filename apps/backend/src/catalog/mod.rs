//! Card catalog reader.
//!
//! The catalog is an external, paginated, read-only list of prompt and answer
//! cards. Only active ids matter to the game; their catalog order is kept and
//! randomized later by the match seed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::state::CardId;
use crate::errors::domain::DomainError;

/// Items requested per page.
pub const PAGE_SIZE: u32 = 200;
/// Paging stops once more ids than this have been collected.
pub const MAX_IDS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Prompt,
    Answer,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Prompt => "prompt",
            CardKind::Answer => "answer",
        }
    }
}

/// One page as returned by the catalog. The vectors are index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPage {
    pub ids: Vec<CardId>,
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub image_refs: Vec<u32>,
    #[serde(default)]
    pub actives: Vec<bool>,
}

impl CardPage {
    /// Ids flagged active. Entries without a flag count as active since pages
    /// are always requested with `only_active`.
    pub fn active_ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.ids
            .iter()
            .enumerate()
            .filter(|(i, _)| self.actives.get(*i).copied().unwrap_or(true))
            .map(|(_, id)| *id)
    }
}

#[async_trait]
pub trait CardCatalog: Send + Sync {
    async fn count(&self, kind: CardKind) -> Result<u64, DomainError>;

    /// Up to `max_items` cards with ids from `start_id` (1-based) onwards.
    async fn page(
        &self,
        kind: CardKind,
        start_id: u64,
        max_items: u32,
        only_active: bool,
    ) -> Result<CardPage, DomainError>;
}

/// Every active id of `kind`, in catalog order, capped a little past [`MAX_IDS`].
///
/// Errors from the catalog propagate; an empty result is returned as-is and
/// left for the caller to refuse.
pub async fn load_active_ids(
    catalog: &dyn CardCatalog,
    kind: CardKind,
) -> Result<Vec<CardId>, DomainError> {
    let total = catalog.count(kind).await?;
    let mut ids = Vec::new();
    let mut start = 1u64;

    while start <= total {
        let page = catalog.page(kind, start, PAGE_SIZE, true).await?;
        ids.extend(page.active_ids());
        start += u64::from(PAGE_SIZE);
        if ids.len() > MAX_IDS {
            break;
        }
    }

    debug!(kind = kind.as_str(), total, active = ids.len(), "loaded card ids");
    Ok(ids)
}
