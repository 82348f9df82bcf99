//! Persisted match record and its building blocks.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

/// Prompt and answer card identifiers as issued by the card catalog.
pub type CardId = u64;

/// Canonical player identity: lowercase `0x` + 40 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Trim and lowercase `raw`, rejecting anything that is not a 20-byte hex address.
    ///
    /// # Examples
    ///
    /// ```
    /// use cah_backend::domain::state::PlayerId;
    ///
    /// let p = PlayerId::parse(" 0xAbCdEf0000000000000000000000000000000001 ").unwrap();
    /// assert_eq!(p.as_str(), "0xabcdef0000000000000000000000000000000001");
    /// assert!(PlayerId::parse("0x1234").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let lower = raw.trim().to_ascii_lowercase();
        if regex_is_match!(r"^0x[0-9a-f]{40}$", &lower) {
            Ok(Self(lower))
        } else {
            Err(DomainError::validation(
                ValidationKind::InvalidPlayer,
                format!("invalid player address: {raw:?}"),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlayerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

/// Round phase together with the one deadline that matters in it.
///
/// Serialized flattened into [`Match`], e.g. `{"phase":"submit","submitDeadline":…}`.
/// All instants are unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Phase {
    Prestart {
        #[serde(rename = "prestartUntil")]
        prestart_until: i64,
    },
    Submit {
        #[serde(rename = "submitDeadline")]
        submit_deadline: i64,
    },
    Judge {
        #[serde(rename = "judgeDeadline")]
        judge_deadline: i64,
    },
    Summary {
        #[serde(rename = "summaryUntil")]
        summary_until: i64,
    },
    Ended,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Prestart { .. } => "prestart",
            Phase::Submit { .. } => "submit",
            Phase::Judge { .. } => "judge",
            Phase::Summary { .. } => "summary",
            Phase::Ended => "ended",
        }
    }

    /// Instant at which the phase times out; `None` once ended.
    pub fn deadline(&self) -> Option<i64> {
        match *self {
            Phase::Prestart { prestart_until } => Some(prestart_until),
            Phase::Submit { submit_deadline } => Some(submit_deadline),
            Phase::Judge { judge_deadline } => Some(judge_deadline),
            Phase::Summary { summary_until } => Some(summary_until),
            Phase::Ended => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Phase::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of the most recently completed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRound {
    pub round: u32,
    pub winner: Option<PlayerId>,
    pub winning_answer_id: Option<CardId>,
    pub completed_at: i64,
}

/// The whole persisted state of one match. Always read and written as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub v: u32,
    pub seed: String,
    pub players: Vec<PlayerId>,
    pub round: u32,
    pub rounds_total: u32,
    pub judge: Option<PlayerId>,
    pub prompt_order: Vec<CardId>,
    pub prompt_id: Option<CardId>,
    #[serde(flatten)]
    pub phase: Phase,
    pub answers_deck: Vec<CardId>,
    pub draw_ptr: u64,
    pub hands: BTreeMap<PlayerId, Vec<CardId>>,
    pub seen_answers: BTreeMap<PlayerId, Vec<CardId>>,
    pub submissions: BTreeMap<PlayerId, CardId>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub last: Option<LastRound>,
    pub started_at: i64,
}

impl Match {
    /// A record created before the catalog was available has nothing to deal from.
    pub fn is_shell(&self) -> bool {
        self.answers_deck.is_empty() || self.prompt_order.is_empty()
    }

    pub fn is_judge(&self, player: &PlayerId) -> bool {
        self.judge.as_ref() == Some(player)
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.players.contains(player)
    }

    pub fn hand(&self, player: &PlayerId) -> &[CardId] {
        self.hands.get(player).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-judge players without a submission this round, in roster order.
    pub fn missing_submitters(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| !self.is_judge(p) && !self.submissions.contains_key(*p))
            .cloned()
            .collect()
    }
}
