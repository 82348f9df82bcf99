use std::fmt;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::errors::ErrorCode;

/// External game id: a positive integer.
///
/// Extracted from the `gameId` query parameter, or deserialized from a JSON
/// body where clients send it either as a number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGameId {
    Number(i64),
    Text(String),
}

impl GameId {
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let value = raw.trim().parse::<i64>().map_err(|_| {
            AppError::bad_request(ErrorCode::InvalidGameId, format!("Invalid game id: {raw}"))
        })?;
        Self::positive(value)
    }

    fn positive(value: i64) -> Result<Self, AppError> {
        if value <= 0 {
            return Err(AppError::bad_request(
                ErrorCode::InvalidGameId,
                format!("Game id must be positive, got: {value}"),
            ));
        }
        Ok(GameId(value as u64))
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawGameId::deserialize(deserializer)? {
            RawGameId::Number(n) => GameId::positive(n),
            RawGameId::Text(s) => GameId::parse(&s),
        };
        parsed.map_err(|e| D::Error::custom(e.detail()))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromRequest for GameId {
    type Error = AppError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        std::future::ready(game_id_from_query(req.query_string()))
    }
}

#[derive(Deserialize)]
struct GameIdQuery {
    #[serde(rename = "gameId")]
    game_id: Option<String>,
}

fn game_id_from_query(query: &str) -> Result<GameId, AppError> {
    let missing = || AppError::bad_request(ErrorCode::InvalidGameId, "Missing gameId");
    let parsed = web::Query::<GameIdQuery>::from_query(query).map_err(|_| missing())?;
    let raw = parsed
        .into_inner()
        .game_id
        .filter(|v| !v.is_empty())
        .ok_or_else(missing)?;
    GameId::parse(&raw)
}
