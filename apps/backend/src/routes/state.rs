//! Match state HTTP routes: observe (`get`) and act (`put`).

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::round_machine::PlayerAction;
use crate::domain::state::{CardId, PlayerId};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::{GameId, ValidatedJson};
use crate::services::match_coordinator::MatchCoordinator;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct ObserveQuery {
    #[serde(default)]
    me: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutBody {
    game_id: GameId,
    from: String,
    action: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPayload {
    answer_id: CardId,
}

#[derive(Deserialize)]
struct JudgePickPayload {
    winner: String,
}

fn payload_field<T: serde::de::DeserializeOwned>(payload: Value, action: &str) -> Result<T, AppError> {
    serde_json::from_value(payload).map_err(|e| {
        AppError::bad_request(ErrorCode::BadPayload, format!("invalid {action} payload: {e}"))
    })
}

/// Turn the wire action name and payload into a machine action.
fn parse_action(action: &str, payload: Value) -> Result<PlayerAction, AppError> {
    match action {
        "submit" => {
            let SubmitPayload { answer_id } = payload_field(payload, action)?;
            Ok(PlayerAction::Submit { answer_id })
        }
        "judge_pick" => {
            let JudgePickPayload { winner } = payload_field(payload, action)?;
            Ok(PlayerAction::JudgePick {
                winner: PlayerId::parse(&winner)?,
            })
        }
        "nudge" => Ok(PlayerAction::Nudge),
        other => Err(AppError::bad_request(
            ErrorCode::InvalidAction,
            format!("unknown action: {other:?}"),
        )),
    }
}

/// GET /api/state/get?gameId=&me=
async fn observe(
    game_id: GameId,
    query: web::Query<ObserveQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let me = query
        .me
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(PlayerId::parse)
        .transpose()?;

    let coordinator = MatchCoordinator::from_state(&app_state)?;
    let response = coordinator
        .observe(game_id.get(), me.as_ref(), app_state.clock())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/state/put
///
/// Responds with the full stored record, the caller's own view included.
async fn act(
    body: ValidatedJson<PutBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let PutBody {
        game_id,
        from,
        action,
        payload,
    } = body.into_inner();
    let from = PlayerId::parse(&from)?;
    let action = parse_action(&action, payload)?;

    let coordinator = MatchCoordinator::from_state(&app_state)?;
    let response = coordinator
        .act(game_id.get(), &from, &action, app_state.clock())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/get").route(web::get().to(observe)));
    cfg.service(web::resource("/put").route(web::post().to(act)));
}
