use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::services::finalize::{FinalizeInput, FinalizeOrchestrator};
use crate::state::app_state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// Shared-secret check. Hashing both sides keeps the comparison constant-time.
fn check_api_key(req: &HttpRequest, expected: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if blake3::hash(provided.as_bytes()) == blake3::hash(expected.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::unauthorized("missing or invalid API key"))
    }
}

/// POST /api/finalize
async fn finalize(
    req: HttpRequest,
    body: ValidatedJson<FinalizeInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    check_api_key(&req, app_state.settings().api_key.as_deref())?;

    let orchestrator = FinalizeOrchestrator::from_state(&app_state)?;
    let outcome = orchestrator
        .finalize(body.into_inner(), app_state.clock())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(finalize)));
}
